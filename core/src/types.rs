//! Shared primitive types used across the pipeline.

/// Customer identity shared by both backing stores. This is the join key.
pub type CustomerId = i64;

/// The canonical pipeline run identifier.
pub type RunId = String;

/// Event type value counted as a conversion.
pub const LOGIN_EVENT: &str = "login";

/// Canonical date layout used by both stores and by query bounds.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
