//! Transaction and behavioural-event reconciliation into business KPIs.
//!
//! Data flow:
//!   RelationalSource → transactions ┐
//!                                   ├→ reconcile → compute → ReportSink
//!   DocumentSource   → events ──────┘

pub mod config;
pub mod document_source;
pub mod error;
pub mod event;
pub mod kpi_engine;
pub mod pipeline;
pub mod query;
pub mod reconciler;
pub mod record;
pub mod relational_source;
pub mod report;
pub mod source;
pub mod types;
