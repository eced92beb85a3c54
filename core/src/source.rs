//! Source adapter contract.
//!
//! RULE: adapters only read. They never create tables, insert
//! documents or otherwise mutate the backing store.

use crate::{error::PipelineResult, record::Dataset};
use chrono::NaiveDate;

/// A backing store normalised into canonical records.
pub trait SourceAdapter {
    type Record;

    /// Stable name used in logs, errors and pipeline events.
    fn name(&self) -> &'static str;

    /// Fetch every record dated on or after `lower_bound`.
    ///
    /// Individual malformed records are dropped with a warning.
    /// Store-level failures surface as `SourceUnavailable` or
    /// `SourceQueryError`; the pipeline decides whether to degrade.
    fn fetch(&self, lower_bound: NaiveDate) -> PipelineResult<Dataset<Self::Record>>;
}
