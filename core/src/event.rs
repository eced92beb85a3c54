//! Stage events recorded during a pipeline run.
//!
//! Variants are appended, never reordered: the runner serialises them
//! into its JSON summary.

use crate::types::RunId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    RunStarted {
        run_id: RunId,
        lower_bound: String,
    },
    SourceFetched {
        source: String,
        records: usize,
    },
    SourceDegraded {
        source: String,
        reason: String,
    },
    Reconciled {
        rows: usize,
        null_event_values: usize,
    },
    KpisComputed {
        active_users: u64,
    },
    ReportWritten {
        destination: String,
    },
}

impl PipelineEvent {
    /// Stable name for log lines.
    pub fn type_name(&self) -> &'static str {
        match self {
            PipelineEvent::RunStarted { .. }     => "run_started",
            PipelineEvent::SourceFetched { .. }  => "source_fetched",
            PipelineEvent::SourceDegraded { .. } => "source_degraded",
            PipelineEvent::Reconciled { .. }     => "reconciled",
            PipelineEvent::KpisComputed { .. }   => "kpis_computed",
            PipelineEvent::ReportWritten { .. }  => "report_written",
        }
    }
}
