//! The KPI pipeline: fetch → reconcile → compute → write.
//!
//! STAGE ORDER (fixed):
//!   1. Relational fetch   (transactions)
//!   2. Document fetch     (events)
//!   3. Reconcile          (left join + missing-value policy)
//!   4. Compute KPIs
//!   5. Write report
//!
//! RULES:
//!   - Each stage fully materialises its output before the next begins.
//!   - Stages hand each other owned values; nothing is shared or mutated.
//!   - A source failure degrades that source to an empty dataset with an
//!     empty schema. A sink failure fails the run.

use crate::{
    config::PipelineConfig,
    document_source::DocumentSource,
    error::PipelineResult,
    event::PipelineEvent,
    kpi_engine,
    reconciler::{self, MissingValues},
    record::{Dataset, EventRecord, KpiRecord, Schema, TransactionRecord},
    relational_source::RelationalSource,
    report::{report_sink_for, ReportSink},
    source::SourceAdapter,
    types::{RunId, DATE_FORMAT},
};
use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

/// A source that was downgraded to an empty dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceIssue {
    pub source: String,
    pub reason: String,
}

/// Everything a run computed, before the report is written.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub kpis:                 KpiRecord,
    pub degraded:             Vec<SourceIssue>,
    pub transactions_fetched: usize,
    pub events_fetched:       usize,
    pub reconciled_rows:      usize,
    pub reconciled_schema:    Schema,
    pub missing:              MissingValues,
    pub events:               Vec<PipelineEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub run_id:      RunId,
    pub destination: String,
    #[serde(flatten)]
    pub evaluation:  Evaluation,
}

impl PipelineOutcome {
    pub fn kpis(&self) -> &KpiRecord {
        &self.evaluation.kpis
    }

    pub fn is_degraded(&self) -> bool {
        !self.evaluation.degraded.is_empty()
    }
}

pub struct KpiPipeline {
    pub run_id:  RunId,
    lower_bound: NaiveDate,
    relational:  Box<dyn SourceAdapter<Record = TransactionRecord>>,
    document:    Box<dyn SourceAdapter<Record = EventRecord>>,
    sink:        Box<dyn ReportSink>,
}

impl KpiPipeline {
    pub fn new(
        lower_bound: NaiveDate,
        relational: Box<dyn SourceAdapter<Record = TransactionRecord>>,
        document: Box<dyn SourceAdapter<Record = EventRecord>>,
        sink: Box<dyn ReportSink>,
    ) -> Self {
        Self {
            run_id: format!("kpi-{}", Uuid::new_v4()),
            lower_bound,
            relational,
            document,
            sink,
        }
    }

    /// Build a fully wired pipeline from configuration.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let mut document = DocumentSource::new(&config.document.path);
        if let Some(filter) = &config.document.filter {
            document = document.with_filter(filter.clone());
        }
        Self::new(
            config.date_lower_bound,
            Box::new(RelationalSource::new(
                &config.relational.path,
                config.relational.table.clone(),
            )),
            Box::new(document),
            report_sink_for(&config.report.path),
        )
    }

    pub fn with_run_id(mut self, run_id: impl Into<RunId>) -> Self {
        self.run_id = run_id.into();
        self
    }

    /// Stages 1-4. Never writes anything.
    pub fn evaluate(&self) -> PipelineResult<Evaluation> {
        let mut events = vec![PipelineEvent::RunStarted {
            run_id:      self.run_id.clone(),
            lower_bound: self.lower_bound.format(DATE_FORMAT).to_string(),
        }];
        let mut degraded = Vec::new();

        let transactions =
            fetch_or_degrade(&*self.relational, self.lower_bound, &mut events, &mut degraded)?;
        let event_rows =
            fetch_or_degrade(&*self.document, self.lower_bound, &mut events, &mut degraded)?;

        let reconciliation = reconciler::reconcile(&transactions, &event_rows);
        let reconciled_rows = reconciliation.rows().len();
        events.push(PipelineEvent::Reconciled {
            rows:              reconciled_rows,
            null_event_values: reconciliation.missing.total(),
        });

        let kpis = kpi_engine::compute(&reconciliation.dataset);
        events.push(PipelineEvent::KpisComputed {
            active_users: kpis.active_users,
        });

        Ok(Evaluation {
            kpis,
            degraded,
            transactions_fetched: transactions.len(),
            events_fetched:       event_rows.len(),
            reconciled_rows,
            reconciled_schema:    reconciliation.dataset.schema,
            missing:              reconciliation.missing,
            events,
        })
    }

    /// Run every stage, including the report write.
    pub fn run(&self) -> PipelineResult<PipelineOutcome> {
        log::info!("pipeline {}: starting, lower bound {}", self.run_id, self.lower_bound);
        let mut evaluation = self.evaluate()?;

        let destination = self.sink.destination().display().to_string();
        if let Err(e) = self.sink.write(&evaluation.kpis) {
            log::error!("pipeline {}: run failed, KPIs not persisted: {e}", self.run_id);
            return Err(e);
        }
        evaluation.events.push(PipelineEvent::ReportWritten {
            destination: destination.clone(),
        });

        for event in &evaluation.events {
            log::debug!("pipeline {}: {}", self.run_id, event.type_name());
        }
        if !evaluation.degraded.is_empty() {
            log::warn!(
                "pipeline {}: completed with degraded data from {} source(s)",
                self.run_id,
                evaluation.degraded.len()
            );
        }

        Ok(PipelineOutcome {
            run_id: self.run_id.clone(),
            destination,
            evaluation,
        })
    }
}

/// Recoverable source errors become an unavailable dataset plus a warning.
fn fetch_or_degrade<R>(
    source: &dyn SourceAdapter<Record = R>,
    lower_bound: NaiveDate,
    events: &mut Vec<PipelineEvent>,
    degraded: &mut Vec<SourceIssue>,
) -> PipelineResult<Dataset<R>> {
    match source.fetch(lower_bound) {
        Ok(dataset) => {
            events.push(PipelineEvent::SourceFetched {
                source:  source.name().to_string(),
                records: dataset.len(),
            });
            Ok(dataset)
        }
        Err(e) if e.is_recoverable() => {
            log::warn!(
                "pipeline: source '{}' degraded to empty dataset: {e}",
                source.name()
            );
            let issue = SourceIssue {
                source: source.name().to_string(),
                reason: e.to_string(),
            };
            events.push(PipelineEvent::SourceDegraded {
                source: issue.source.clone(),
                reason: issue.reason.clone(),
            });
            degraded.push(issue);
            Ok(Dataset::unavailable())
        }
        Err(e) => Err(e),
    }
}
