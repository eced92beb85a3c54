//! Record shapes flowing between pipeline stages, and the schema
//! capability set that travels alongside them.
//!
//! RULE: field presence is a property of the dataset, never of a row.
//! A KPI that needs a field checks `Schema::has`, not `Option::is_some`.

use crate::types::CustomerId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ── Fields and schema ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    CustomerId,
    TransactionDate,
    TransactionAmount,
    DigitalChannel,
    EventDate,
    EventType,
    SessionDuration,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::CustomerId        => "customer_id",
            Field::TransactionDate   => "transaction_date",
            Field::TransactionAmount => "transaction_amount",
            Field::DigitalChannel    => "digital_channel",
            Field::EventDate         => "event_date",
            Field::EventType         => "event_type",
            Field::SessionDuration   => "session_duration",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The set of fields a dataset structurally carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    fields: BTreeSet<Field>,
}

impl Schema {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn of(fields: &[Field]) -> Self {
        Self { fields: fields.iter().copied().collect() }
    }

    pub fn full_transaction() -> Self {
        Self::of(&TransactionRecord::FIELDS)
    }

    pub fn full_event() -> Self {
        Self::of(&EventRecord::FIELDS)
    }

    pub fn has(&self, field: Field) -> bool {
        self.fields.contains(&field)
    }

    pub fn remove(&mut self, field: Field) {
        self.fields.remove(&field);
    }

    pub fn union(&self, other: &Schema) -> Schema {
        Schema { fields: self.fields.union(&other.fields).copied().collect() }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Rows plus the schema they were produced under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset<R> {
    pub schema: Schema,
    pub rows: Vec<R>,
}

impl<R> Dataset<R> {
    pub fn new(schema: Schema, rows: Vec<R>) -> Self {
        Self { schema, rows }
    }

    /// A source that could not be read: no rows and no evidence of any field.
    pub fn unavailable() -> Self {
        Self { schema: Schema::empty(), rows: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Dataset<TransactionRecord> {
    pub fn transactions(rows: Vec<TransactionRecord>) -> Self {
        Self::new(Schema::full_transaction(), rows)
    }
}

impl Dataset<EventRecord> {
    pub fn events(rows: Vec<EventRecord>) -> Self {
        Self::new(Schema::full_event(), rows)
    }
}

// ── Records ────────────────────────────────────────────────────────

/// One financial transaction, as normalised by the relational source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub customer_id:        CustomerId,
    pub transaction_date:   NaiveDate,
    pub transaction_amount: f64,
    pub digital_channel:    bool,
}

impl TransactionRecord {
    pub const FIELDS: [Field; 4] = [
        Field::CustomerId,
        Field::TransactionDate,
        Field::TransactionAmount,
        Field::DigitalChannel,
    ];

    pub fn new(customer_id: CustomerId, date: NaiveDate, amount: f64, digital: bool) -> Self {
        Self {
            customer_id,
            transaction_date: date,
            transaction_amount: amount,
            digital_channel: digital,
        }
    }
}

/// One behavioural event, as normalised by the document source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub customer_id:      CustomerId,
    pub event_date:       Option<NaiveDate>,
    pub event_type:       Option<String>,
    pub session_duration: Option<f64>,
}

impl EventRecord {
    pub const FIELDS: [Field; 4] = [
        Field::CustomerId,
        Field::EventDate,
        Field::EventType,
        Field::SessionDuration,
    ];
}

/// A transaction joined with at most one matching event.
///
/// `session_duration` is never null: the missing-value policy fills it
/// with zero when no event (or no duration) was present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledRow {
    pub customer_id:        CustomerId,
    pub transaction_date:   NaiveDate,
    pub transaction_amount: f64,
    pub digital_channel:    bool,
    pub event_date:         Option<NaiveDate>,
    pub event_type:         Option<String>,
    pub session_duration:   f64,
}

/// The aggregate snapshot produced once per run.
/// `None` means "not calculated", distinct from a computed zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiRecord {
    pub digital_adoption_pct:     Option<f64>,
    pub active_users:             u64,
    pub transaction_volume:       f64,
    pub avg_session_duration_sec: Option<f64>,
    pub conversion_rate_pct:      Option<f64>,
}
