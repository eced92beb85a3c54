//! Reconciler: left join of transactions with events on `customer_id`.
//!
//! Join semantics:
//!   - Driven by the transaction side. No transactions, no rows.
//!   - A transaction matching N events yields N rows (events are not
//!     deduplicated); matching none yields one row with null event fields.
//!   - Output order follows transaction order, then event order.
//!
//! Missing-value policy, applied after the join:
//!   - `session_duration` null → 0.0 (no logged session = zero duration).
//!   - `event_type` and `event_date` stay null.

use crate::{
    record::{Dataset, EventRecord, Field, ReconciledRow, Schema, TransactionRecord},
    types::CustomerId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Null counts per event field, taken before the missing-value policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingValues {
    counts: BTreeMap<Field, usize>,
}

impl MissingValues {
    pub fn get(&self, field: Field) -> usize {
        self.counts.get(&field).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, usize)> + '_ {
        self.counts.iter().map(|(f, n)| (*f, *n))
    }

    fn bump(&mut self, field: Field) {
        *self.counts.entry(field).or_insert(0) += 1;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub dataset: Dataset<ReconciledRow>,
    pub missing: MissingValues,
}

impl Reconciliation {
    pub fn rows(&self) -> &[ReconciledRow] {
        &self.dataset.rows
    }

    pub fn schema(&self) -> &Schema {
        &self.dataset.schema
    }
}

pub fn reconcile(
    transactions: &Dataset<TransactionRecord>,
    events: &Dataset<EventRecord>,
) -> Reconciliation {
    let mut by_customer: HashMap<CustomerId, Vec<&EventRecord>> = HashMap::new();
    for event in &events.rows {
        by_customer.entry(event.customer_id).or_default().push(event);
    }

    let mut missing = MissingValues::default();
    let mut rows = Vec::with_capacity(transactions.rows.len());

    for txn in &transactions.rows {
        match by_customer.get(&txn.customer_id) {
            Some(matched) => {
                for event in matched {
                    rows.push(join_row(txn, Some(event), &mut missing));
                }
            }
            None => rows.push(join_row(txn, None, &mut missing)),
        }
    }

    let schema = transactions.schema.union(&events.schema);

    log::info!(
        "reconciler: {} transactions x {} events -> {} rows ({} null event values before fill)",
        transactions.len(),
        events.len(),
        rows.len(),
        missing.total()
    );
    for (field, count) in missing.iter() {
        log::debug!("reconciler: {field} null in {count} rows before fill");
    }

    Reconciliation {
        dataset: Dataset::new(schema, rows),
        missing,
    }
}

fn join_row(
    txn: &TransactionRecord,
    event: Option<&EventRecord>,
    missing: &mut MissingValues,
) -> ReconciledRow {
    let event_date = event.and_then(|e| e.event_date);
    let event_type = event.and_then(|e| e.event_type.clone());
    let session_duration = event.and_then(|e| e.session_duration);

    if event_date.is_none() {
        missing.bump(Field::EventDate);
    }
    if event_type.is_none() {
        missing.bump(Field::EventType);
    }
    if session_duration.is_none() {
        missing.bump(Field::SessionDuration);
    }

    ReconciledRow {
        customer_id:        txn.customer_id,
        transaction_date:   txn.transaction_date,
        transaction_amount: txn.transaction_amount,
        digital_channel:    txn.digital_channel,
        event_date,
        event_type,
        session_duration:   session_duration.unwrap_or(0.0),
    }
}
