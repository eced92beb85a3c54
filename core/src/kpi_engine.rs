//! KpiEngine: the five KPIs over a reconciled dataset.
//!
//! Each KPI is guarded independently. Three outcomes are kept apart:
//!   - field absent from the schema   → `None` ("Not calculated")
//!   - field present, nothing to mean → `None` for means, `0` for sums/rates
//!   - field present with rows        → the computed value
//!
//! Pure: the same rows always give bit-identical results.

use crate::{
    record::{Dataset, Field, KpiRecord, ReconciledRow},
    types::LOGIN_EVENT,
};
use std::collections::HashSet;

pub fn compute(rows: &Dataset<ReconciledRow>) -> KpiRecord {
    let kpis = KpiRecord {
        digital_adoption_pct:     digital_adoption_pct(rows),
        active_users:             active_users(&rows.rows),
        transaction_volume:       transaction_volume(&rows.rows),
        avg_session_duration_sec: avg_session_duration_sec(rows),
        conversion_rate_pct:      conversion_rate_pct(rows),
    };
    log::info!(
        "kpi_engine: {} rows -> {} active users, volume {:.2}",
        rows.len(),
        kpis.active_users,
        kpis.transaction_volume
    );
    kpis
}

/// Share of rows performed through a digital channel, in percent.
pub fn digital_adoption_pct(rows: &Dataset<ReconciledRow>) -> Option<f64> {
    if !rows.schema.has(Field::DigitalChannel) {
        return None;
    }
    mean(rows.rows.iter().map(|r| if r.digital_channel { 1.0 } else { 0.0 }))
        .map(|m| m * 100.0)
}

pub fn active_users(rows: &[ReconciledRow]) -> u64 {
    rows.iter()
        .map(|r| r.customer_id)
        .collect::<HashSet<_>>()
        .len() as u64
}

/// Folded from +0.0 so an empty set reports `0.00`, never `-0.00`.
pub fn transaction_volume(rows: &[ReconciledRow]) -> f64 {
    rows.iter().fold(0.0, |acc, r| acc + r.transaction_amount)
}

pub fn avg_session_duration_sec(rows: &Dataset<ReconciledRow>) -> Option<f64> {
    if !rows.schema.has(Field::SessionDuration) {
        return None;
    }
    mean(rows.rows.iter().map(|r| r.session_duration))
}

/// Login rows over all rows, in percent. Zero when there are no rows.
pub fn conversion_rate_pct(rows: &Dataset<ReconciledRow>) -> Option<f64> {
    if !rows.schema.has(Field::EventType) {
        return None;
    }
    let total = rows.rows.len();
    if total == 0 {
        return Some(0.0);
    }
    let logins = rows
        .rows
        .iter()
        .filter(|r| r.event_type.as_deref() == Some(LOGIN_EVENT))
        .count();
    Some(logins as f64 / total as f64 * 100.0)
}

/// Mean over a non-empty sequence; `None` instead of NaN when empty.
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
