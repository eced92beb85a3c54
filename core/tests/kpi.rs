//! KPI formulas and the absent / empty / valued distinction.

use banking_kpi_core::{
    kpi_engine::{self, compute},
    reconciler::reconcile,
    record::{Dataset, EventRecord, Field, ReconciledRow, Schema, TransactionRecord},
};
use chrono::NaiveDate;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
}

fn txn(customer: i64, amount: f64, digital: bool) -> TransactionRecord {
    TransactionRecord::new(customer, d("2025-01-05"), amount, digital)
}

fn login(customer: i64, duration: f64) -> EventRecord {
    EventRecord {
        customer_id: customer,
        event_date: Some(d("2025-01-05")),
        event_type: Some("login".into()),
        session_duration: Some(duration),
    }
}

fn row(customer: i64, amount: f64, digital: bool, kind: Option<&str>, duration: f64) -> ReconciledRow {
    ReconciledRow {
        customer_id: customer,
        transaction_date: d("2025-01-05"),
        transaction_amount: amount,
        digital_channel: digital,
        event_date: None,
        event_type: kind.map(str::to_string),
        session_duration: duration,
    }
}

fn full_schema() -> Schema {
    Schema::full_transaction().union(&Schema::full_event())
}

#[test]
fn single_transaction_without_events() {
    let rec = reconcile(
        &Dataset::transactions(vec![txn(1, 100.0, true)]),
        &Dataset::events(vec![]),
    );
    assert_eq!(rec.rows().len(), 1);
    assert_eq!(rec.rows()[0].session_duration, 0.0);
    assert_eq!(rec.rows()[0].event_type, None);

    let kpis = compute(&rec.dataset);
    assert_eq!(kpis.active_users, 1);
    assert_eq!(kpis.transaction_volume, 100.0);
    assert_eq!(kpis.digital_adoption_pct, Some(100.0));
    assert_eq!(kpis.conversion_rate_pct, Some(0.0));
    assert_eq!(kpis.avg_session_duration_sec, Some(0.0));
}

#[test]
fn no_transactions_guards_empty_means() {
    let rec = reconcile(
        &Dataset::transactions(vec![]),
        &Dataset::events(vec![login(1, 300.0)]),
    );
    assert!(rec.rows().is_empty());

    let kpis = compute(&rec.dataset);
    assert_eq!(kpis.active_users, 0);
    assert_eq!(kpis.transaction_volume, 0.0);
    assert_eq!(kpis.digital_adoption_pct, None);
    assert_eq!(kpis.avg_session_duration_sec, None);
    assert_eq!(kpis.conversion_rate_pct, Some(0.0), "rate is guarded to zero, not NaN");
}

#[test]
fn mixed_channels_with_one_login() {
    let rec = reconcile(
        &Dataset::transactions(vec![txn(1, 100.0, true), txn(2, 200.0, false)]),
        &Dataset::events(vec![login(1, 300.0)]),
    );
    let rows = rec.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].event_type.as_deref(), Some("login"));
    assert_eq!(rows[0].session_duration, 300.0);
    assert_eq!(rows[1].event_type, None);
    assert_eq!(rows[1].session_duration, 0.0);

    let kpis = compute(&rec.dataset);
    assert_eq!(kpis.digital_adoption_pct, Some(50.0));
    assert_eq!(kpis.conversion_rate_pct, Some(50.0));
    assert_eq!(kpis.avg_session_duration_sec, Some(150.0));
    assert_eq!(kpis.active_users, 2);
    assert_eq!(kpis.transaction_volume, 300.0);
}

#[test]
fn absent_fields_are_not_calculated() {
    let schema = Schema::of(&[
        Field::CustomerId,
        Field::TransactionDate,
        Field::TransactionAmount,
        Field::DigitalChannel,
    ]);
    let rows = Dataset::new(schema, vec![row(1, 10.0, true, None, 0.0)]);

    let kpis = compute(&rows);
    assert_eq!(kpis.avg_session_duration_sec, None);
    assert_eq!(kpis.conversion_rate_pct, None);
    assert_eq!(kpis.digital_adoption_pct, Some(100.0));
}

#[test]
fn present_but_zero_is_distinct_from_absent() {
    let rows = Dataset::new(full_schema(), vec![row(1, 10.0, false, Some("logout"), 0.0)]);

    let kpis = compute(&rows);
    assert_eq!(kpis.avg_session_duration_sec, Some(0.0));
    assert_eq!(kpis.conversion_rate_pct, Some(0.0));
    assert_eq!(kpis.digital_adoption_pct, Some(0.0));
}

#[test]
fn row_multiplication_weights_every_kpi_but_active_users() {
    // Customer 1 joined three events: its transaction counts three times.
    let rows = Dataset::new(
        full_schema(),
        vec![
            row(1, 100.0, true, Some("login"), 300.0),
            row(1, 100.0, true, Some("logout"), 60.0),
            row(1, 100.0, true, Some("login"), 0.0),
            row(2, 40.0, false, None, 0.0),
        ],
    );

    assert_eq!(kpi_engine::active_users(&rows.rows), 2);
    assert_eq!(kpi_engine::transaction_volume(&rows.rows), 340.0);
    assert_eq!(kpi_engine::digital_adoption_pct(&rows), Some(75.0));
    assert_eq!(kpi_engine::conversion_rate_pct(&rows), Some(50.0));
    assert_eq!(kpi_engine::avg_session_duration_sec(&rows), Some(90.0));
}

#[test]
fn negative_amounts_are_summed_as_is() {
    let rows = Dataset::new(
        full_schema(),
        vec![row(1, 250.0, true, None, 0.0), row(2, -75.5, true, None, 0.0)],
    );
    assert_eq!(kpi_engine::transaction_volume(&rows.rows), 174.5);
}

#[test]
fn login_match_is_exact() {
    let rows = Dataset::new(
        full_schema(),
        vec![
            row(1, 1.0, true, Some("Login"), 0.0),
            row(2, 1.0, true, Some("login "), 0.0),
            row(3, 1.0, true, Some("login"), 0.0),
            row(4, 1.0, true, Some("logout"), 0.0),
        ],
    );
    assert_eq!(kpi_engine::conversion_rate_pct(&rows), Some(25.0));
}

#[test]
fn compute_is_idempotent() {
    let rows = Dataset::new(
        full_schema(),
        (0..50)
            .map(|i| row(i % 7, 0.1 * i as f64, i % 3 == 0, (i % 2 == 0).then_some("login"), 1.3 * i as f64))
            .collect(),
    );

    let a = compute(&rows);
    let b = compute(&rows);
    assert_eq!(a.transaction_volume.to_bits(), b.transaction_volume.to_bits());
    assert_eq!(
        a.avg_session_duration_sec.map(f64::to_bits),
        b.avg_session_duration_sec.map(f64::to_bits)
    );
    assert_eq!(a, b);
}

#[test]
fn active_users_bounded_by_transaction_customers() {
    let txns = Dataset::transactions(vec![txn(1, 1.0, true), txn(1, 2.0, true), txn(2, 3.0, false)]);
    let events = Dataset::events((1..=10).map(|c| login(c, 10.0)).collect());

    let kpis = compute(&reconcile(&txns, &events).dataset);
    assert!(kpis.active_users <= 2);
    assert_eq!(kpis.active_users, 2);
}
