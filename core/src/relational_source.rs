//! Relational source: transactions from a SQLite table.
//!
//! Source columns use PascalCase (`CustomerID`, `TransactionDate`, ...).
//! Renaming them to canonical snake_case fields and coercing the
//! `DigitalChannel` integer flag to a boolean is this adapter's only job.

use crate::{
    error::{PipelineError, PipelineResult},
    record::{Dataset, TransactionRecord},
    source::SourceAdapter,
    types::DATE_FORMAT,
};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, types::Value, Connection, OpenFlags};
use std::path::{Path, PathBuf};

pub const RELATIONAL_SOURCE: &str = "relational";

pub struct RelationalSource {
    path:  PathBuf,
    table: String,
}

impl RelationalSource {
    pub fn new(path: impl Into<PathBuf>, table: impl Into<String>) -> Self {
        Self {
            path:  path.into(),
            table: table.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> PipelineResult<Connection> {
        // Read-only and no CREATE flag: a missing file is unavailable, not empty.
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI,
        )
        .map_err(|e| {
            PipelineError::unavailable(
                RELATIONAL_SOURCE,
                format!("cannot open {}: {e}", self.path.display()),
            )
        })
    }

    fn select_sql(&self) -> PipelineResult<String> {
        if self.table.is_empty()
            || !self.table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(PipelineError::query(
                RELATIONAL_SOURCE,
                format!("invalid table name '{}'", self.table),
            ));
        }
        Ok(format!(
            "SELECT CustomerID, TransactionDate, TransactionAmount, DigitalChannel
             FROM {} WHERE TransactionDate >= ?1",
            self.table
        ))
    }
}

impl SourceAdapter for RelationalSource {
    type Record = TransactionRecord;

    fn name(&self) -> &'static str {
        RELATIONAL_SOURCE
    }

    fn fetch(&self, lower_bound: NaiveDate) -> PipelineResult<Dataset<TransactionRecord>> {
        let conn = self.connect()?;
        let sql = self.select_sql()?;
        let bound = lower_bound.format(DATE_FORMAT).to_string();

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| PipelineError::query(RELATIONAL_SOURCE, e))?;
        let raw = stmt
            .query_map(params![bound], |row| {
                Ok([row.get::<_, Value>(0)?, row.get(1)?, row.get(2)?, row.get(3)?])
            })
            .map_err(|e| PipelineError::query(RELATIONAL_SOURCE, e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PipelineError::query(RELATIONAL_SOURCE, e))?;

        let mut rows = Vec::with_capacity(raw.len());
        for (idx, columns) in raw.into_iter().enumerate() {
            match normalize_row(columns) {
                Ok(record) => rows.push(record),
                Err(e) => log::warn!("{RELATIONAL_SOURCE}: dropping row {idx}: {e}"),
            }
        }

        log::info!(
            "{RELATIONAL_SOURCE}: fetched {} transactions on or after {bound}",
            rows.len()
        );
        Ok(Dataset::transactions(rows))
    }
}

/// Map one raw `[CustomerID, TransactionDate, TransactionAmount, DigitalChannel]` row.
fn normalize_row([id, date, amount, digital]: [Value; 4]) -> PipelineResult<TransactionRecord> {
    let customer_id = match id {
        Value::Integer(i) => i,
        Value::Real(r) if r.fract() == 0.0 => r as i64,
        other => return Err(malformed(format!("CustomerID is not an integer: {other:?}"))),
    };

    let transaction_date = match date {
        Value::Text(s) => parse_date(&s)
            .ok_or_else(|| malformed(format!("TransactionDate '{s}' is not a calendar date")))?,
        other => return Err(malformed(format!("TransactionDate is not text: {other:?}"))),
    };

    let transaction_amount = match amount {
        Value::Real(r) => r,
        Value::Integer(i) => i as f64,
        Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| malformed(format!("TransactionAmount '{s}' is not numeric")))?,
        other => return Err(malformed(format!("TransactionAmount is not numeric: {other:?}"))),
    };
    if !transaction_amount.is_finite() {
        return Err(malformed("TransactionAmount is not finite"));
    }

    let digital_channel = match digital {
        Value::Integer(i) => i != 0,
        Value::Real(r) => r != 0.0,
        other => return Err(malformed(format!("DigitalChannel is not a flag: {other:?}"))),
    };

    Ok(TransactionRecord {
        customer_id,
        transaction_date,
        transaction_amount,
        digital_channel,
    })
}

/// Accepts `YYYY-MM-DD` and `YYYY-MM-DD HH:MM:SS`; the time part is discarded.
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
                .ok()
                .map(|dt| dt.date())
        })
}

fn malformed(reason: impl ToString) -> PipelineError {
    PipelineError::malformed(RELATIONAL_SOURCE, reason)
}
