//! Demo store seeding for `--bootstrap`.
//!
//! Seeding only happens when the target store is empty, so running the
//! bootstrap twice never duplicates rows.

use anyhow::Result;
use rusqlite::{params, Connection};
use serde_json::json;
use std::io::{ErrorKind, Write};
use std::path::Path;

const SAMPLE_TRANSACTIONS: [(i64, &str, f64, i64); 3] = [
    (1, "2025-01-05", 100.0, 1),
    (2, "2025-01-06", 200.0, 0),
    (3, "2025-01-07", 150.0, 1),
];

/// Create the transactions table if needed and seed it when empty.
/// Returns the number of rows inserted.
pub fn seed_transactions(path: &Path, table: &str) -> Result<usize> {
    if !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        anyhow::bail!("invalid table name '{table}'");
    }
    let conn = Connection::open(path)?;
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            TransactionID INTEGER PRIMARY KEY,
            CustomerID INTEGER,
            TransactionDate TEXT,
            TransactionAmount REAL,
            DigitalChannel INTEGER
        );"
    ))?;

    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
    if count > 0 {
        log::info!("bootstrap: {table} already holds {count} rows, skipping");
        return Ok(0);
    }

    let insert = format!(
        "INSERT INTO {table} (CustomerID, TransactionDate, TransactionAmount, DigitalChannel)
         VALUES (?1, ?2, ?3, ?4)"
    );
    for (customer, date, amount, digital) in SAMPLE_TRANSACTIONS {
        conn.execute(&insert, params![customer, date, amount, digital])?;
    }
    log::info!("bootstrap: seeded {} transactions into {table}", SAMPLE_TRANSACTIONS.len());
    Ok(SAMPLE_TRANSACTIONS.len())
}

/// Seed the events collection when the file is missing or holds no documents.
pub fn seed_events(path: &Path) -> Result<usize> {
    let existing = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e.into()),
    };
    if existing.split(|b| *b == b'\n').any(|l| !l.trim_ascii().is_empty()) {
        log::info!("bootstrap: {} already holds events, skipping", path.display());
        return Ok(0);
    }

    let docs = [
        json!({"customer_id": 1, "event_date": "2025-01-05", "event_type": "login",  "session_duration": 300}),
        json!({"customer_id": 2, "event_date": "2025-01-06", "event_type": "login",  "session_duration": 250}),
        json!({"customer_id": 3, "event_date": "2025-01-07", "event_type": "logout", "session_duration": 200}),
    ];
    let mut file = std::fs::File::create(path)?;
    for doc in &docs {
        writeln!(file, "{doc}")?;
    }
    log::info!("bootstrap: seeded {} events into {}", docs.len(), path.display());
    Ok(docs.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn existing_events_are_never_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.jsonl");
        let original = b"{\"customer_id\": 9, \"event_type\": \"caf\xe9\"}\n".to_vec();
        std::fs::write(&path, &original).unwrap();

        assert_eq!(seed_events(&path).unwrap(), 0);
        assert_eq!(std::fs::read(&path).unwrap(), original);
    }

    #[test]
    fn missing_or_blank_events_file_is_seeded() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("new.jsonl");
        assert_eq!(seed_events(&missing).unwrap(), 3);
        assert_eq!(seed_events(&missing).unwrap(), 0, "second run skips");

        let blank = dir.path().join("blank.jsonl");
        std::fs::write(&blank, "\n  \n").unwrap();
        assert_eq!(seed_events(&blank).unwrap(), 3);
    }

    #[test]
    fn unreadable_events_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be read as a file.
        assert!(seed_events(dir.path()).is_err());
    }
}
