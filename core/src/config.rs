use crate::types::DATE_FORMAT;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationalConfig {
    /// SQLite database file holding the transactions table.
    pub path: PathBuf,
    #[serde(default = "default_table")]
    pub table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// JSON-lines collection file, one event document per line.
    pub path: PathBuf,
    /// Extra filter clauses ANDed with the date bound.
    #[serde(default)]
    pub filter: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// `.xlsx` writes a workbook, `.csv` a flat file.
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_lower_bound")]
    pub date_lower_bound: NaiveDate,
    pub relational: RelationalConfig,
    pub document: DocumentConfig,
    pub report: ReportConfig,
}

impl PipelineConfig {
    /// Load from a JSON config file.
    /// In tests, use PipelineConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: PipelineConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config)
    }

    /// Config with the stock file names, relative to the working directory.
    pub fn default_test() -> Self {
        Self {
            date_lower_bound: default_lower_bound(),
            relational: RelationalConfig {
                path:  "digital_banking.db".into(),
                table: default_table(),
            },
            document: DocumentConfig {
                path:   "customer_logs.jsonl".into(),
                filter: None,
            },
            report: ReportConfig {
                path: "aggregated_kpis.xlsx".into(),
            },
        }
    }

    /// Parse a `YYYY-MM-DD` override for `date_lower_bound`.
    pub fn set_lower_bound(&mut self, date: &str) -> anyhow::Result<()> {
        self.date_lower_bound = NaiveDate::parse_from_str(date, DATE_FORMAT)
            .map_err(|e| anyhow::anyhow!("Invalid date '{date}': {e}"))?;
        Ok(())
    }
}

fn default_table() -> String {
    "Transactions".into()
}

fn default_lower_bound() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default()
}
