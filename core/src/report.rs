//! ReportSink: shapes a `KpiRecord` into a one-row table and writes it.
//!
//! Column order is fixed. Real-valued KPIs render with two decimals,
//! counts as integers, and uncomputable KPIs as an explicit marker.
//! A failed write is fatal to the run.

use crate::{
    error::{PipelineError, PipelineResult},
    record::KpiRecord,
};
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};

pub const NOT_CALCULATED: &str = "Not calculated";
pub const SHEET_NAME: &str = "KPIs";

pub const REPORT_COLUMNS: [&str; 5] = [
    "digital_adoption_pct",
    "active_users",
    "transaction_volume",
    "avg_session_duration_sec",
    "conversion_rate_pct",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReportCell {
    Number(f64),
    Count(u64),
    NotCalculated,
}

impl ReportCell {
    fn from_optional(value: Option<f64>) -> Self {
        value.map_or(ReportCell::NotCalculated, ReportCell::Number)
    }

    pub fn render(&self) -> String {
        match self {
            ReportCell::Number(v)     => format!("{v:.2}"),
            ReportCell::Count(n)      => n.to_string(),
            ReportCell::NotCalculated => NOT_CALCULATED.to_string(),
        }
    }
}

/// Header plus exactly one data row.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub header: [&'static str; 5],
    pub row:    [ReportCell; 5],
}

impl ReportTable {
    pub fn from_kpis(kpis: &KpiRecord) -> Self {
        Self {
            header: REPORT_COLUMNS,
            row: [
                ReportCell::from_optional(kpis.digital_adoption_pct),
                ReportCell::Count(kpis.active_users),
                ReportCell::Number(kpis.transaction_volume),
                ReportCell::from_optional(kpis.avg_session_duration_sec),
                ReportCell::from_optional(kpis.conversion_rate_pct),
            ],
        }
    }

    pub fn rendered_row(&self) -> Vec<String> {
        self.row.iter().map(ReportCell::render).collect()
    }
}

pub trait ReportSink {
    fn destination(&self) -> &Path;

    fn write(&self, kpis: &KpiRecord) -> PipelineResult<()>;
}

/// Choose a sink by file extension. Anything other than `.csv` is a workbook.
pub fn report_sink_for(path: impl Into<PathBuf>) -> Box<dyn ReportSink> {
    let path = path.into();
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        Box::new(CsvReportSink::new(path))
    } else {
        Box::new(XlsxReportSink::new(path))
    }
}

// ── Excel ──────────────────────────────────────────────────────────

pub struct XlsxReportSink {
    path: PathBuf,
}

impl XlsxReportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn sink_error(&self, e: impl ToString) -> PipelineError {
        PipelineError::sink(&self.path.display().to_string(), e)
    }
}

impl ReportSink for XlsxReportSink {
    fn destination(&self) -> &Path {
        &self.path
    }

    fn write(&self, kpis: &KpiRecord) -> PipelineResult<()> {
        let table = ReportTable::from_kpis(kpis);
        let header_format = Format::new().set_bold();
        let decimal_format = Format::new().set_num_format("0.00");

        let mut workbook = Workbook::new();
        let worksheet = workbook
            .add_worksheet()
            .set_name(SHEET_NAME)
            .map_err(|e| self.sink_error(e))?;

        for (col, name) in table.header.iter().enumerate() {
            let col = col as u16;
            worksheet
                .write_string_with_format(0, col, *name, &header_format)
                .map_err(|e| self.sink_error(e))?;
            worksheet
                .set_column_width(col, name.len() as f64 + 2.0)
                .map_err(|e| self.sink_error(e))?;
        }

        for (col, cell) in table.row.iter().enumerate() {
            let col = col as u16;
            let written = match cell {
                ReportCell::Number(v) => worksheet
                    .write_number_with_format(1, col, *v, &decimal_format)
                    .map(|_| ()),
                ReportCell::Count(n) => worksheet.write_number(1, col, *n as f64).map(|_| ()),
                ReportCell::NotCalculated => {
                    worksheet.write_string(1, col, NOT_CALCULATED).map(|_| ())
                }
            };
            written.map_err(|e| self.sink_error(e))?;
        }

        workbook.save(&self.path).map_err(|e| self.sink_error(e))?;
        log::info!("report: KPIs written to {}", self.path.display());
        Ok(())
    }
}

// ── CSV ────────────────────────────────────────────────────────────

pub struct CsvReportSink {
    path: PathBuf,
}

impl CsvReportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn sink_error(&self, e: impl ToString) -> PipelineError {
        PipelineError::sink(&self.path.display().to_string(), e)
    }
}

impl ReportSink for CsvReportSink {
    fn destination(&self) -> &Path {
        &self.path
    }

    fn write(&self, kpis: &KpiRecord) -> PipelineResult<()> {
        let table = ReportTable::from_kpis(kpis);
        let mut writer = csv::Writer::from_path(&self.path).map_err(|e| self.sink_error(e))?;
        writer
            .write_record(table.header)
            .map_err(|e| self.sink_error(e))?;
        writer
            .write_record(table.rendered_row())
            .map_err(|e| self.sink_error(e))?;
        writer.flush().map_err(|e| self.sink_error(e))?;
        log::info!("report: KPIs written to {}", self.path.display());
        Ok(())
    }
}
