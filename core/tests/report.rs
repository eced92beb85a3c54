//! Report shaping and the workbook / CSV sinks.

use banking_kpi_core::{
    error::PipelineError,
    record::KpiRecord,
    report::{
        report_sink_for, CsvReportSink, ReportCell, ReportSink, ReportTable, XlsxReportSink,
        NOT_CALCULATED, REPORT_COLUMNS, SHEET_NAME,
    },
};
use calamine::{open_workbook, Data, Reader, Xlsx};
use tempfile::TempDir;

fn sample_kpis() -> KpiRecord {
    KpiRecord {
        digital_adoption_pct: Some(200.0 / 3.0),
        active_users: 3,
        transaction_volume: 450.0,
        avg_session_duration_sec: None,
        conversion_rate_pct: Some(50.0),
    }
}

#[test]
fn table_has_fixed_column_order_and_markers() {
    let table = ReportTable::from_kpis(&sample_kpis());

    assert_eq!(
        table.header,
        [
            "digital_adoption_pct",
            "active_users",
            "transaction_volume",
            "avg_session_duration_sec",
            "conversion_rate_pct",
        ]
    );
    assert_eq!(table.row[1], ReportCell::Count(3));
    assert_eq!(table.row[3], ReportCell::NotCalculated);
    assert_eq!(
        table.rendered_row(),
        vec!["66.67", "3", "450.00", "Not calculated", "50.00"]
    );
}

#[test]
fn xlsx_sink_writes_header_and_single_row() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("aggregated_kpis.xlsx");

    XlsxReportSink::new(&path).write(&sample_kpis()).unwrap();

    let mut workbook: Xlsx<_> = open_workbook(&path).expect("open written workbook");
    let range = workbook.worksheet_range(SHEET_NAME).expect("KPIs sheet");

    assert_eq!(range.height(), 2, "header plus one data row");
    for (col, name) in REPORT_COLUMNS.iter().enumerate() {
        assert_eq!(range.get((0, col)), Some(&Data::String(name.to_string())));
    }

    match range.get((1, 0)) {
        Some(Data::Float(v)) => assert!((v - 66.6667).abs() < 1e-3),
        other => panic!("unexpected adoption cell {other:?}"),
    }
    match range.get((1, 1)) {
        Some(Data::Float(v)) => assert_eq!(*v, 3.0),
        Some(Data::Int(v)) => assert_eq!(*v, 3),
        other => panic!("unexpected active users cell {other:?}"),
    }
    assert_eq!(range.get((1, 3)), Some(&Data::String(NOT_CALCULATED.to_string())));
}

#[test]
fn csv_sink_renders_two_decimals() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kpis.csv");

    CsvReportSink::new(&path).write(&sample_kpis()).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[0],
        "digital_adoption_pct,active_users,transaction_volume,avg_session_duration_sec,conversion_rate_pct"
    );
    assert_eq!(lines[1], "66.67,3,450.00,Not calculated,50.00");
}

#[test]
fn sink_selected_by_extension() {
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("out.CSV");
    let xlsx_path = dir.path().join("out.xlsx");

    report_sink_for(&csv_path).write(&sample_kpis()).unwrap();
    report_sink_for(&xlsx_path).write(&sample_kpis()).unwrap();

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert!(csv.starts_with("digital_adoption_pct,"));
    let bytes = std::fs::read(&xlsx_path).unwrap();
    assert_eq!(&bytes[..2], b"PK", "xlsx is a zip container");
}

#[test]
fn unwritable_destination_is_sink_error() {
    let dir = TempDir::new().unwrap();
    let missing_dir = dir.path().join("no_such_dir");

    for sink in [
        report_sink_for(missing_dir.join("k.xlsx")),
        report_sink_for(missing_dir.join("k.csv")),
    ] {
        let err = sink.write(&sample_kpis()).unwrap_err();
        assert!(matches!(err, PipelineError::SinkWriteError { .. }), "got {err}");
        assert!(!err.is_recoverable());
    }
}
