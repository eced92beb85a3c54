//! kpi-runner: headless KPI pipeline runner.
//!
//! Usage:
//!   kpi-runner --config pipeline.json
//!   kpi-runner --db digital_banking.db --events customer_logs.jsonl --out aggregated_kpis.xlsx
//!   kpi-runner --bootstrap --since 2025-01-01 --json

mod bootstrap;

use anyhow::Result;
use banking_kpi_core::{
    config::PipelineConfig,
    pipeline::{KpiPipeline, PipelineOutcome},
    record::KpiRecord,
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut config = match string_arg(&args, "--config") {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default_test(),
    };
    if let Some(since) = string_arg(&args, "--since") {
        config.set_lower_bound(since)?;
    }
    if let Some(db) = string_arg(&args, "--db") {
        config.relational.path = db.into();
    }
    if let Some(events) = string_arg(&args, "--events") {
        config.document.path = events.into();
    }
    if let Some(out) = string_arg(&args, "--out") {
        config.report.path = out.into();
    }
    let json_mode = args.iter().any(|a| a == "--json");

    if args.iter().any(|a| a == "--bootstrap") {
        bootstrap::seed_transactions(&config.relational.path, &config.relational.table)?;
        bootstrap::seed_events(&config.document.path)?;
    }

    if !json_mode {
        println!("Digital banking KPIs - kpi-runner");
        println!("  since:   {}", config.date_lower_bound);
        println!("  db:      {}", config.relational.path.display());
        println!("  events:  {}", config.document.path.display());
        println!("  report:  {}", config.report.path.display());
        println!();
    }

    let pipeline = KpiPipeline::from_config(&config);
    let outcome = pipeline.run()?;

    if json_mode {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_summary(&outcome);
    }
    Ok(())
}

fn print_summary(outcome: &PipelineOutcome) {
    let eval = &outcome.evaluation;

    println!("=== RUN SUMMARY ===");
    println!("  run_id:        {}", outcome.run_id);
    println!("  transactions:  {}", eval.transactions_fetched);
    println!("  events:        {}", eval.events_fetched);
    println!("  merged rows:   {}", eval.reconciled_rows);
    for issue in &eval.degraded {
        println!("  DEGRADED:      {} ({})", issue.source, issue.reason);
    }

    println!();
    println!("=== MISSING VALUES (before fill) ===");
    if eval.missing.total() == 0 {
        println!("  (none)");
    } else {
        for (field, count) in eval.missing.iter() {
            println!("  {:<18} {count}", field.name());
        }
    }

    println!();
    println!("=== CALCULATED KPIs ===");
    for line in kpi_lines(outcome.kpis()) {
        println!("  {line}");
    }
    println!();
    println!("KPIs exported to '{}'.", outcome.destination);
}

fn kpi_lines(kpis: &KpiRecord) -> Vec<String> {
    vec![
        match kpis.digital_adoption_pct {
            Some(v) => format!("Digital Adoption: {v:.2}%"),
            None => "Digital Adoption: Not calculated".to_string(),
        },
        format!("Active Users: {}", kpis.active_users),
        format!("Transaction Volume: ${:.2}", kpis.transaction_volume),
        match kpis.avg_session_duration_sec {
            Some(v) => format!("Average Session Duration: {v:.2} seconds"),
            None => "Average Session Duration: Not calculated".to_string(),
        },
        match kpis.conversion_rate_pct {
            Some(v) => format!("Conversion Rate: {v:.2}%"),
            None => "Conversion Rate: Not calculated (no event_type data available)".to_string(),
        },
    ]
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lines_render_values() {
        let kpis = KpiRecord {
            digital_adoption_pct: Some(200.0 / 3.0),
            active_users: 3,
            transaction_volume: 450.0,
            avg_session_duration_sec: Some(250.0),
            conversion_rate_pct: Some(50.0),
        };
        assert_eq!(
            kpi_lines(&kpis),
            vec![
                "Digital Adoption: 66.67%",
                "Active Users: 3",
                "Transaction Volume: $450.00",
                "Average Session Duration: 250.00 seconds",
                "Conversion Rate: 50.00%",
            ]
        );
    }

    #[test]
    fn summary_lines_mark_uncomputed_kpis() {
        let kpis = KpiRecord {
            digital_adoption_pct: None,
            active_users: 0,
            transaction_volume: 0.0,
            avg_session_duration_sec: None,
            conversion_rate_pct: None,
        };
        let lines = kpi_lines(&kpis);
        assert_eq!(lines[0], "Digital Adoption: Not calculated");
        assert_eq!(lines[2], "Transaction Volume: $0.00");
        assert_eq!(lines[3], "Average Session Duration: Not calculated");
        assert_eq!(lines[4], "Conversion Rate: Not calculated (no event_type data available)");
    }
}
