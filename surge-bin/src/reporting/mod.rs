mod table;

use self::table::Table;
use anyhow::Error;
use slog::info;
use std::collections::{BTreeMap, BTreeSet};
use surge_engine::{Config, RunStats, TargetStats};

/// Print the run-parameters table and the per-target results table.
pub fn render(config: &Config, stats: &RunStats) {
    println!("{}", params_table(config));
    println!(" ################## TEST RESULTS ################## ");
    println!("{}", results_table(stats));
}

fn params_table(config: &Config) -> Table {
    let mut table = Table::new(vec!["Timeout", "Requests", "Concurrency", "Targets"]);
    table.add_row(vec![
        config.timeout.to_string(),
        config.requests.to_string(),
        config.concurrency.to_string(),
        config.targets.len().to_string(),
    ]);
    table
}

fn results_table(stats: &RunStats) -> Table {
    // Every status label observed across all targets becomes a column,
    // sorted so output is stable run to run.
    let labels: BTreeSet<&String> = stats
        .iter()
        .flat_map(|(_, t)| t.status.keys())
        .collect();
    let mut headers: Vec<String> = vec![
        "Test".into(),
        "Total".into(),
        "MinTime".into(),
        "MaxTime".into(),
        "AvgTime".into(),
    ];
    headers.extend(labels.iter().map(|l| l.to_string()));
    let mut table = Table::new(headers);
    for (name, t) in stats.iter() {
        let mut row = vec![
            name.clone(),
            t.total.to_string(),
            fmt_seconds(t.min_elapsed),
            fmt_seconds(t.max_elapsed),
            fmt_seconds(t.avg_elapsed()),
        ];
        for label in labels.iter() {
            let cell = t
                .status
                .get(*label)
                .map(|count| status_cell(*count, t.total))
                .unwrap_or_else(|| "0".to_string());
            row.push(cell);
        }
        table.add_row(row);
    }
    table
}

fn fmt_seconds(secs: f64) -> String {
    format!("{:.2} s", secs)
}

fn status_cell(count: u64, total: u64) -> String {
    let pct = (count as f64 / total as f64) * 100.0;
    format!("{} [%{:.2}]", count, pct)
}

/// Write the full per-target stats, captured responses included, as JSON.
pub fn persist(path: &str, stats: &RunStats) -> Result<(), Error> {
    let json = serde_json::to_string_pretty(stats)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// One structured line per target; visible at Info level and up.
pub fn log_summary(logger: &slog::Logger, stats: &RunStats) {
    for (name, t) in stats.iter() {
        info!(
            logger,
            "target finished";
            "target" => name.as_str(),
            "total" => t.total,
            "failures" => t.failures,
            "failure_pct" => format!("{:.2}", failure_pct(t)),
            "status" => format!("{:?}", t.status.iter().collect::<BTreeMap<_, _>>())
        );
    }
}

fn failure_pct(t: &TargetStats) -> f64 {
    if t.total == 0 {
        0.0
    } else {
        (t.failures as f64 / t.total as f64) * 100.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_cell_format() {
        assert_eq!(status_cell(3, 10), "3 [%30.00]");
        assert_eq!(status_cell(1, 3), "1 [%33.33]");
        assert_eq!(status_cell(10, 10), "10 [%100.00]");
    }

    #[test]
    fn seconds_format() {
        assert_eq!(fmt_seconds(0.25), "0.25 s");
        assert_eq!(fmt_seconds(1.0), "1.00 s");
    }

    #[test]
    fn params_table_counts_targets() {
        let config: Config = {
            let mut t = std::collections::BTreeMap::new();
            t.insert(
                "a".to_string(),
                surge_engine::TargetSpec {
                    url: "http://localhost/".into(),
                    method: "GET".into(),
                    payload: String::new(),
                    headers: std::collections::BTreeMap::new(),
                },
            );
            Config {
                timeout: 5,
                requests: 100,
                concurrency: 10,
                targets: t,
            }
        };
        let rendered = params_table(&config).to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines[0],
            "[Timeout]     [Requests]     [Concurrency]     [Targets]"
        );
        assert!(lines[1].starts_with("5"));
        assert!(lines[1].trim_end().ends_with("1"));
    }
}
