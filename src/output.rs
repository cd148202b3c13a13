//! Terminal rendering of the dashboard and report download.
//!
//! Supports a text dashboard, JSON output and writing the report file.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::aggregate::summarize;
use crate::analyzers::classify::Emphasis;
use crate::assemble::{AssembleWarning, ComparisonEntry, DashboardView, RegionResolution};
use crate::reading::{Field, Reading};
use crate::report::Report;
use crate::session::ViewState;

const BAR_WIDTH: usize = 30;

fn marker(emphasis: Emphasis) -> &'static str {
    match emphasis {
        Emphasis::Success => "[ok]",
        Emphasis::Warning => "[!]",
        Emphasis::Danger => "[!!]",
        Emphasis::Neutral => "[?]",
    }
}

fn render_indicators(out: &mut String, view: &DashboardView) {
    let band = view.classification;
    let current = view.current();

    let _ = writeln!(
        out,
        "Pollution level: {} {} ({})",
        marker(band.emphasis()),
        band.label(),
        band.description()
    );
    for field in Field::ALL {
        let _ = writeln!(
            out,
            "  {:<12} {}",
            field.label(),
            current
                .get(field)
                .display_with_unit(field.precision(), field.unit())
        );
    }
    if let Some(ts) = current.timestamp {
        let _ = writeln!(out, "  {:<12} {}", "Observed", ts.format("%Y-%m-%d %H:%M UTC"));
    }
}

fn render_series(out: &mut String, series: &[Reading], hours: u32) {
    let _ = writeln!(out, "Last {hours} hours");
    if series.is_empty() {
        let _ = writeln!(out, "  no readings");
        return;
    }

    let _ = writeln!(out, "  {:<6} {:>8} {:>8}", "time", "PM2.5", "temp");
    for reading in series {
        let time = reading
            .timestamp
            .map(|ts| ts.format("%H:00").to_string())
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "  {:<6} {:>8} {:>8}",
            time,
            reading.pm25.display(1),
            reading.temperature.display(1)
        );
    }

    for field in [Field::Pm25, Field::Temperature] {
        if let Some(s) = summarize(series, field) {
            let _ = writeln!(
                out,
                "  {}: mean {:.1}, min {:.1}, max {:.1}, stddev {:.1} ({} readings)",
                field.label(),
                s.mean,
                s.min,
                s.max,
                s.stddev,
                s.count
            );
        }
    }
}

fn render_comparison(out: &mut String, entries: &[ComparisonEntry]) {
    let _ = writeln!(out, "City comparison (PM2.5, µg/m³)");
    let max = entries
        .iter()
        .filter_map(|e| e.latest_pm25.value())
        .fold(0.0_f64, f64::max);

    for entry in entries {
        let bar = match entry.latest_pm25.value() {
            Some(v) if max > 0.0 => "#".repeat(((v / max) * BAR_WIDTH as f64).round() as usize),
            _ => String::new(),
        };
        let _ = writeln!(
            out,
            "{} {:<16} {:>6} {}",
            if entry.selected { "*" } else { " " },
            entry.city,
            entry.latest_pm25.display(1),
            bar
        );
    }
}

/// Renders the whole dashboard for one city.
pub fn render_dashboard(view: &DashboardView) -> String {
    let mut out = String::new();
    let band = view.classification;

    let _ = writeln!(out, "== {} ==", view.city());
    match &view.region {
        RegionResolution::FromHistory(r) => {
            let _ = writeln!(out, "Region: {r}");
        }
        RegionResolution::FromFallback(r) => {
            let _ = writeln!(out, "Region: {r} (default)");
        }
        RegionResolution::Unresolved => {}
    }

    if band.shows_alert() {
        let _ = writeln!(out, "\n{} {}", marker(band.emphasis()), band.advisory_title());
        let _ = writeln!(out, "    {}", band.advisory());
    }

    out.push('\n');
    render_indicators(&mut out, view);
    out.push('\n');
    render_series(&mut out, &view.snapshot.historical, view.hours);
    let _ = writeln!(
        out,
        "  Average PM2.5: {}",
        view.mean_pm25.display(1)
    );
    out.push('\n');
    render_comparison(&mut out, &view.comparison);

    for warning in &view.warnings {
        let line = match warning {
            AssembleWarning::RegionUnresolved { city } => {
                format!("note: no region known for {city}; current reading unavailable")
            }
            AssembleWarning::EmptyHistory { city } => {
                format!("note: no history collected for {city} in this window")
            }
        };
        let _ = writeln!(out, "{line}");
    }

    out
}

/// Renders whatever the session currently holds.
pub fn render_state(state: &ViewState) -> String {
    match state {
        ViewState::Idle => "No city selected.\n".to_string(),
        ViewState::Loading { city } => format!("Loading {city}...\n"),
        ViewState::Ready(view) => render_dashboard(view),
        ViewState::Failed {
            city,
            message,
            retryable,
        } => {
            let hint = if *retryable { " Try refreshing." } else { "" };
            format!("{city}: {message}{hint}\n")
        }
    }
}

/// Prints any serializable value as pretty JSON on stdout.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes `report` into `dir` under its suggested file name.
pub fn write_report(dir: &Path, report: &Report) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let path = dir.join(report.file_name());
    debug!(path = %path.display(), "Writing report");
    fs::write(&path, report.text()).with_context(|| format!("writing {}", path.display()))?;

    info!(path = %path.display(), "Report saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::classify::SeverityBand;
    use crate::analyzers::types::Aggregate;
    use crate::assemble::CitySnapshot;
    use crate::reading::Measurement;
    use crate::report::format_report;
    use chrono::Utc;
    use std::env;

    fn view(pm25: f64) -> DashboardView {
        let current = Reading {
            pm25: Measurement::new(pm25),
            ..Default::default()
        };
        DashboardView {
            classification: SeverityBand::from_pm25(pm25),
            snapshot: CitySnapshot {
                city: "Curitiba".to_string(),
                current,
                historical: Vec::new(),
            },
            mean_pm25: Aggregate::NoData,
            hours: 24,
            comparison: vec![
                ComparisonEntry {
                    city: "Salvador".to_string(),
                    latest_pm25: Measurement::new(80.0),
                    selected: false,
                },
                ComparisonEntry {
                    city: "Curitiba".to_string(),
                    latest_pm25: Measurement::new(pm25),
                    selected: true,
                },
                ComparisonEntry {
                    city: "Fortaleza".to_string(),
                    latest_pm25: Measurement::INVALID,
                    selected: false,
                },
            ],
            region: RegionResolution::Unresolved,
            warnings: vec![AssembleWarning::RegionUnresolved {
                city: "Curitiba".to_string(),
            }],
            assembled_at: Utc::now(),
        }
    }

    #[test]
    fn test_dashboard_shows_alert_for_unhealthy() {
        let text = render_dashboard(&view(70.0));
        assert!(text.contains(SeverityBand::Unhealthy.advisory_title()));
        assert!(text.contains("Average PM2.5: N/D"));
        assert!(text.contains("note: no region known for Curitiba"));
    }

    #[test]
    fn test_dashboard_hides_alert_when_good() {
        let text = render_dashboard(&view(5.0));
        assert!(!text.contains(SeverityBand::Good.advisory_title()));
    }

    #[test]
    fn test_comparison_bars() {
        let mut out = String::new();
        render_comparison(&mut out, &view(40.0).comparison);
        let lines: Vec<&str> = out.lines().collect();

        assert!(lines[1].ends_with(&"#".repeat(BAR_WIDTH)));
        assert!(lines[2].starts_with("* Curitiba"));
        assert!(lines[3].contains("N/D"));
    }

    #[test]
    fn test_render_failed_state() {
        let state = ViewState::Failed {
            city: "Atlantis".to_string(),
            message: "Data unavailable.".to_string(),
            retryable: false,
        };
        assert_eq!(render_state(&state), "Atlantis: Data unavailable.\n");
    }

    #[test]
    fn test_write_report() {
        let dir = env::temp_dir().join("aqdash_test_reports");
        let _ = fs::remove_dir_all(&dir);

        let report = format_report(&view(20.0), Utc::now());
        let path = write_report(&dir, &report).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), report.text());
        fs::remove_dir_all(&dir).unwrap();
    }
}
