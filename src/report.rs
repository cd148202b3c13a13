//! Plain-text air-quality report.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::analyzers::classify::SeverityBand;
use crate::assemble::DashboardView;
use crate::reading::{Field, NO_DATA};

/// A generated report. Immutable: regenerating produces a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    city: String,
    generated_at: DateTime<Utc>,
    text: String,
}

impl Report {
    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Suggested download name, e.g. `air-quality-report-curitiba-2025-03-01.txt`.
    pub fn file_name(&self) -> String {
        format!(
            "air-quality-report-{}-{}.txt",
            slug(&self.city),
            self.generated_at.format("%Y-%m-%d")
        )
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn slug(city: &str) -> String {
    let mut out = String::with_capacity(city.len());
    for c in city.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "city".to_string()
    } else {
        trimmed.to_string()
    }
}

fn indicator(view: &DashboardView, field: Field) -> String {
    let value = view
        .current()
        .get(field)
        .display_with_unit(field.precision(), field.unit());
    format!("- {}: {}", field.label(), value)
}

fn summary(city: &str, band: SeverityBand) -> String {
    match band {
        SeverityBand::Unknown => {
            format!("No valid PM2.5 reading was available for {city}; the air quality could not be determined.")
        }
        band => format!("Today, {city} showed {} air pollution levels.", band.quality()),
    }
}

/// Formats the fixed-section report for `view`.
///
/// Any missing value is written as `N/D`. The classification and the
/// recommendation both come from `view.classification`.
pub fn format_report(view: &DashboardView, generated_at: DateTime<Utc>) -> Report {
    let city = view.city();
    let band = view.classification;

    let mean = match view.mean_pm25.value() {
        Some(v) => format!("{:.1}{}", v, Field::Pm25.unit()),
        None => NO_DATA.to_string(),
    };

    let lines = [
        format!("AIR QUALITY REPORT - {city}"),
        format!("Date: {}", generated_at.format("%Y-%m-%d")),
        format!("Time: {} UTC", generated_at.format("%H:%M:%S")),
        String::new(),
        "EXECUTIVE SUMMARY".to_string(),
        summary(city, band),
        String::new(),
        "MAIN INDICATORS".to_string(),
        indicator(view, Field::Pm25),
        indicator(view, Field::Pm10),
        indicator(view, Field::Temperature),
        indicator(view, Field::Humidity),
        String::new(),
        "CLASSIFICATION".to_string(),
        format!("Air quality was classified as \"{}\".", band.label()),
        String::new(),
        "RECOMMENDATIONS".to_string(),
        band.recommendation().to_string(),
        String::new(),
        format!("LAST {} HOURS ANALYSIS", view.hours),
        format!(
            "The average PM2.5 concentration over the last {} hours was {}.",
            view.hours, mean
        ),
        String::new(),
        "---".to_string(),
        "Report generated automatically by the Air Quality Dashboard".to_string(),
    ];

    Report {
        city: city.to_string(),
        generated_at,
        text: lines.join("\n"),
    }
}
