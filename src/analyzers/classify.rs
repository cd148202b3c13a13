use serde::Serialize;

use crate::reading::Measurement;

/// Upper bound (inclusive) of the Good band, in µg/m³.
pub const GOOD_MAX: f64 = 12.0;
/// Upper bound (inclusive) of the Moderate band.
pub const MODERATE_MAX: f64 = 35.0;
/// Upper bound (inclusive) of the Unhealthy for Sensitive Groups band.
pub const SENSITIVE_MAX: f64 = 55.0;

/// Visual emphasis for a band: how loudly presentation should show it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    Success,
    Warning,
    Danger,
    Neutral,
}

/// Health-risk classification of a PM2.5 concentration.
///
/// | PM2.5 (µg/m³) | Band                  |
/// |---------------|-----------------------|
/// | <= 12         | Good                  |
/// | <= 35         | Moderate              |
/// | <= 55         | UnhealthyForSensitive |
/// | > 55          | Unhealthy             |
/// | not finite    | Unknown               |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityBand {
    Good,
    Moderate,
    UnhealthyForSensitive,
    Unhealthy,
    Unknown,
}

impl SeverityBand {
    pub fn from_pm25(pm25: f64) -> Self {
        match pm25 {
            p if !p.is_finite() => SeverityBand::Unknown,
            p if p <= GOOD_MAX => SeverityBand::Good,
            p if p <= MODERATE_MAX => SeverityBand::Moderate,
            p if p <= SENSITIVE_MAX => SeverityBand::UnhealthyForSensitive,
            _ => SeverityBand::Unhealthy,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SeverityBand::Good => "Good",
            SeverityBand::Moderate => "Moderate",
            SeverityBand::UnhealthyForSensitive => "Unhealthy for Sensitive Groups",
            SeverityBand::Unhealthy => "Unhealthy",
            SeverityBand::Unknown => "Unknown",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SeverityBand::Good => "Excellent air quality",
            SeverityBand::Moderate => "Acceptable air quality",
            SeverityBand::UnhealthyForSensitive => "Sensitive groups should take care",
            SeverityBand::Unhealthy => "Elevated health risk",
            SeverityBand::Unknown => "No valid PM2.5 reading",
        }
    }

    /// Lower-case phrase used inside sentences ("showed moderate levels").
    pub fn quality(&self) -> &'static str {
        match self {
            SeverityBand::Good => "good",
            SeverityBand::Moderate => "moderate",
            SeverityBand::UnhealthyForSensitive => "unhealthy for sensitive groups",
            SeverityBand::Unhealthy => "unhealthy",
            SeverityBand::Unknown => "undetermined",
        }
    }

    pub fn advisory_title(&self) -> &'static str {
        match self {
            SeverityBand::Good => "Air quality is good",
            SeverityBand::Moderate => "Moderate air quality",
            SeverityBand::UnhealthyForSensitive => "Caution: unhealthy for sensitive groups",
            SeverityBand::Unhealthy => "Alert: elevated health risk",
            SeverityBand::Unknown => "Air quality unavailable",
        }
    }

    pub fn advisory(&self) -> &'static str {
        match self {
            SeverityBand::Good => "The air is clean and healthy for everyone.",
            SeverityBand::Moderate => {
                "Air quality is acceptable. Unusually sensitive people should consider limiting prolonged outdoor activity."
            }
            SeverityBand::UnhealthyForSensitive => {
                "Children, older adults and people with respiratory conditions should avoid prolonged outdoor activity."
            }
            SeverityBand::Unhealthy => {
                "Air quality is unhealthy. Everyone should avoid outdoor activity and keep windows closed."
            }
            SeverityBand::Unknown => "No valid PM2.5 reading is available for this city.",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            SeverityBand::Good => "Excellent air quality. Enjoy outdoor activities.",
            SeverityBand::Moderate => "Air quality is acceptable for most people.",
            SeverityBand::UnhealthyForSensitive => {
                "Sensitive groups should limit outdoor activities."
            }
            SeverityBand::Unhealthy => "Avoid outdoor activities. Keep windows closed.",
            SeverityBand::Unknown => "No recommendation without a valid PM2.5 reading.",
        }
    }

    pub fn emphasis(&self) -> Emphasis {
        match self {
            SeverityBand::Good => Emphasis::Success,
            SeverityBand::Moderate | SeverityBand::UnhealthyForSensitive => Emphasis::Warning,
            SeverityBand::Unhealthy => Emphasis::Danger,
            SeverityBand::Unknown => Emphasis::Neutral,
        }
    }

    /// Whether presentation should raise a health alert banner.
    pub fn shows_alert(&self) -> bool {
        !matches!(self, SeverityBand::Good | SeverityBand::Unknown)
    }
}

/// Classifies a PM2.5 concentration. Never fails: anything that is not a
/// finite number is [`SeverityBand::Unknown`].
pub fn classify(pm25: f64) -> SeverityBand {
    SeverityBand::from_pm25(pm25)
}

pub fn classify_measurement(pm25: Measurement) -> SeverityBand {
    pm25.value()
        .map(SeverityBand::from_pm25)
        .unwrap_or(SeverityBand::Unknown)
}
