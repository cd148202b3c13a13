//! Builds the dashboard view-model for one city.
//!
//! History is fetched first because it names the city's region. The current
//! reading (which needs that region) and the all-cities history used for the
//! comparison are then fetched concurrently and joined. Any client failure
//! becomes a single [`AssembleError`]; a half-built view is never returned.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analyzers::aggregate::{latest_valid, mean_of};
use crate::analyzers::classify::{SeverityBand, classify_measurement};
use crate::analyzers::types::Aggregate;
use crate::config::DashboardSettings;
use crate::error::ClientError;
use crate::reading::{Field, Measurement, Reading};
use crate::services::air_quality_api::AirQualityApi;

/// The current-plus-historical bundle for one city.
#[derive(Debug, Clone, Serialize)]
pub struct CitySnapshot {
    pub city: String,
    pub current: Reading,
    /// Oldest first, no future entries.
    pub historical: Vec<Reading>,
}

/// Latest PM2.5 of one city, for the cross-city comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonEntry {
    pub city: String,
    pub latest_pm25: Measurement,
    /// True for the city the view was built for.
    pub selected: bool,
}

/// Where the region used for the current-reading request came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "region", rename_all = "snake_case")]
pub enum RegionResolution {
    FromHistory(String),
    FromFallback(String),
    Unresolved,
}

impl RegionResolution {
    pub fn region(&self) -> Option<&str> {
        match self {
            RegionResolution::FromHistory(r) | RegionResolution::FromFallback(r) => Some(r),
            RegionResolution::Unresolved => None,
        }
    }
}

/// Non-fatal conditions shown next to the view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssembleWarning {
    /// No region known, so the current reading was not requested.
    RegionUnresolved { city: String },
    /// The history window held no usable rows.
    EmptyHistory { city: String },
}

/// Everything presentation needs for one city.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub snapshot: CitySnapshot,
    pub classification: SeverityBand,
    pub mean_pm25: Aggregate,
    pub hours: u32,
    pub comparison: Vec<ComparisonEntry>,
    pub region: RegionResolution,
    pub warnings: Vec<AssembleWarning>,
    pub assembled_at: DateTime<Utc>,
}

impl DashboardView {
    pub fn city(&self) -> &str {
        &self.snapshot.city
    }

    pub fn current(&self) -> &Reading {
        &self.snapshot.current
    }
}

/// Why a view could not be built.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("could not load history for {city}: {source}")]
    History {
        city: String,
        #[source]
        source: ClientError,
    },

    #[error("could not load the current reading for {city}: {source}")]
    Current {
        city: String,
        #[source]
        source: ClientError,
    },

    #[error("could not load the city comparison: {source}")]
    Comparison {
        #[source]
        source: ClientError,
    },
}

impl AssembleError {
    pub fn client_error(&self) -> &ClientError {
        match self {
            AssembleError::History { source, .. }
            | AssembleError::Current { source, .. }
            | AssembleError::Comparison { source } => source,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.client_error().is_retryable()
    }

    /// The one message shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self.client_error() {
            ClientError::Network { message, .. } => {
                format!("Could not reach the air-quality service: {message}")
            }
            ClientError::Malformed { .. } => "Data unavailable.".to_string(),
            ClientError::InvalidUrl(url) => format!("The service URL is invalid: {url}"),
        }
    }
}

/// Picks the region for `city`: the newest row of the normalized `history`
/// that names one, then the static table.
pub fn resolve_region(
    city: &str,
    history: &[Reading],
    settings: &DashboardSettings,
) -> RegionResolution {
    let from_history = history
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.state.as_ref().map(|s| (r.timestamp, i, s)))
        .max_by_key(|(ts, i, _)| (*ts, *i))
        .map(|(_, _, s)| s.clone());

    if let Some(region) = from_history {
        return RegionResolution::FromHistory(region);
    }
    match settings.regions.lookup(city) {
        Some(region) => RegionResolution::FromFallback(region.to_string()),
        None => RegionResolution::Unresolved,
    }
}

/// Sorts oldest first and drops rows that cannot be placed on the time axis
/// or lie after `now`.
pub fn normalize_series(rows: Vec<Reading>, now: DateTime<Utc>) -> Vec<Reading> {
    let total = rows.len();
    let mut series: Vec<Reading> = rows
        .into_iter()
        .filter(|r| matches!(r.timestamp, Some(ts) if ts <= now))
        .collect();
    series.sort_by_key(|r| r.timestamp);

    if series.len() < total {
        debug!(dropped = total - series.len(), "Dropped untimed or future rows");
    }
    series
}

fn same_city(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// One entry per known city (plus the selected one when it is not listed),
/// highest PM2.5 first; cities without a valid value go last.
pub fn build_comparison(
    known_cities: &[String],
    selected: &str,
    current: &Reading,
    all_history: &BTreeMap<String, Vec<Reading>>,
) -> Vec<ComparisonEntry> {
    let mut names: Vec<&str> = known_cities.iter().map(String::as_str).collect();
    if !names.iter().any(|c| same_city(c, selected)) {
        names.push(selected);
    }

    let mut entries: Vec<ComparisonEntry> = names
        .into_iter()
        .map(|name| {
            let is_selected = same_city(name, selected);
            let from_history = all_history
                .iter()
                .find(|(city, _)| same_city(city, name))
                .map(|(_, rows)| latest_valid(rows, Field::Pm25))
                .unwrap_or_default();
            let latest_pm25 = if is_selected && current.pm25.is_valid() {
                current.pm25
            } else {
                from_history
            };

            ComparisonEntry {
                city: name.to_string(),
                latest_pm25,
                selected: is_selected,
            }
        })
        .collect();

    // Stable: ties and missing values keep configuration order.
    entries.sort_by(|a, b| match (a.latest_pm25.value(), b.latest_pm25.value()) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    entries
}

/// Fetches and derives everything the dashboard shows for `city`.
#[tracing::instrument(skip(api, settings), fields(hours = settings.history_hours))]
pub async fn assemble<A: AirQualityApi + ?Sized>(
    api: &A,
    settings: &DashboardSettings,
    city: &str,
) -> Result<DashboardView, AssembleError> {
    let hours = settings.history_hours;

    let history = api
        .fetch_history(city, hours)
        .await
        .map_err(|source| AssembleError::History {
            city: city.to_string(),
            source,
        })?;

    let now = Utc::now();
    let historical = normalize_series(history, now);

    let region = resolve_region(city, &historical, settings);
    debug!(?region, "Region resolved");

    let current_fut = async {
        match region.region() {
            Some(state) => api
                .fetch_current(city, state, &settings.country)
                .await
                .map(Some),
            None => Ok(None),
        }
    };
    let (current, all_history) = tokio::join!(current_fut, api.fetch_all_history(hours));

    let current = match (current, all_history.as_ref()) {
        (Err(source), other) => {
            if let Err(e) = other {
                debug!(error = %e, "Comparison also failed");
            }
            return Err(AssembleError::Current {
                city: city.to_string(),
                source,
            });
        }
        (Ok(current), _) => current,
    };
    let all_history = all_history.map_err(|source| AssembleError::Comparison { source })?;

    // Anything stamped after the fetches returned is in the future.
    let received = Utc::now();
    let all_history: BTreeMap<String, Vec<Reading>> = all_history
        .into_iter()
        .map(|(name, rows)| (name, normalize_series(rows, received)))
        .collect();

    let mut warnings = Vec::new();

    let current = match current {
        Some(mut reading) => {
            if reading.timestamp.is_some_and(|ts| ts > received) {
                warn!(timestamp = ?reading.timestamp, "Current reading is dated in the future");
                reading.timestamp = None;
            }
            reading
        }
        None => {
            info!("Region unresolved, current reading skipped");
            warnings.push(AssembleWarning::RegionUnresolved {
                city: city.to_string(),
            });
            Reading::unavailable()
        }
    };

    if historical.is_empty() {
        warnings.push(AssembleWarning::EmptyHistory {
            city: city.to_string(),
        });
    }

    let classification = classify_measurement(current.pm25);
    let mean_pm25 = mean_of(&historical, Field::Pm25);
    let comparison = build_comparison(&settings.cities, city, &current, &all_history);

    info!(
        classification = classification.label(),
        rows = historical.len(),
        "Dashboard view assembled"
    );

    Ok(DashboardView {
        snapshot: CitySnapshot {
            city: city.to_string(),
            current,
            historical,
        },
        classification,
        mean_pm25,
        hours,
        comparison,
        region,
        warnings,
        assembled_at: now,
    })
}
