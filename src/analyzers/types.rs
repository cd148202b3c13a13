//! Result types produced by the aggregation helpers.

use serde::Serialize;

use crate::reading::{Field, Measurement, NO_DATA};

/// Mean of a field over a series, or an explicit "no data" result when the
/// series held no valid value for that field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate {
    Value(f64),
    NoData,
}

impl Aggregate {
    pub fn value(self) -> Option<f64> {
        match self {
            Aggregate::Value(v) => Some(v),
            Aggregate::NoData => None,
        }
    }

    pub fn is_no_data(self) -> bool {
        matches!(self, Aggregate::NoData)
    }

    pub fn display(self, precision: usize) -> String {
        match self {
            Aggregate::Value(v) => format!("{:.*}", precision, v),
            Aggregate::NoData => NO_DATA.to_string(),
        }
    }
}

impl From<Aggregate> for Measurement {
    fn from(value: Aggregate) -> Self {
        value.value().into()
    }
}

/// Descriptive statistics of one field over a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub field: Field,
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub stddev: f64,
}
