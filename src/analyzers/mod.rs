//! Classification and aggregation of readings.
//!
//! This module turns a PM2.5 concentration into a severity band and
//! computes statistics over historical series. Nothing here fails: invalid
//! input yields [`classify::SeverityBand::Unknown`] or
//! [`types::Aggregate::NoData`].

pub mod aggregate;
pub mod classify;
pub mod types;
pub mod utility;
