//! Trait and types for talking to the air-quality data service.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::ClientResult;
use crate::reading::Reading;

/// Body of the service's `/` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub message: Option<String>,
    pub version: Option<String>,
    /// The whole payload, for display.
    pub raw: Value,
}

/// Full pollution series for one city over the last 24 hours.
#[derive(Debug, Clone, Serialize)]
pub struct Pollution24h {
    pub city: String,
    pub country: Option<String>,
    pub data: Vec<Reading>,
}

/// Abstraction over the remote air-quality service.
///
/// Every method issues exactly one request and makes a single attempt;
/// retrying is left to the caller.
#[async_trait]
pub trait AirQualityApi: Send + Sync {
    async fn service_info(&self) -> ClientResult<ServiceInfo>;

    async fn countries(&self) -> ClientResult<Vec<String>>;

    async fn states(&self, country: &str) -> ClientResult<Vec<String>>;

    async fn cities(&self, country: &str, state: &str) -> ClientResult<Vec<String>>;

    /// Latest reading for a city. The service needs the region to locate it.
    async fn fetch_current(&self, city: &str, state: &str, country: &str)
    -> ClientResult<Reading>;

    /// Collected history for one city over the last `hours`.
    async fn fetch_history(&self, city: &str, hours: u32) -> ClientResult<Vec<Reading>>;

    /// Collected history for every city, grouped by city name.
    async fn fetch_all_history(&self, hours: u32) -> ClientResult<BTreeMap<String, Vec<Reading>>>;

    async fn pollution_24h(
        &self,
        city: &str,
        state: Option<&str>,
        country: Option<&str>,
    ) -> ClientResult<Pollution24h>;
}
