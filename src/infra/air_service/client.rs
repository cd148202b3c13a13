use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult, PayloadError};
use crate::fetch::{BasicClient, HttpClient, fetch_json};
use crate::parser::{self, ValueKind};
use crate::reading::Reading;
use crate::services::air_quality_api::{AirQualityApi, Pollution24h, ServiceInfo};

/// HTTP implementation of [`AirQualityApi`].
pub struct AirServiceClient<C = BasicClient> {
    http: C,
    base_url: Url,
}

impl AirServiceClient<BasicClient> {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Self::with_client(base_url, BasicClient::new())
    }
}

impl<C: HttpClient> AirServiceClient<C> {
    /// Creates a client that sends its requests through `http`.
    pub fn with_client(base_url: &str, http: C) -> ClientResult<Self> {
        let trimmed = base_url.trim();
        if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
            return Err(ClientError::InvalidUrl(format!(
                "URL must start with http:// or https://, got: {}",
                trimmed
            )));
        }

        let base_url = Url::parse(trimmed).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds `<base>/<segments...>?<query>`, percent-encoding every piece.
    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn get(&self, segments: &[&str], query: &[(&str, &str)]) -> ClientResult<(Url, Value)> {
        let url = self.endpoint(segments, query)?;
        let body = fetch_json(&self.http, url.clone()).await?;
        Ok((url, body))
    }
}

/// Wraps a parse failure with the endpoint it came from and logs it.
fn malformed(url: &Url, err: PayloadError) -> ClientError {
    warn!(endpoint = url.path(), error = %err, "Malformed response");
    ClientError::malformed(url.path(), err)
}

#[async_trait]
impl<C: HttpClient> AirQualityApi for AirServiceClient<C> {
    #[tracing::instrument(skip(self))]
    async fn service_info(&self) -> ClientResult<ServiceInfo> {
        let (url, body) = self.get(&[], &[]).await?;
        parser::parse_service_info(&body).map_err(|e| malformed(&url, e))
    }

    #[tracing::instrument(skip(self))]
    async fn countries(&self) -> ClientResult<Vec<String>> {
        let (url, body) = self.get(&["countries"], &[]).await?;
        parser::parse_name_list(&body, "country").map_err(|e| malformed(&url, e))
    }

    #[tracing::instrument(skip(self))]
    async fn states(&self, country: &str) -> ClientResult<Vec<String>> {
        let (url, body) = self.get(&["states"], &[("country", country)]).await?;
        parser::parse_name_list(&body, "state").map_err(|e| malformed(&url, e))
    }

    #[tracing::instrument(skip(self))]
    async fn cities(&self, country: &str, state: &str) -> ClientResult<Vec<String>> {
        let (url, body) = self
            .get(&["cities"], &[("country", country), ("state", state)])
            .await?;
        parser::parse_name_list(&body, "city").map_err(|e| malformed(&url, e))
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_current(
        &self,
        city: &str,
        state: &str,
        country: &str,
    ) -> ClientResult<Reading> {
        let (url, body) = self
            .get(
                &["cities", city, "current"],
                &[("state", state), ("country", country)],
            )
            .await?;
        let reading = parser::parse_reading(&body, ValueKind::Pm25).map_err(|e| malformed(&url, e))?;

        debug!(pm25 = ?reading.pm25.value(), "Current reading fetched");
        Ok(reading)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_history(&self, city: &str, hours: u32) -> ClientResult<Vec<Reading>> {
        let hours = hours.to_string();
        let (url, body) = self
            .get(&["cities", city, "history"], &[("hours", &hours)])
            .await?;
        let rows = parser::parse_readings(&body, ValueKind::Pm25).map_err(|e| malformed(&url, e))?;

        debug!(rows = rows.len(), "History fetched");
        Ok(rows)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_all_history(&self, hours: u32) -> ClientResult<BTreeMap<String, Vec<Reading>>> {
        let hours = hours.to_string();
        let (url, body) = self.get(&["history", "all"], &[("hours", &hours)]).await?;
        let rows = parser::parse_readings(&body, ValueKind::Pm25).map_err(|e| malformed(&url, e))?;

        let mut by_city: BTreeMap<String, Vec<Reading>> = BTreeMap::new();
        let mut unnamed = 0usize;
        for row in rows {
            match row.city.clone() {
                Some(city) => by_city.entry(city).or_default().push(row),
                None => unnamed += 1,
            }
        }

        if unnamed > 0 {
            debug!(unnamed, "Skipped history rows without a city");
        }
        debug!(cities = by_city.len(), "All-city history fetched");
        Ok(by_city)
    }

    #[tracing::instrument(skip(self))]
    async fn pollution_24h(
        &self,
        city: &str,
        state: Option<&str>,
        country: Option<&str>,
    ) -> ClientResult<Pollution24h> {
        let mut query = Vec::new();
        if let Some(state) = state {
            query.push(("state", state));
        }
        if let Some(country) = country {
            query.push(("country", country));
        }

        let (url, body) = self
            .get(&["cities", city, "pollution", "24h"], &query)
            .await?;
        parser::parse_pollution(&body, city).map_err(|e| malformed(&url, e))
    }
}
