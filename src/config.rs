//! Runtime configuration.
//!
//! Values come from the environment (a `.env` file is loaded by the binary
//! through `dotenvy`) and fall back to the defaults below. The resulting
//! [`DashboardSettings`] is owned by the caller and handed to the assembler
//! explicitly.

use anyhow::{Context, Result, bail};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_COUNTRY: &str = "Brazil";
pub const DEFAULT_HISTORY_HOURS: u32 = 24;

const DEFAULT_CITIES: &[&str] = &[
    "São Paulo",
    "Rio de Janeiro",
    "Belo Horizonte",
    "Brasília",
    "Curitiba",
    "Porto Alegre",
    "Salvador",
    "Fortaleza",
];

const DEFAULT_REGIONS: &[(&str, &str)] = &[
    ("São Paulo", "Sao Paulo"),
    ("Rio de Janeiro", "Rio de Janeiro"),
    ("Belo Horizonte", "Minas Gerais"),
    ("Brasília", "Distrito Federal"),
    ("Curitiba", "Parana"),
    ("Porto Alegre", "Rio Grande do Sul"),
    ("Salvador", "Bahia"),
    ("Fortaleza", "Ceara"),
];

/// Static city → region table used when history does not report a region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionTable {
    entries: Vec<(String, String)>,
}

impl RegionTable {
    pub fn new<I, C, R>(entries: I) -> Self
    where
        I: IntoIterator<Item = (C, R)>,
        C: Into<String>,
        R: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(c, r)| (c.into(), r.into()))
                .collect(),
        }
    }

    /// Parses `City=State;City=State`.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for pair in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((city, region)) = pair.split_once('=') else {
                bail!("region entry `{pair}` is not of the form City=State");
            };
            let (city, region) = (city.trim(), region.trim());
            if city.is_empty() || region.is_empty() {
                bail!("region entry `{pair}` has an empty side");
            }
            entries.push((city.to_string(), region.to_string()));
        }
        Ok(Self { entries })
    }

    /// Case-insensitive lookup.
    pub fn lookup(&self, city: &str) -> Option<&str> {
        let wanted = city.trim().to_lowercase();
        self.entries
            .iter()
            .find(|(c, _)| c.to_lowercase() == wanted)
            .map(|(_, r)| r.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(c, r)| (c.as_str(), r.as_str()))
    }
}

/// What the assembler needs besides the service itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSettings {
    /// Country passed to the current-reading endpoint.
    pub country: String,
    /// Lookback window for history and comparison.
    pub history_hours: u32,
    /// Cities shown in the comparison.
    pub cities: Vec<String>,
    pub regions: RegionTable,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            country: DEFAULT_COUNTRY.to_string(),
            history_hours: DEFAULT_HISTORY_HOURS,
            cities: DEFAULT_CITIES.iter().map(|c| c.to_string()).collect(),
            regions: RegionTable::new(DEFAULT_REGIONS.iter().copied()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub dashboard: DashboardSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            dashboard: DashboardSettings::default(),
        }
    }
}

impl Config {
    /// Reads `AIR_API_URL`, `AIR_DEFAULT_COUNTRY`, `AIR_HISTORY_HOURS`,
    /// `AIR_CITIES` and `AIR_REGIONS` from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get("AIR_API_URL") {
            config.api_url = url;
        }
        if let Some(country) = get("AIR_DEFAULT_COUNTRY") {
            config.dashboard.country = country;
        }
        if let Some(hours) = get("AIR_HISTORY_HOURS") {
            config.dashboard.history_hours = hours
                .parse()
                .with_context(|| format!("AIR_HISTORY_HOURS must be a whole number, got `{hours}`"))?;
            if config.dashboard.history_hours == 0 {
                bail!("AIR_HISTORY_HOURS must be at least 1");
            }
        }
        if let Some(cities) = get("AIR_CITIES") {
            config.dashboard.cities = cities
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(regions) = get("AIR_REGIONS") {
            config.dashboard.regions = RegionTable::parse(&regions).context("invalid AIR_REGIONS")?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            bail!(
                "AIR_API_URL must start with http:// or https://, got: {}",
                self.api_url
            );
        }
        Ok(())
    }
}
