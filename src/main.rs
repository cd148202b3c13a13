//! CLI entry point for the air-quality dashboard.
//!
//! Provides subcommands for browsing the service catalog, showing the
//! dashboard for one city, writing its report, and cycling through cities.

use anyhow::{Context, Result, anyhow, bail};
use aqdash::{
    assemble::{AssembleError, DashboardView, assemble},
    config::{Config, DashboardSettings},
    infra::air_service::AirServiceClient,
    output::{print_json, render_dashboard, render_state, write_report},
    report::format_report,
    services::air_quality_api::AirQualityApi,
    session::{Session, Ticket},
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::Instrument;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "aqdash")]
#[command(about = "Air-quality dashboard for the terminal", long_about = None)]
struct Cli {
    /// Base URL of the air-quality service (overrides AIR_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Country used for current readings (overrides AIR_DEFAULT_COUNTRY)
    #[arg(long, global = true)]
    country: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the service status payload
    Info,
    /// List countries known to the service
    Countries,
    /// List states of a country
    States,
    /// List cities of a state
    Cities {
        #[arg(short, long)]
        state: String,
    },
    /// Show the dashboard for a city
    Show {
        city: String,

        /// Lookback window in hours
        #[arg(long)]
        hours: Option<u32>,

        /// Print the view as JSON instead of the text dashboard
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the air-quality report for a city
    Report {
        city: String,

        /// Lookback window in hours
        #[arg(long)]
        hours: Option<u32>,

        /// Also save the report file into this directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the last 24 hours of pollution readings for a city
    Pollution {
        city: String,

        /// Region of the city; looked up in AIR_REGIONS when omitted
        #[arg(short, long)]
        state: Option<String>,
    },
    /// Cycle the selection through cities and refresh on an interval
    Watch {
        /// Cities to cycle through (defaults to AIR_CITIES)
        cities: Vec<String>,

        /// Seconds between selections
        #[arg(short, long, default_value_t = 30)]
        interval: u64,

        /// Number of selections before exiting (0 = until Ctrl+C)
        #[arg(short = 'n', long, default_value_t = 0)]
        rounds: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/aqdash.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("aqdash.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if let Some(country) = cli.country {
        config.dashboard.country = country;
    }
    config.validate()?;

    let api = AirServiceClient::new(&config.api_url)
        .with_context(|| format!("invalid service URL {}", config.api_url))?;
    debug!(api_url = %api.base_url(), "Service client ready");

    let settings = config.dashboard;

    match cli.command {
        Commands::Info => {
            let info = api.service_info().await?;
            info!(
                message = info.message.as_deref().unwrap_or(""),
                version = info.version.as_deref().unwrap_or(""),
                "Service info"
            );
            print_json(&info.raw)?;
        }
        Commands::Countries => {
            print_names(api.countries().await?);
        }
        Commands::States => {
            print_names(api.states(&settings.country).await?);
        }
        Commands::Cities { state } => {
            print_names(api.cities(&settings.country, &state).await?);
        }
        Commands::Show { city, hours, json } => {
            let settings = with_hours(settings, hours)?;
            let view = load_view(&api, &settings, &city).await?;
            if json {
                print_json(&view)?;
            } else {
                print!("{}", render_dashboard(&view));
            }
        }
        Commands::Report {
            city,
            hours,
            output,
        } => {
            let settings = with_hours(settings, hours)?;
            let view = load_view(&api, &settings, &city).await?;
            let report = format_report(&view, Utc::now());
            println!("{report}");

            if let Some(dir) = output {
                let path = write_report(&dir, &report)?;
                println!("\nSaved to {}", path.display());
            }
        }
        Commands::Pollution { city, state } => {
            let state = state.or_else(|| settings.regions.lookup(&city).map(str::to_string));
            let series = api
                .pollution_24h(&city, state.as_deref(), Some(&settings.country))
                .await?;

            info!(city = %series.city, rows = series.data.len(), "Pollution series fetched");
            for reading in &series.data {
                let time = reading
                    .timestamp
                    .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!(
                    "{:<16} PM2.5 {:>6}  PM10 {:>6}",
                    time,
                    reading.pm25.display(1),
                    reading.pm10.display(1)
                );
            }
        }
        Commands::Watch {
            cities,
            interval,
            rounds,
        } => {
            let cities = if cities.is_empty() {
                settings.cities.clone()
            } else {
                cities
            };
            watch(Arc::new(api), settings, cities, interval, rounds, ctrl_c()).await?;
        }
    }

    Ok(())
}

fn print_names(names: Vec<String>) {
    info!(total = names.len(), "Names fetched");
    for name in names {
        println!("{name}");
    }
}

fn with_hours(mut settings: DashboardSettings, hours: Option<u32>) -> Result<DashboardSettings> {
    if let Some(hours) = hours {
        if hours == 0 {
            bail!("--hours must be at least 1");
        }
        settings.history_hours = hours;
    }
    Ok(settings)
}

/// Assembles the view, turning an assembly failure into its user-facing message.
async fn load_view(
    api: &AirServiceClient,
    settings: &DashboardSettings,
    city: &str,
) -> Result<DashboardView> {
    assemble(api, settings, city).await.map_err(|e| {
        error!(error = %e, retryable = e.is_retryable(), "Failed to load dashboard");
        anyhow!(e.user_message())
    })
}

/// Resolves on the first Ctrl+C. Never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Ctrl+C handler unavailable");
        std::future::pending::<()>().await;
    }
}

/// Selects each city in turn every `interval` seconds until `rounds`
/// selections have completed or `shutdown` resolves. Every selection spawns
/// its own fetch; results are applied through the session so only the latest
/// selection is ever rendered.
#[tracing::instrument(skip(api, settings, cities, shutdown), fields(city_count = cities.len()))]
async fn watch<A>(
    api: Arc<A>,
    settings: DashboardSettings,
    cities: Vec<String>,
    interval: u64,
    rounds: usize,
    shutdown: impl Future<Output = ()>,
) -> Result<()>
where
    A: AirQualityApi + 'static,
{
    if cities.is_empty() {
        bail!("no cities to watch; pass some or set AIR_CITIES");
    }

    let settings = Arc::new(settings);
    let (tx, mut rx) = mpsc::channel::<(Ticket, Result<DashboardView, AssembleError>)>(16);

    let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));
    let mut session = Session::new();
    let mut selections = 0usize;

    if rounds == 0 {
        info!(interval, "Watching until Ctrl+C");
    } else {
        info!(interval, rounds, "Starting watch");
    }

    tokio::pin!(shutdown);

    loop {
        if rounds > 0 && selections >= rounds && !session.is_loading() {
            break;
        }

        tokio::select! {
            _ = ticker.tick(), if rounds == 0 || selections < rounds => {
                let city = &cities[selections % cities.len()];
                selections += 1;

                let ticket = session.select(city.as_str());
                info!(city = %city, generation = ticket.generation(), "Selected");

                let api = api.clone();
                let settings = settings.clone();
                let tx = tx.clone();
                let span = tracing::info_span!("refresh", city = %city);

                tokio::spawn(
                    async move {
                        let result = assemble(api.as_ref(), &settings, ticket.city()).await;
                        if tx.send((ticket, result)).await.is_err() {
                            debug!("Watch loop already finished");
                        }
                    }
                    .instrument(span),
                );
            }
            Some((ticket, result)) = rx.recv() => {
                if session.complete(ticket, result) {
                    print!("{}", render_state(session.state()));
                }
            }
            _ = &mut shutdown => {
                warn!("Shutdown requested");
                break;
            }
        }
    }

    info!(selections, "Watch finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqdash::error::{ClientError, ClientResult};
    use aqdash::reading::Reading;
    use aqdash::services::air_quality_api::{Pollution24h, ServiceInfo};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    /// Service that is always unreachable; counts history requests.
    #[derive(Default)]
    struct Offline {
        history_calls: AtomicUsize,
    }

    fn offline() -> ClientError {
        ClientError::Network {
            status: None,
            message: "connection refused".to_string(),
        }
    }

    #[async_trait]
    impl AirQualityApi for Offline {
        async fn service_info(&self) -> ClientResult<ServiceInfo> {
            Err(offline())
        }

        async fn countries(&self) -> ClientResult<Vec<String>> {
            Err(offline())
        }

        async fn states(&self, _country: &str) -> ClientResult<Vec<String>> {
            Err(offline())
        }

        async fn cities(&self, _country: &str, _state: &str) -> ClientResult<Vec<String>> {
            Err(offline())
        }

        async fn fetch_current(
            &self,
            _city: &str,
            _state: &str,
            _country: &str,
        ) -> ClientResult<Reading> {
            Err(offline())
        }

        async fn fetch_history(&self, _city: &str, _hours: u32) -> ClientResult<Vec<Reading>> {
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            Err(offline())
        }

        async fn fetch_all_history(
            &self,
            _hours: u32,
        ) -> ClientResult<BTreeMap<String, Vec<Reading>>> {
            Err(offline())
        }

        async fn pollution_24h(
            &self,
            _city: &str,
            _state: Option<&str>,
            _country: Option<&str>,
        ) -> ClientResult<Pollution24h> {
            Err(offline())
        }
    }

    #[tokio::test]
    async fn test_watch_stops_after_requested_rounds() {
        let api = Arc::new(Offline::default());
        let cities = vec!["Curitiba".to_string()];

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            watch(
                api.clone(),
                DashboardSettings::default(),
                cities,
                3600,
                1,
                std::future::pending(),
            ),
        )
        .await;

        assert!(matches!(result, Ok(Ok(()))));
        assert_eq!(api.history_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_watch_honours_shutdown_between_passes() {
        let api = Arc::new(Offline::default());
        let cities = vec!["Curitiba".to_string(), "Salvador".to_string()];
        let (stop, stopped) = oneshot::channel::<()>();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = stop.send(());
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            watch(
                api.clone(),
                DashboardSettings::default(),
                cities,
                3600,
                0,
                async {
                    let _ = stopped.await;
                },
            ),
        )
        .await;

        assert!(matches!(result, Ok(Ok(()))));
        assert!(api.history_calls.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_watch_needs_cities() {
        let api = Arc::new(Offline::default());
        let result = watch(
            api,
            DashboardSettings::default(),
            Vec::new(),
            1,
            1,
            std::future::pending(),
        )
        .await;
        assert!(result.is_err());
    }
}
