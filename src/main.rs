// src/main.rs

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::future::IntoFuture;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use taxi_fare_bot::api::http_router;
use taxi_fare_bot::config::{FareConfig, CONFIG};
use taxi_fare_bot::features::derive_features;
use taxi_fare_bot::geocode::GeocodeClient;
use taxi_fare_bot::intake::resolver::LocationResolver;
use taxi_fare_bot::intake::validators::{parse_coordinates, validate_datetime};
use taxi_fare_bot::model::{self, FareModel, FarePredictor};
use taxi_fare_bot::trip::{GeoPoint, PartialTripInput};
use taxi_fare_bot::AppState;

#[derive(Parser)]
#[command(name = "taxi-fare-bot")]
#[command(about = "Conversational taxi fare estimator")]
#[command(version)]
struct Cli {
    /// Model directory (overrides MODELS_DIR)
    #[arg(long, global = true)]
    models_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook server (default)
    Serve,

    /// Estimate a single trip from the command line
    Estimate {
        /// Pickup as "lat lon" or an address
        #[arg(long)]
        pickup: String,

        /// Dropoff as "lat lon" or an address
        #[arg(long)]
        dropoff: String,

        #[arg(long)]
        passengers: u32,

        /// ISO-8601 pickup time, e.g. "2023-06-15 14:30:00"
        #[arg(long)]
        datetime: String,
    },
}

fn init_logging(config: &FareConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    fmt().with_env_filter(filter).init();
}

fn load_model(models_dir: &Path) -> Result<Arc<dyn FareModel>> {
    let model = model::load_latest(models_dir)
        .with_context(|| format!("Failed to load fare model from {}", models_dir.display()))?;
    Ok(Arc::new(model))
}

fn spawn_session_sweeper(app_state: Arc<AppState>, config: &FareConfig) -> JoinHandle<()> {
    let interval = config.session_sweep_interval();
    let max_idle = config.session_stale_timeout();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let evicted = app_state.bot.sessions().evict_stale(max_idle).await;
            if evicted > 0 {
                let remaining = app_state.bot.sessions().len().await;
                info!("Evicted {} stale sessions, {} remaining", evicted, remaining);
            }
        }
    })
}

async fn serve(config: &FareConfig, models_dir: &Path) -> Result<()> {
    let model = load_model(models_dir)?;
    let model_name = model.name().to_string();
    let geocoder = GeocodeClient::from_config(config).context("Failed to build geocoding client")?;

    let app_state = Arc::new(AppState::from_config(config, Arc::new(geocoder), model));
    let sweeper = spawn_session_sweeper(app_state.clone(), config);

    let app = http_router(app_state);
    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    info!("Model: {}", model_name);
    info!("Webhook listening on http://{}/bot", bind_address);

    tokio::select! {
        result = axum::serve(listener, app).into_future() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
        }
        _ = sweeper => {
            error!("Session sweeper unexpectedly terminated");
        }
    }

    Ok(())
}

async fn estimate(
    config: &FareConfig,
    models_dir: &Path,
    pickup: &str,
    dropoff: &str,
    passengers: u32,
    datetime: &str,
) -> Result<()> {
    let predictor = FarePredictor::new(load_model(models_dir)?);
    info!("Model: {}", predictor.model_name());
    let geocoder = GeocodeClient::from_config(config).context("Failed to build geocoding client")?;
    let resolver = LocationResolver::new(Arc::new(geocoder));

    let pickup = resolve_point(&resolver, "pickup", pickup).await?;
    let dropoff = resolve_point(&resolver, "dropoff", dropoff).await?;
    let Some(datetime) = validate_datetime(datetime) else {
        bail!("Could not read pickup time '{}'", datetime);
    };

    let trip = PartialTripInput::default()
        .with_pickup(pickup)
        .with_dropoff(dropoff)
        .with_passengers(passengers)
        .with_pickup_datetime(datetime);

    let request = match trip.validate() {
        Ok(request) => request,
        Err(errors) => bail!("{}", errors),
    };

    let features = derive_features(&request);
    println!("{}", serde_json::to_string_pretty(&features)?);

    let fare = predictor.estimate_features(&features)?;
    println!("Trip fare: {}", fare);
    Ok(())
}

async fn resolve_point(resolver: &LocationResolver, label: &str, text: &str) -> Result<GeoPoint> {
    resolver
        .resolve(text)
        .await
        .and_then(|raw| parse_coordinates(&raw.latitude, &raw.longitude))
        .with_context(|| {
            format!("Could not resolve {} point '{}' inside the service area", label, text)
        })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config: &FareConfig = &CONFIG;
    init_logging(config);

    let models_dir = cli
        .models_dir
        .unwrap_or_else(|| PathBuf::from(&config.models_dir));

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config, &models_dir).await,
        Commands::Estimate {
            pickup,
            dropoff,
            passengers,
            datetime,
        } => estimate(config, &models_dir, &pickup, &dropoff, passengers, &datetime).await,
    }
}
