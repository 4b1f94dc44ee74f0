//! Vouch daemon: entry point for running the review platform API.

mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use vouch_limiter::{FixedWindowLimiter, RateLimiter, StoreLimiter};
use vouch_rpc::{AppState, RpcServer, Services};
use vouch_store_lmdb::LmdbStore;
use vouch_types::{Clock, SystemClock};
use vouch_utils::LogFormat;
use vouch_verification::{WorldIdVerifier, WorldPaymentOracle};

use crate::config::{AppConfig, LimiterBackend};

#[derive(Parser)]
#[command(name = "vouch-daemon", about = "Vouch review platform daemon")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "VOUCH_CONFIG")]
    config: Option<PathBuf>,

    /// Address the HTTP API binds to.
    #[arg(long, env = "VOUCH_LISTEN_ADDR")]
    listen_addr: Option<SocketAddr>,

    /// Data directory for the LMDB environment.
    #[arg(long, env = "VOUCH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log format: "human" or "json".
    #[arg(long, env = "VOUCH_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "VOUCH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Production mode: mark cookies `Secure`.
    #[arg(long, env = "VOUCH_SECURE_COOKIES")]
    secure_cookies: bool,

    /// HMAC key for session cookies.
    #[arg(long, env = "VOUCH_SESSION_SECRET", hide_env_values = true)]
    session_secret: Option<String>,

    /// Whether the place list requires a session.
    #[arg(long, env = "VOUCH_PLACES_REQUIRE_AUTH")]
    places_require_auth: Option<bool>,

    /// Rate limit backend: "memory" or "store".
    #[arg(long, env = "VOUCH_RATE_LIMIT_BACKEND")]
    rate_limit_backend: Option<LimiterBackend>,

    /// Helpfulness votes per voter per day.
    #[arg(long, env = "VOUCH_VOTES_PER_DAY")]
    votes_per_day: Option<u32>,

    /// Maximum device-to-place distance for a review, in meters.
    #[arg(long, env = "VOUCH_PROXIMITY_RADIUS_M")]
    proximity_radius_m: Option<u64>,

    #[arg(long, env = "VOUCH_WORLD_APP_ID")]
    world_app_id: Option<String>,

    #[arg(long, env = "VOUCH_WORLD_API_KEY", hide_env_values = true)]
    world_api_key: Option<String>,

    #[arg(long, env = "VOUCH_WORLD_API_BASE")]
    world_api_base: Option<String>,

    /// Timeout for verifier and payment-oracle calls, in seconds.
    #[arg(long, env = "VOUCH_UPSTREAM_TIMEOUT_SECS")]
    upstream_timeout_secs: Option<u64>,

    /// Serve Prometheus metrics at /metrics.
    #[arg(long, env = "VOUCH_ENABLE_METRICS")]
    enable_metrics: Option<bool>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the HTTP API.
    Serve,
    /// Print the effective configuration as TOML and exit.
    PrintConfig,
}

impl Cli {
    /// Layer flags and env vars over the file (or default) configuration.
    fn resolve(&self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_toml_file(path)?,
            None => AppConfig::default(),
        };
        if let Some(addr) = self.listen_addr {
            config.listen_addr = addr;
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        config.secure_cookies |= self.secure_cookies;
        if self.session_secret.is_some() {
            config.session_secret = self.session_secret.clone();
        }
        if let Some(v) = self.places_require_auth {
            config.places_require_auth = v;
        }
        if let Some(backend) = self.rate_limit_backend {
            config.rate_limit_backend = backend;
        }
        if let Some(n) = self.votes_per_day {
            config.votes_per_day = n;
        }
        if let Some(r) = self.proximity_radius_m {
            config.proximity_radius_m = r;
        }
        if self.world_app_id.is_some() {
            config.world_app_id = self.world_app_id.clone();
        }
        if self.world_api_key.is_some() {
            config.world_api_key = self.world_api_key.clone();
        }
        if let Some(base) = &self.world_api_base {
            config.world_api_base = base.clone();
        }
        if let Some(t) = self.upstream_timeout_secs {
            config.upstream_timeout_secs = t;
        }
        if let Some(v) = self.enable_metrics {
            config.enable_metrics = v;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve()?;

    match cli.command {
        Command::PrintConfig => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        Command::Serve => {
            vouch_utils::init_tracing(config.log_format, &config.log_level)?;
            serve(config).await
        }
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!(
        "Starting Vouch API on {} (data: {}, limiter: {:?}, metrics: {})",
        config.listen_addr,
        config.data_dir.display(),
        config.rate_limit_backend,
        if config.enable_metrics { "on" } else { "off" },
    );
    if config.session_secret.is_none() {
        tracing::warn!("no session_secret configured; session cookies are unsigned");
    }
    if config.world_app_id.is_none() {
        tracing::warn!("no world_app_id configured; verification requests will fail");
    }

    let store = Arc::new(
        LmdbStore::open(&config.data_dir, config.lmdb_map_size)
            .with_context(|| format!("opening store at {}", config.data_dir.display()))?,
    );
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let limiter: Arc<dyn RateLimiter> = match config.rate_limit_backend {
        LimiterBackend::Memory => Arc::new(FixedWindowLimiter::new(Arc::clone(&clock))),
        LimiterBackend::Store => Arc::new(StoreLimiter::new(
            LmdbStore::clone(&store),
            Arc::clone(&clock),
        )),
    };
    let world = config.world_client();
    let verifier =
        WorldIdVerifier::new(world.clone()).context("building World ID verifier client")?;
    let payments = WorldPaymentOracle::new(world).context("building payment lookup client")?;
    let services = Services {
        limiter: Arc::clone(&limiter),
        verifier: Arc::new(verifier),
        payments: Arc::new(payments),
        clock,
    };
    let state = Arc::new(AppState::new(store, services, config.api())?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let purge = tokio::spawn(purge_windows(
        limiter,
        Duration::from_secs(config.limiter_purge_interval_secs),
        shutdown_rx,
    ));

    let server = RpcServer::new(config.listen_addr, state);
    let result = server.serve(shutdown_signal()).await;

    tracing::info!("HTTP API stopped, stopping background tasks");
    let _ = shutdown_tx.send(true);
    let _ = purge.await;

    result?;
    tracing::info!("Vouch daemon exited cleanly");
    Ok(())
}

/// Drop expired rate-limit windows every `interval` until shutdown.
async fn purge_windows(
    limiter: Arc<dyn RateLimiter>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let limiter = Arc::clone(&limiter);
                match tokio::task::spawn_blocking(move || limiter.purge_expired()).await {
                    Ok(Ok(0)) => {}
                    Ok(Ok(n)) => tracing::debug!(purged = n, "expired rate-limit windows dropped"),
                    Ok(Err(e)) => tracing::warn!(error = %e, "rate-limit purge failed"),
                    Err(e) => tracing::warn!(error = %e, "rate-limit purge task panicked"),
                }
            }
            _ = shutdown.changed() => break,
        }
    }
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
