//! dopo-web - Radio Dopo site service
//!
//! Serves the content API, sitemap, schedule, submission form backend and
//! CMS webhook, and runs the daily reminder trigger.

use anyhow::{Context, Result};
use clap::Parser;
use dopo_common::config::{CliOverrides, SiteConfig, TomlConfig};
use dopo_web::api::health::BuildInfo;
use dopo_web::{build_router, scheduler, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "dopo-web")]
#[command(about = "Radio Dopo site service", long_about = None)]
#[command(version)]
struct Args {
    /// Path to config.toml (default: ~/.config/dopo/config.toml, then /etc/dopo/config.toml)
    #[arg(short, long, env = "DOPO_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:5780
    #[arg(short, long)]
    bind: Option<String>,

    /// Public site origin used in links, sitemap and purge URLs
    #[arg(long)]
    site_url: Option<String>,

    /// Log filter (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Do not run the daily reminder trigger in this process
    #[arg(long)]
    no_scheduler: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing starts, since it names the log level
    let loaded = TomlConfig::discover(args.config.as_deref());

    let cli = CliOverrides {
        bind_addr: args.bind.clone(),
        site_url: args.site_url.clone(),
        log_level: args.log_level.clone(),
        disable_scheduler: args.no_scheduler,
    };
    let (config_path, toml) = match &loaded {
        Ok(Some((path, toml))) => (Some(path.clone()), toml.clone()),
        _ => (None, TomlConfig::default()),
    };
    let config = SiteConfig::from_environment(&cli, &toml);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    // Build identification first, before any network activity
    let build = BuildInfo::CURRENT;
    info!(
        "Starting Radio Dopo site service (dopo-web) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        build.commit,
        build.built,
        build.profile
    );

    match (&loaded, &config_path) {
        (Ok(_), Some(path)) => info!("Config file: {}", path.display()),
        (Ok(_), None) => info!("No config file found, using environment and defaults"),
        (Err(e), _) => {
            if args.config.is_some() {
                return Err(anyhow::anyhow!("Failed to load config: {}", e));
            }
            warn!("Ignoring unreadable config file: {}", e);
        }
    }

    info!("Site URL: {}", config.site_url);
    info!("CMS: {}", config.cms_url);
    if config.mail.credentials.is_none() {
        warn!("Mailjet credentials not configured, reminder emails will fail");
    }
    if config.cloudflare.is_none() || config.webhook_secret.is_none() {
        warn!("Cache purge webhook not configured");
    }
    if config.calendar.is_none() {
        warn!("Calendar not configured, /api/schedule will fail");
    }

    let bind_addr = config.bind_addr.clone();
    let scheduler_enabled = config.scheduler_enabled;

    let state = AppState::from_config(config).context("Failed to build service clients")?;

    if scheduler_enabled {
        scheduler::spawn_daily_reminders(Arc::clone(&state.config));
        info!("Daily reminder trigger at {:02}:00 UTC", state.config.reminder_hour_utc);
    } else {
        info!("Daily reminder trigger disabled");
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("dopo-web listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
