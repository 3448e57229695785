//! PetFeeder runner: headless host for the dispatch engine.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │   HttpGateway        FileStore      SystemClock  LogReporter │
//! │   (Schedule+Sensor)  (Storage)      (Clock)      (Reporter)  │
//! │  ───────────────── Port Trait Boundary ──────────────────    │
//! │   ┌──────────────────────────────────────────────────────┐   │
//! │   │  FeederService                                       │   │
//! │   │  schedule-poll timer · water-monitor timer           │   │
//! │   └──────────────────────────────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `petfeeder [config.json]` (or `PETFEEDER_CONFIG`).  Runs until
//! Ctrl-C on a single-threaded runtime.

#![deny(unused_must_use)]

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use log::info;

use petfeeder::adapters::clock::SystemClock;
use petfeeder::adapters::file_store::FileStore;
use petfeeder::adapters::http::HttpGateway;
use petfeeder::adapters::log_reporter::LogReporter;
use petfeeder::app::ports::Reporter;
use petfeeder::app::service::FeederService;
use petfeeder::config::FeederConfig;

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("PetFeeder runner v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Config ─────────────────────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("PETFEEDER_CONFIG").ok())
        .map(PathBuf::from);
    let config = FeederConfig::load(config_path.as_deref()).context("loading configuration")?;
    info!(
        "api={} user={} poll={}s water={}s boundary={:?}",
        config.api_base_url,
        config.user_id,
        config.schedule_poll_interval_secs,
        config.water_check_interval_secs,
        config.day_boundary
    );

    // ── 3. Adapters ───────────────────────────────────────────
    let gateway = HttpGateway::from_config(&config).context("building HTTP client")?;
    let storage = FileStore::open(&config.storage_dir).context("opening storage directory")?;
    let clock = SystemClock::new(config.day_boundary);
    let reporter: Rc<dyn Reporter> = Rc::new(LogReporter::new("auto"));

    // ── 4. Run both pollers until Ctrl-C ──────────────────────
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building runtime")?;
    let local = tokio::task::LocalSet::new();

    local.block_on(&runtime, async move {
        let mut service = FeederService::new(config, gateway, storage, clock, reporter);
        service.start_schedule_polling();
        service.start_water_monitor();

        tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
        info!("shutdown requested");
        service.drain().await;
        Ok::<(), anyhow::Error>(())
    })
}
