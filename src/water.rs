//! Water monitor: periodic plate-weight check with automatic refill.
//!
//! Independent of schedules and of the execution ledger.  Each poll:
//!
//! 1. Load [`WaterMonitorStatus`]; stop here if disabled (no sensor read).
//! 2. Read the water plate scale (`PESO_B`).
//! 3. Record `last_checked` / `last_weight` whatever the outcome.
//! 4. Below the threshold (strict `<`): run the water [`DispenseRoutine`]
//!    and stamp `last_dispense_time` on success.
//! 5. Persist the status.
//!
//! The threshold lives under its own key and survives status resets.

use std::rc::Rc;

use chrono::NaiveDateTime;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{Clock, Reporter, SensorGateway, StoragePort};
use crate::error::{self, Error, PersistenceError};
use crate::routine::{DispenseKind, DispenseRoutine};
use crate::scheduler::PollTimer;

/// Storage key of the monitor status record.
pub const STATUS_KEY: &str = "water_monitor_status";
/// Storage key of the refill threshold (stringified number, grams).
pub const THRESHOLD_KEY: &str = "water_threshold";
/// Threshold used when none is configured or persisted.
pub const DEFAULT_THRESHOLD_G: f32 = 100.0;

/// Persisted monitor state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterMonitorStatus {
    pub last_checked: Option<NaiveDateTime>,
    pub last_weight: Option<f32>,
    pub last_dispense_time: Option<NaiveDateTime>,
    pub enabled: bool,
}

impl Default for WaterMonitorStatus {
    fn default() -> Self {
        Self {
            last_checked: None,
            last_weight: None,
            last_dispense_time: None,
            enabled: true,
        }
    }
}

pub struct WaterMonitor<G, S, C> {
    routine: DispenseRoutine<G>,
    storage: S,
    clock: C,
    default_threshold: f32,
}

impl<G: SensorGateway, S: StoragePort, C: Clock> WaterMonitor<G, S, C> {
    pub fn new(routine: DispenseRoutine<G>, storage: S, clock: C) -> Self {
        Self {
            routine,
            storage,
            clock,
            default_threshold: DEFAULT_THRESHOLD_G,
        }
    }

    /// Threshold to fall back on when nothing valid is persisted.
    pub fn with_default_threshold(mut self, grams: f32) -> Self {
        if grams.is_finite() && grams > 0.0 {
            self.default_threshold = grams;
        }
        self
    }

    /// One poll.  Returns `true` only when water was dispensed.  Never fails.
    pub async fn check_and_dispense_if_needed(&self, reporter: &impl Reporter) -> bool {
        let mut status = self.status();
        if !status.enabled {
            debug!("WaterMonitor: disabled, skipping");
            return false;
        }
        let threshold = self.threshold();

        let reading = self
            .routine
            .gateway()
            .read_sensor(DispenseKind::Water.weight_sensor())
            .await;
        status.last_checked = Some(self.clock.now());

        let dispensed = match reading {
            Ok(weight) => {
                status.last_weight = Some(weight);
                if weight < threshold {
                    info!(
                        "WaterMonitor: plate at {:.1}g < {:.1}g, refilling",
                        weight, threshold
                    );
                    match self.routine.run(DispenseKind::Water, reporter).await {
                        Ok(_) => {
                            status.last_dispense_time = Some(self.clock.now());
                            true
                        }
                        Err(_) => false,
                    }
                } else {
                    debug!("WaterMonitor: plate at {:.1}g, ok", weight);
                    false
                }
            }
            Err(e) => {
                warn!("WaterMonitor: weight read failed ({})", e);
                status.last_weight = None;
                false
            }
        };

        // The toggle may have been flipped while this poll was suspended.
        status.enabled = self.status().enabled;
        if let Err(e) = self.save_status(&status) {
            warn!("WaterMonitor: status save failed ({}), continuing", e);
        }
        dispensed
    }

    /// Current status; defaults on missing or unreadable data.
    pub fn status(&self) -> WaterMonitorStatus {
        match self.try_status() {
            Ok(s) => s,
            Err(e) => {
                warn!("WaterMonitor: status load failed ({}), using defaults", e);
                WaterMonitorStatus::default()
            }
        }
    }

    pub fn try_status(&self) -> Result<WaterMonitorStatus, PersistenceError> {
        match self.storage.get(STATUS_KEY)? {
            Some(text) => Ok(serde_json::from_str(&text)?),
            None => Ok(WaterMonitorStatus::default()),
        }
    }

    fn save_status(&self, status: &WaterMonitorStatus) -> Result<(), PersistenceError> {
        let text = serde_json::to_string(status)?;
        self.storage.set(STATUS_KEY, &text)?;
        Ok(())
    }

    /// Enable or disable polling.  Persisted immediately.
    pub fn set_enabled(&self, enabled: bool) -> error::Result<()> {
        let mut status = self.status();
        status.enabled = enabled;
        self.save_status(&status)?;
        info!("WaterMonitor: {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    /// Refill threshold in grams.
    pub fn threshold(&self) -> f32 {
        match self.storage.get(THRESHOLD_KEY) {
            Ok(Some(text)) => match text.trim().parse::<f32>() {
                Ok(v) if v.is_finite() && v > 0.0 => v,
                _ => {
                    warn!("WaterMonitor: stored threshold {:?} invalid, using default", text);
                    self.default_threshold
                }
            },
            Ok(None) => self.default_threshold,
            Err(e) => {
                warn!("WaterMonitor: threshold load failed ({}), using default", e);
                self.default_threshold
            }
        }
    }

    /// Validate and persist a new threshold.
    pub fn set_threshold(&self, grams: f32) -> error::Result<()> {
        if !grams.is_finite() || grams <= 0.0 {
            return Err(Error::Validation("water threshold must be a positive number"));
        }
        self.storage.set(THRESHOLD_KEY, &grams.to_string())?;
        info!("WaterMonitor: threshold set to {:.1}g", grams);
        Ok(())
    }

    /// Parse user input (e.g. a settings form field) and persist it.
    pub fn set_threshold_str(&self, input: &str) -> error::Result<()> {
        let grams = input
            .trim()
            .parse::<f32>()
            .map_err(|_| Error::Validation("water threshold must be numeric"))?;
        self.set_threshold(grams)
    }
}

/// A [`WaterMonitor`] bound to its own [`PollTimer`].
pub struct WaterMonitorService<G, S, C> {
    monitor: Rc<WaterMonitor<G, S, C>>,
    reporter: Rc<dyn Reporter>,
    timer: PollTimer,
}

impl<G, S, C> WaterMonitorService<G, S, C>
where
    G: SensorGateway + 'static,
    S: StoragePort + 'static,
    C: Clock + 'static,
{
    pub fn new(
        monitor: WaterMonitor<G, S, C>,
        reporter: Rc<dyn Reporter>,
        period: std::time::Duration,
    ) -> Self {
        Self {
            monitor: Rc::new(monitor),
            reporter,
            timer: PollTimer::new("water-monitor", period),
        }
    }

    pub fn monitor(&self) -> &WaterMonitor<G, S, C> {
        &self.monitor
    }

    /// Start polling (immediate check, then every period).  No-op if running.
    pub fn start(&mut self) -> bool {
        let monitor = self.monitor.clone();
        let reporter = self.reporter.clone();
        self.timer.start(move || {
            let monitor = monitor.clone();
            let reporter = reporter.clone();
            async move {
                monitor.check_and_dispense_if_needed(&reporter).await;
            }
        })
    }

    pub fn stop(&mut self) -> bool {
        self.timer.stop()
    }

    /// Stop and wait for a check in progress to finish.
    pub async fn drain(&mut self) -> bool {
        self.timer.drain().await
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }
}
