//! Application service: the facade over the dispatch engine.
//!
//! [`FeederService`] wires one gateway, one store and one clock into the
//! evaluator, the manual routines and the water monitor, and owns the
//! two poll timers.  UI handlers and the headless runner talk only to it.
//!
//! ```text
//!                 ┌─────────────────────────────────────────┐
//!  ScheduleSource │              FeederService              │
//!  SensorGateway ─┤  DispatchEvaluator ── "schedule-poll"   │──▶ Reporter
//!  StoragePort    │  WaterMonitor      ── "water-monitor"   │
//!  Clock          │  DispenseRoutine (manual triggers)      │
//!                 └─────────────────────────────────────────┘
//! ```

use std::rc::Rc;

use log::{info, warn};

use crate::config::FeederConfig;
use crate::dispatch::DispatchEvaluator;
use crate::error::PersistenceError;
use crate::routine::{DispenseFailure, DispenseKind, DispenseReport, DispenseRoutine};
use crate::scheduler::PollTimer;
use crate::water::{WaterMonitor, WaterMonitorService};

use super::ports::{Clock, Reporter, ScheduleSource, SensorGateway, SensorId, StoragePort};

/// Best-effort reading of every sensor.  `None` where the read failed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LevelSnapshot {
    pub food_weight_g: Option<f32>,
    pub water_weight_g: Option<f32>,
    pub food_distance_cm: Option<f32>,
    pub water_distance_cm: Option<f32>,
}

type Evaluator<G, S> = DispatchEvaluator<Rc<G>, Rc<G>, Rc<S>>;

pub struct FeederService<G, S, C> {
    config: FeederConfig,
    gateway: Rc<G>,
    clock: Rc<C>,
    evaluator: Rc<Evaluator<G, S>>,
    manual: DispenseRoutine<Rc<G>>,
    water: WaterMonitorService<Rc<G>, Rc<S>, Rc<C>>,
    schedule_timer: PollTimer,
    background: Rc<dyn Reporter>,
}

impl<G, S, C> FeederService<G, S, C>
where
    G: ScheduleSource + SensorGateway + 'static,
    S: StoragePort + 'static,
    C: Clock + 'static,
{
    /// Build the service.  `background` receives feedback from timer-driven
    /// dispenses, where no caller is around to supply a reporter.
    pub fn new(
        config: FeederConfig,
        gateway: G,
        storage: S,
        clock: C,
        background: Rc<dyn Reporter>,
    ) -> Self {
        let gateway = Rc::new(gateway);
        let storage = Rc::new(storage);
        let clock = Rc::new(clock);
        let settle = config.settle_delay();

        let evaluator = DispatchEvaluator::new(
            gateway.clone(),
            DispenseRoutine::new(gateway.clone(), settle),
            storage.clone(),
        )
        .with_window(config.due_window_minutes);

        let monitor = WaterMonitor::new(
            DispenseRoutine::new(gateway.clone(), settle),
            storage,
            clock.clone(),
        )
        .with_default_threshold(config.water_threshold_g);

        Self {
            water: WaterMonitorService::new(
                monitor,
                background.clone(),
                config.water_check_interval(),
            ),
            schedule_timer: PollTimer::new("schedule-poll", config.schedule_poll_interval()),
            manual: DispenseRoutine::new(gateway.clone(), settle),
            evaluator: Rc::new(evaluator),
            gateway,
            clock,
            background,
            config,
        }
    }

    pub fn config(&self) -> &FeederConfig {
        &self.config
    }

    // ── Schedule dispatch ─────────────────────────────────────

    /// One schedule poll for the configured user at the current time.
    pub async fn poll_schedules(&self, reporter: &impl Reporter) -> bool {
        self.evaluator
            .evaluate(self.config.user_id, self.clock.now(), reporter)
            .await
    }

    /// Start polling schedules on the `schedule-poll` timer.  No-op if running.
    pub fn start_schedule_polling(&mut self) -> bool {
        let evaluator = self.evaluator.clone();
        let clock = self.clock.clone();
        let reporter = self.background.clone();
        let user_id = self.config.user_id;
        self.schedule_timer.start(move || {
            let evaluator = evaluator.clone();
            let clock = clock.clone();
            let reporter = reporter.clone();
            async move {
                evaluator.evaluate(user_id, clock.now(), &reporter).await;
            }
        })
    }

    pub fn stop_schedule_polling(&mut self) -> bool {
        self.schedule_timer.stop()
    }

    pub fn is_schedule_polling(&self) -> bool {
        self.schedule_timer.is_running()
    }

    /// Slots already executed today.
    pub fn executed_today(&self) -> Vec<String> {
        self.evaluator.executed_on(self.clock.now().date())
    }

    pub fn clear_ledger(&self) -> Result<(), PersistenceError> {
        info!("FeederService: clearing execution ledger");
        self.evaluator.clear_ledger()
    }

    // ── Manual triggers ───────────────────────────────────────

    pub async fn dispense_food(
        &self,
        reporter: &impl Reporter,
    ) -> Result<DispenseReport, DispenseFailure> {
        self.manual.run(DispenseKind::Food, reporter).await
    }

    pub async fn dispense_water(
        &self,
        reporter: &impl Reporter,
    ) -> Result<DispenseReport, DispenseFailure> {
        self.manual.run(DispenseKind::Water, reporter).await
    }

    /// Read all four sensors one after another.
    pub async fn read_levels(&self) -> LevelSnapshot {
        let mut snap = LevelSnapshot::default();
        for sensor in SensorId::ALL {
            let value = match self.gateway.read_sensor(sensor).await {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("FeederService: {} read failed ({})", sensor, e);
                    None
                }
            };
            match sensor {
                SensorId::WeightA => snap.food_weight_g = value,
                SensorId::WeightB => snap.water_weight_g = value,
                SensorId::DistanceA => snap.food_distance_cm = value,
                SensorId::DistanceB => snap.water_distance_cm = value,
            }
        }
        snap
    }

    // ── Water monitor ─────────────────────────────────────────

    pub fn water_monitor(&self) -> &WaterMonitor<Rc<G>, Rc<S>, Rc<C>> {
        self.water.monitor()
    }

    pub async fn check_water(&self, reporter: &impl Reporter) -> bool {
        self.water
            .monitor()
            .check_and_dispense_if_needed(reporter)
            .await
    }

    pub fn start_water_monitor(&mut self) -> bool {
        self.water.start()
    }

    pub fn stop_water_monitor(&mut self) -> bool {
        self.water.stop()
    }

    pub fn is_water_monitoring(&self) -> bool {
        self.water.is_running()
    }

    /// Stop both timers.  Jobs already running finish in the background.
    pub fn shutdown(&mut self) {
        self.stop_schedule_polling();
        self.stop_water_monitor();
    }

    /// Stop both timers and wait until any dispense in progress completes.
    pub async fn drain(&mut self) {
        self.schedule_timer.drain().await;
        self.water.drain().await;
    }
}
