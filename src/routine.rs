//! Dispense routines: the staged actuation sequence shared by food and water.
//!
//! ```text
//!   Activate (motor | pump) ──▶ settle ──▶ ReadWeight ──▶ settle ──▶ ReadDistance ──▶ Done
//!          │                                  │                          │
//!          └──────────── any failure aborts the remaining stages ───────┘
//! ```
//!
//! The sequence is strictly linear: gateway calls are awaited one at a
//! time, so the controller always sees motor/pump before the weight read
//! and the weight read before the distance read.  The settle wait is a
//! one-shot delay for the hardware, not a retry.
//!
//! The routine behaves identically for manual and scheduled triggers.
//! All user feedback goes through the injected [`Reporter`].

use core::fmt;
use std::time::Duration;

use log::{info, warn};

use crate::app::ports::{GatewayError, MessageKind, Reporter, SensorGateway, SensorId};

/// What is being dispensed.  Selects the actuator and the sensor pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispenseKind {
    /// Motor-driven food auger; bowl scale A, hopper distance A.
    Food,
    /// Water pump; plate scale B, tank distance B.
    Water,
}

impl DispenseKind {
    pub const fn weight_sensor(self) -> SensorId {
        match self {
            Self::Food => SensorId::WeightA,
            Self::Water => SensorId::WeightB,
        }
    }

    pub const fn distance_sensor(self) -> SensorId {
        match self {
            Self::Food => SensorId::DistanceA,
            Self::Water => SensorId::DistanceB,
        }
    }

    const fn activation_stage(self) -> Stage {
        match self {
            Self::Food => Stage::ActivateMotor,
            Self::Water => Stage::ActivatePump,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Water => "Water",
        }
    }
}

/// One step of the routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ActivateMotor,
    ActivatePump,
    ReadWeight,
    ReadDistance,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ActivateMotor => write!(f, "motor activation"),
            Self::ActivatePump => write!(f, "pump activation"),
            Self::ReadWeight => write!(f, "weight reading"),
            Self::ReadDistance => write!(f, "distance reading"),
        }
    }
}

/// Outcome of a completed routine.
#[derive(Debug, Clone, PartialEq)]
pub struct DispenseReport {
    pub kind: DispenseKind,
    /// Message returned by the controller when the actuator ran.
    pub activation_message: String,
    /// Scale reading after dispensing, grams.
    pub weight_g: f32,
    /// Reservoir distance reading, centimetres.  Callers use it as a fill-level proxy.
    pub distance_cm: f32,
}

/// The first stage that failed, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispenseFailure {
    pub kind: DispenseKind,
    pub stage: Stage,
    pub error: GatewayError,
}

impl fmt::Display for DispenseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} dispense failed at {}: {}",
            self.kind.label(),
            self.stage,
            self.error
        )
    }
}

impl std::error::Error for DispenseFailure {}

/// Runs the staged sequence against a [`SensorGateway`].
pub struct DispenseRoutine<G> {
    gateway: G,
    settle: Duration,
}

impl<G: SensorGateway> DispenseRoutine<G> {
    pub fn new(gateway: G, settle: Duration) -> Self {
        Self { gateway, settle }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Run the routine, reporting progress and outcome through `reporter`.
    pub async fn run(
        &self,
        kind: DispenseKind,
        reporter: &impl Reporter,
    ) -> Result<DispenseReport, DispenseFailure> {
        reporter.on_busy(true);
        reporter.on_status(MessageKind::Info);
        reporter.on_message(&format!("{} dispense in progress", kind.label()));

        let result = self.execute(kind).await;

        match &result {
            Ok(r) => {
                info!(
                    "Routine: {:?} done ({}), weight={:.1}g distance={:.1}cm",
                    kind, r.activation_message, r.weight_g, r.distance_cm
                );
                reporter.on_status(MessageKind::Success);
                reporter.on_message(&format!(
                    "{} dispensed: {}. Weight {:.1} g, level {:.1} cm",
                    kind.label(),
                    r.activation_message,
                    r.weight_g,
                    r.distance_cm
                ));
            }
            Err(failure) => {
                warn!("Routine: {}", failure);
                reporter.on_status(MessageKind::Error);
                reporter.on_message(&failure.to_string());
            }
        }
        reporter.on_busy(false);
        result
    }

    async fn execute(&self, kind: DispenseKind) -> Result<DispenseReport, DispenseFailure> {
        let fail = |stage: Stage| {
            move |error: GatewayError| DispenseFailure { kind, stage, error }
        };

        let activation_stage = kind.activation_stage();
        let activation = match kind {
            DispenseKind::Food => self.gateway.activate_motor().await,
            DispenseKind::Water => self.gateway.activate_pump().await,
        }
        .map_err(fail(activation_stage))?;
        if activation.trim().is_empty() {
            return Err(fail(activation_stage)(GatewayError::EmptyResponse));
        }

        self.settle().await;
        let weight_g = self
            .gateway
            .read_sensor(kind.weight_sensor())
            .await
            .map_err(fail(Stage::ReadWeight))?;

        self.settle().await;
        let distance_cm = self
            .gateway
            .read_sensor(kind.distance_sensor())
            .await
            .map_err(fail(Stage::ReadDistance))?;

        Ok(DispenseReport {
            kind,
            activation_message: activation,
            weight_g,
            distance_cm,
        })
    }

    async fn settle(&self) {
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
    }
}
