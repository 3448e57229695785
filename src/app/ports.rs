//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Evaluator / Routines / Water monitor
//! ```
//!
//! Driven adapters (HTTP gateway, key-value storage, clock, UI reporting)
//! implement these traits.  The domain core consumes them via generics,
//! so it never touches the network, the filesystem or a UI framework.
//!
//! All ports take `&self`: the core runs on a single-threaded executor
//! and adapters that need mutation use interior mutability.

use std::rc::Rc;

use chrono::NaiveDateTime;

use crate::schedule::ScheduleEntry;

// ───────────────────────────────────────────────────────────────
// Schedule source (driven adapter: remote API → domain)
// ───────────────────────────────────────────────────────────────

/// Read-only view of the remote schedule records.
pub trait ScheduleSource {
    /// Fetch every schedule configured for `user_id`.
    async fn fetch_schedules(&self, user_id: u32) -> Result<Vec<ScheduleEntry>, GatewayError>;
}

// ───────────────────────────────────────────────────────────────
// Sensor / actuator gateway (driven adapter: domain ↔ hardware)
// ───────────────────────────────────────────────────────────────

/// The fixed set of sensors exposed by the dispenser controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorId {
    /// Food bowl load cell.
    WeightA,
    /// Water plate load cell.
    WeightB,
    /// Food hopper ultrasonic distance.
    DistanceA,
    /// Water tank ultrasonic distance.
    DistanceB,
}

impl SensorId {
    pub const ALL: [SensorId; 4] = [
        SensorId::WeightA,
        SensorId::WeightB,
        SensorId::DistanceA,
        SensorId::DistanceB,
    ];

    /// Name used on the wire (`?sensor=` query and response key).
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::WeightA => "PESO_A",
            Self::WeightB => "PESO_B",
            Self::DistanceA => "DISTANCIA_A",
            Self::DistanceB => "DISTANCIA_B",
        }
    }
}

impl core::fmt::Display for SensorId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Single-shot request/response access to sensors and actuators.
///
/// Implementations never retry; the next poll cycle is the retry.
pub trait SensorGateway {
    /// Read one sensor.  Weights are grams, distances centimetres.
    async fn read_sensor(&self, sensor: SensorId) -> Result<f32, GatewayError>;

    /// Run the food motor once.  Returns the controller's message.
    async fn activate_motor(&self) -> Result<String, GatewayError>;

    /// Run the water pump once.  Returns the controller's message.
    async fn activate_pump(&self) -> Result<String, GatewayError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ device-local storage)
// ───────────────────────────────────────────────────────────────

/// Persistent string key-value storage.
///
/// Keys are flat (`executed_schedules_today`, `water_monitor_status`, …);
/// values are UTF-8 text, JSON where structured.
pub trait StoragePort {
    /// Read a value.  `Ok(None)` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Wall-clock source.  The returned value is already expressed in the
/// zone whose midnight rolls the execution ledger over.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

// ───────────────────────────────────────────────────────────────
// Reporter port (driven adapter: domain → UI feedback)
// ───────────────────────────────────────────────────────────────

/// Message category passed to [`Reporter::on_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Error,
}

/// User-facing feedback channel.  The core has no UI; callers inject
/// one of these to surface progress and outcomes.
pub trait Reporter {
    fn on_message(&self, text: &str);
    fn on_status(&self, kind: MessageKind);
    fn on_busy(&self, busy: bool);
}

/// Reporter that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn on_message(&self, _text: &str) {}
    fn on_status(&self, _kind: MessageKind) {}
    fn on_busy(&self, _busy: bool) {}
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn on_message(&self, text: &str) {
        (**self).on_message(text);
    }
    fn on_status(&self, kind: MessageKind) {
        (**self).on_status(kind);
    }
    fn on_busy(&self, busy: bool) {
        (**self).on_busy(busy);
    }
}

impl<R: Reporter + ?Sized> Reporter for Rc<R> {
    fn on_message(&self, text: &str) {
        (**self).on_message(text);
    }
    fn on_status(&self, kind: MessageKind) {
        (**self).on_status(kind);
    }
    fn on_busy(&self, busy: bool) {
        (**self).on_busy(busy);
    }
}

// ───────────────────────────────────────────────────────────────
// Shared handles
// ───────────────────────────────────────────────────────────────
//
// The evaluator, the routines and the water monitor each own their
// ports; sharing one adapter between them goes through `Rc`.

impl<T: ScheduleSource> ScheduleSource for Rc<T> {
    async fn fetch_schedules(&self, user_id: u32) -> Result<Vec<ScheduleEntry>, GatewayError> {
        (**self).fetch_schedules(user_id).await
    }
}

impl<T: SensorGateway> SensorGateway for Rc<T> {
    async fn read_sensor(&self, sensor: SensorId) -> Result<f32, GatewayError> {
        (**self).read_sensor(sensor).await
    }
    async fn activate_motor(&self) -> Result<String, GatewayError> {
        (**self).activate_motor().await
    }
    async fn activate_pump(&self) -> Result<String, GatewayError> {
        (**self).activate_pump().await
    }
}

impl<T: StoragePort + ?Sized> StoragePort for Rc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

impl<T: Clock + ?Sized> Clock for Rc<T> {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ScheduleSource`] and [`SensorGateway`] calls.
///
/// Every variant is a transient failure from the core's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The request exceeded the client timeout.
    Timeout,
    /// The server could not be reached.
    Connect(String),
    /// The server answered with a non-success HTTP status.
    Status(u16),
    /// The body could not be decoded into the expected shape.
    Malformed(String),
    /// The body decoded but lacked a required field.
    MissingField(&'static str),
    /// The call succeeded but returned nothing usable.
    EmptyResponse,
    /// Any other transport-level failure.
    Transport(String),
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Generic I/O error from the backend.
    Io(String),
    /// The backend is not available (e.g. directory missing, store closed).
    Unavailable,
}

impl core::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Timeout => write!(f, "request timed out"),
            Self::Connect(msg) => write!(f, "connection failed: {}", msg),
            Self::Status(code) => write!(f, "HTTP status {}", code),
            Self::Malformed(msg) => write!(f, "malformed response: {}", msg),
            Self::MissingField(field) => write!(f, "response missing '{}'", field),
            Self::EmptyResponse => write!(f, "empty response"),
            Self::Transport(msg) => write!(f, "transport error: {}", msg),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
            Self::Unavailable => write!(f, "storage unavailable"),
        }
    }
}

impl std::error::Error for GatewayError {}
impl std::error::Error for StorageError {}
