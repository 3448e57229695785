//! HTTP gateway adapter.
//!
//! Implements [`ScheduleSource`] and [`SensorGateway`] against the backend
//! REST API, which also proxies commands to the dispenser controller:
//!
//! | call | endpoint |
//! |---|---|
//! | schedules | `GET  /horarios/?usuario={id}` |
//! | sensor    | `GET  /esp32/read_sensor/?sensor={NAME}` → `{ NAME: value }` |
//! | motor     | `POST /esp32/activate_motor/` → `{ message }` |
//! | pump      | `POST /esp32/activate_pump/` → `{ message }` |
//!
//! Wire quirks (Spanish field names, numbers sent as strings, `HH:MM:SS`
//! times) are resolved here so the domain only sees typed values.

use std::time::Duration;

use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::app::ports::{GatewayError, ScheduleSource, SensorGateway, SensorId};
use crate::config::FeederConfig;
use crate::schedule::ScheduleEntry;

pub struct HttpGateway {
    base_url: String,
    http: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(map_reqwest)?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_config(config: &FeederConfig) -> Result<Self, GatewayError> {
        Self::new(config.api_base_url.clone(), config.request_timeout())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, GatewayError> {
        let resp = self
            .http
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(map_reqwest)?;
        Self::decode(resp).await
    }

    async fn post_json(&self, path: &str) -> Result<Value, GatewayError> {
        let resp = self
            .http
            .post(self.url(path))
            .send()
            .await
            .map_err(map_reqwest)?;
        Self::decode(resp).await
    }

    async fn decode(resp: reqwest::Response) -> Result<Value, GatewayError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(GatewayError::Status(status.as_u16()));
        }
        resp.json::<Value>().await.map_err(map_reqwest)
    }
}

fn map_reqwest(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else if e.is_connect() {
        GatewayError::Connect(e.to_string())
    } else if e.is_decode() {
        GatewayError::Malformed(e.to_string())
    } else if let Some(status) = e.status() {
        GatewayError::Status(status.as_u16())
    } else {
        GatewayError::Transport(e.to_string())
    }
}

impl ScheduleSource for HttpGateway {
    async fn fetch_schedules(&self, user_id: u32) -> Result<Vec<ScheduleEntry>, GatewayError> {
        let uid = user_id.to_string();
        let body = self.get_json("/horarios/", &[("usuario", &uid)]).await?;
        let entries = parse_schedules(body)?;
        debug!("HttpGateway: {} schedules for user {}", entries.len(), user_id);
        Ok(entries)
    }
}

impl SensorGateway for HttpGateway {
    async fn read_sensor(&self, sensor: SensorId) -> Result<f32, GatewayError> {
        let body = self
            .get_json("/esp32/read_sensor/", &[("sensor", sensor.wire_name())])
            .await?;
        parse_sensor_reading(sensor, &body)
    }

    async fn activate_motor(&self) -> Result<String, GatewayError> {
        let body = self.post_json("/esp32/activate_motor/").await?;
        parse_message(&body)
    }

    async fn activate_pump(&self) -> Result<String, GatewayError> {
        let body = self.post_json("/esp32/activate_pump/").await?;
        parse_message(&body)
    }
}

// ── Wire decoding ─────────────────────────────────────────────

#[derive(Deserialize)]
struct WireSchedule {
    id: u32,
    #[serde(default, alias = "mascota")]
    pet: Value,
    #[serde(default, alias = "dispensador")]
    dispenser: Value,
    #[serde(default, alias = "usuario")]
    owner: Value,
    #[serde(alias = "horarios", alias = "horas")]
    times: Vec<String>,
}

impl From<WireSchedule> for ScheduleEntry {
    fn from(w: WireSchedule) -> Self {
        Self {
            id: w.id,
            pet: opaque_ref(&w.pet),
            dispenser: opaque_ref(&w.dispenser),
            owner: opaque_ref(&w.owner),
            times: w.times.iter().map(|t| normalize_time(t)).collect(),
        }
    }
}

/// Foreign keys arrive as a number, a numeric string, a nested
/// `{ "id": .. }` object or `null`.  Anything unusable becomes `None`.
fn opaque_ref(v: &Value) -> Option<u32> {
    match v {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(map) => map.get("id").and_then(opaque_ref),
        _ => None,
    }
}

/// Drop a trailing `:SS` so times read `HH:MM`.
fn normalize_time(t: &str) -> String {
    let t = t.trim();
    match t.match_indices(':').nth(1) {
        Some((idx, _)) => t[..idx].to_string(),
        None => t.to_string(),
    }
}

/// Decode the schedule list.  A body that is not a JSON array is
/// rejected; a record that does not decode is skipped on its own.
pub fn parse_schedules(body: Value) -> Result<Vec<ScheduleEntry>, GatewayError> {
    let Value::Array(items) = body else {
        return Err(GatewayError::Malformed("schedule list is not an array".into()));
    };
    let total = items.len();
    let entries: Vec<ScheduleEntry> = items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| match serde_json::from_value::<WireSchedule>(item) {
            Ok(w) => Some(w.into()),
            Err(e) => {
                warn!("HttpGateway: skipping schedule record #{} ({})", idx, e);
                None
            }
        })
        .collect();
    if entries.len() < total {
        warn!("HttpGateway: kept {} of {} schedule records", entries.len(), total);
    }
    Ok(entries)
}

/// Extract `{ NAME: value }`, accepting a JSON number or a numeric string.
pub fn parse_sensor_reading(sensor: SensorId, body: &Value) -> Result<f32, GatewayError> {
    let name = sensor.wire_name();
    let raw = body.get(name).ok_or(GatewayError::MissingField(name))?;
    let value = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Null => return Err(GatewayError::EmptyResponse),
        _ => None,
    };
    match value {
        Some(v) if v.is_finite() => Ok(v as f32),
        _ => Err(GatewayError::Malformed(format!("{} is not a number: {}", name, raw))),
    }
}

/// Extract `{ message }` from an actuator response.  An empty message
/// counts as [`GatewayError::EmptyResponse`].
pub fn parse_message(body: &Value) -> Result<String, GatewayError> {
    let msg = body
        .get("message")
        .ok_or(GatewayError::MissingField("message"))?;
    match msg {
        Value::Null => Err(GatewayError::EmptyResponse),
        Value::String(s) if s.trim().is_empty() => Err(GatewayError::EmptyResponse),
        Value::String(s) => Ok(s.trim().to_string()),
        other => Ok(other.to_string()),
    }
}
