//! Sensor readings and their boundary validation.
//!
//! [`RawReading`] is the untyped transport shape: every field is optional and
//! may arrive as a JSON string or number. [`RawReading::validate`] turns it
//! into a typed [`Reading`] or a [`ReadingError`] listing every bad field.
//!
//! Wire names follow the history service schema (`machine_id`,
//! `actuator_id`, `motor_*`), while the Rust field names describe the role.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FieldIssue, FieldProblem, ReadingError};

pub const FIELD_TS: &str = "ts";
pub const FIELD_ENTITY_ID: &str = "machine_id";
pub const FIELD_CHANNEL_ID: &str = "actuator_id";
pub const FIELD_TEMPERATURE: &str = "motor_temp_c";
pub const FIELD_SPEED: &str = "motor_rpm";
pub const FIELD_VIBRATION: &str = "motor_vibration_rms";

/// Every field a reading must carry, in wire order.
pub const REQUIRED_FIELDS: [&str; 6] = [
    FIELD_TS,
    FIELD_ENTITY_ID,
    FIELD_CHANNEL_ID,
    FIELD_TEMPERATURE,
    FIELD_SPEED,
    FIELD_VIBRATION,
];

/// One validated, timestamped observation of a single actuator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Source timestamp. Opaque to the core beyond display.
    pub ts: String,
    /// Physical unit, e.g. a robot arm.
    #[serde(rename = "machine_id")]
    pub entity_id: String,
    /// Sensor/actuator within the unit.
    #[serde(rename = "actuator_id")]
    pub channel_id: String,
    #[serde(rename = "motor_temp_c")]
    pub temperature_c: f64,
    #[serde(rename = "motor_rpm")]
    pub speed_rpm: f64,
    #[serde(rename = "motor_vibration_rms")]
    pub vibration_rms: f64,
}

impl Reading {
    /// The window this reading belongs to.
    pub fn key(&self) -> WindowKey {
        WindowKey::new(&self.entity_id, &self.channel_id)
    }
}

/// Composite key identifying one window: `(entity_id, channel_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowKey {
    pub entity_id: String,
    pub channel_id: String,
}

impl WindowKey {
    pub fn new(entity_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            channel_id: channel_id.into(),
        }
    }
}

/// Untyped reading as received from a transport or a source record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawReading {
    pub ts: Option<Value>,
    pub machine_id: Option<Value>,
    pub actuator_id: Option<Value>,
    pub motor_temp_c: Option<Value>,
    pub motor_rpm: Option<Value>,
    pub motor_vibration_rms: Option<Value>,
}

impl RawReading {
    /// Build a raw reading from text fields, e.g. one CSV row.
    ///
    /// `lookup` is called once per required wire field name.
    pub fn from_text<'a, F>(mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<&'a str>,
    {
        let mut text = |name: &str| lookup(name).map(|v| Value::String(v.to_string()));
        Self {
            ts: text(FIELD_TS),
            machine_id: text(FIELD_ENTITY_ID),
            actuator_id: text(FIELD_CHANNEL_ID),
            motor_temp_c: text(FIELD_TEMPERATURE),
            motor_rpm: text(FIELD_SPEED),
            motor_vibration_rms: text(FIELD_VIBRATION),
        }
    }

    /// Check presence and coerce types.
    ///
    /// Identifiers and the timestamp accept strings or numbers. Measurements
    /// accept numbers or numeric strings and must be finite.
    pub fn validate(&self) -> Result<Reading, ReadingError> {
        let mut issues = Vec::new();

        let ts = coerce_text(FIELD_TS, self.ts.as_ref(), false, &mut issues);
        let entity_id = coerce_text(FIELD_ENTITY_ID, self.machine_id.as_ref(), true, &mut issues);
        let channel_id =
            coerce_text(FIELD_CHANNEL_ID, self.actuator_id.as_ref(), true, &mut issues);
        let temperature_c = coerce_number(FIELD_TEMPERATURE, self.motor_temp_c.as_ref(), &mut issues);
        let speed_rpm = coerce_number(FIELD_SPEED, self.motor_rpm.as_ref(), &mut issues);
        let vibration_rms =
            coerce_number(FIELD_VIBRATION, self.motor_vibration_rms.as_ref(), &mut issues);

        match (ts, entity_id, channel_id, temperature_c, speed_rpm, vibration_rms) {
            (Some(ts), Some(entity_id), Some(channel_id), Some(t), Some(s), Some(v))
                if issues.is_empty() =>
            {
                Ok(Reading {
                    ts,
                    entity_id,
                    channel_id,
                    temperature_c: t,
                    speed_rpm: s,
                    vibration_rms: v,
                })
            }
            _ => Err(ReadingError { issues }),
        }
    }
}

impl From<&Reading> for RawReading {
    fn from(reading: &Reading) -> Self {
        Self {
            ts: Some(Value::String(reading.ts.clone())),
            machine_id: Some(Value::String(reading.entity_id.clone())),
            actuator_id: Some(Value::String(reading.channel_id.clone())),
            motor_temp_c: Some(Value::from(reading.temperature_c)),
            motor_rpm: Some(Value::from(reading.speed_rpm)),
            motor_vibration_rms: Some(Value::from(reading.vibration_rms)),
        }
    }
}

fn coerce_text(
    field: &'static str,
    value: Option<&Value>,
    reject_blank: bool,
    issues: &mut Vec<FieldIssue>,
) -> Option<String> {
    let problem = match value {
        None | Some(Value::Null) => FieldProblem::Missing,
        Some(Value::String(s)) if reject_blank && s.trim().is_empty() => FieldProblem::WrongType,
        Some(Value::String(s)) => return Some(s.clone()),
        Some(Value::Number(n)) => return Some(n.to_string()),
        Some(_) => FieldProblem::WrongType,
    };
    issues.push(FieldIssue { field, problem });
    None
}

fn coerce_number(
    field: &'static str,
    value: Option<&Value>,
    issues: &mut Vec<FieldIssue>,
) -> Option<f64> {
    let parsed = match value {
        None | Some(Value::Null) => Err(FieldProblem::Missing),
        Some(Value::Number(n)) => n.as_f64().ok_or(FieldProblem::NotNumeric),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| FieldProblem::NotNumeric),
        Some(_) => Err(FieldProblem::WrongType),
    };

    match parsed {
        Ok(n) if n.is_finite() => Some(n),
        Ok(_) => {
            issues.push(FieldIssue {
                field,
                problem: FieldProblem::NotFinite,
            });
            None
        }
        Err(problem) => {
            issues.push(FieldIssue { field, problem });
            None
        }
    }
}
