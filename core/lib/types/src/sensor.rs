use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static SENSOR_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(JOY|TEMP|HUM|PRESS)\d{3}$").expect("static regex"));

/// Kind of a sensor, derived from the alphabetic prefix of its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorKind {
    #[serde(rename = "joystick")]
    Joystick,
    #[serde(rename = "temperatura")]
    Temperature,
    #[serde(rename = "umidita")]
    Humidity,
    #[serde(rename = "pressione")]
    Pressure,
    #[serde(rename = "generico")]
    Generic,
}

impl SensorKind {
    /// Derives the kind from the sensor id prefix (the alphabetic part of
    /// the first four characters).
    pub fn from_sensor_id(sensor_id: &str) -> Self {
        let prefix: String = sensor_id
            .chars()
            .take(4)
            .filter(|c| c.is_ascii_alphabetic())
            .collect();
        match prefix.as_str() {
            "JOY" => SensorKind::Joystick,
            "TEMP" => SensorKind::Temperature,
            "HUM" => SensorKind::Humidity,
            "PRESS" | "PRES" => SensorKind::Pressure,
            _ => SensorKind::Generic,
        }
    }

    /// Parses a stored kind string; anything unrecognized reads back as
    /// generic rather than failing the row.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "joystick" => SensorKind::Joystick,
            "temperatura" => SensorKind::Temperature,
            "umidita" => SensorKind::Humidity,
            "pressione" => SensorKind::Pressure,
            _ => SensorKind::Generic,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SensorKind::Joystick => "joystick",
            SensorKind::Temperature => "temperatura",
            SensorKind::Humidity => "umidita",
            SensorKind::Pressure => "pressione",
            SensorKind::Generic => "generico",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("sensor id {0:?} does not match the expected format (e.g. JOY001, TEMP042)")]
pub struct InvalidSensorId(pub String);

/// Uppercases and validates a raw sensor id against
/// `^(JOY|TEMP|HUM|PRESS)\d{3}$`.
pub fn normalize_sensor_id(raw: &str) -> Result<String, InvalidSensorId> {
    let id = raw.trim().to_ascii_uppercase();
    if SENSOR_ID_RE.is_match(&id) {
        Ok(id)
    } else {
        Err(InvalidSensorId(raw.to_string()))
    }
}

/// A sensor as stored by the producer and the cloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sensor {
    pub sensor_id: String,
    pub kind: SensorKind,
    pub description: String,
    pub ack: bool,
}

/// Wire form of a sensor registration, used on both `/sensori` endpoints.
///
/// `tipo` is optional in the request; the stored kind is always derived
/// from the id so a client cannot mislabel a sensor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorPayload {
    #[serde(rename = "id_sensore")]
    pub sensor_id: String,
    #[serde(rename = "descrizione")]
    pub description: String,
    #[serde(rename = "tipo", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SensorKind>,
}

impl From<&Sensor> for SensorPayload {
    fn from(sensor: &Sensor) -> Self {
        SensorPayload {
            sensor_id: sensor.sensor_id.clone(),
            description: sensor.description.clone(),
            kind: Some(sensor.kind),
        }
    }
}
