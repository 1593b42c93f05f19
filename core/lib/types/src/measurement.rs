use serde::Deserialize;
use serde_json::{Map, Value};

/// A measurement as submitted to `POST /misurazioni`, discriminated by
/// the `tipo` field of the request body.
///
/// Only the shape of the resulting `data` map survives past the ingress
/// boundary; the variant exists to validate the incoming JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "tipo", rename_all = "lowercase")]
pub enum IngressMeasurement {
    Joystick {
        #[serde(rename = "id_sensore")]
        sensor_id: String,
        x: f64,
        y: f64,
        pressed: bool,
    },
    Temperatura {
        #[serde(rename = "id_sensore")]
        sensor_id: String,
        valore: f64,
    },
    Umidita {
        #[serde(rename = "id_sensore")]
        sensor_id: String,
        valore: f64,
    },
    Pressione {
        #[serde(rename = "id_sensore")]
        sensor_id: String,
        valore: f64,
    },
}

impl IngressMeasurement {
    pub fn sensor_id(&self) -> &str {
        match self {
            IngressMeasurement::Joystick { sensor_id, .. }
            | IngressMeasurement::Temperatura { sensor_id, .. }
            | IngressMeasurement::Umidita { sensor_id, .. }
            | IngressMeasurement::Pressione { sensor_id, .. } => sensor_id,
        }
    }

    /// Extracts the measured values, dropping the metadata fields and
    /// normalizing every float. The result is what gets persisted and,
    /// later, hashed.
    pub fn into_data_map(self) -> Map<String, Value> {
        let mut data = Map::new();
        match self {
            IngressMeasurement::Joystick { x, y, pressed, .. } => {
                data.insert("x".to_string(), normalize_float(x));
                data.insert("y".to_string(), normalize_float(y));
                data.insert("pressed".to_string(), Value::Bool(pressed));
            }
            IngressMeasurement::Temperatura { valore, .. }
            | IngressMeasurement::Umidita { valore, .. }
            | IngressMeasurement::Pressione { valore, .. } => {
                data.insert("valore".to_string(), normalize_float(valore));
            }
        }
        data
    }
}

/// Normalizes a float before persistence: any value whose absolute value
/// equals zero collapses to the integer 0, everything else is rounded to
/// 6 decimal places. Applied before canonicalization so every platform
/// hashes identical bytes.
pub fn normalize_float(value: f64) -> Value {
    if value == 0.0 {
        return Value::from(0_i64);
    }
    let rounded = (value * 1e6).round() / 1e6;
    serde_json::Number::from_f64(rounded)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
