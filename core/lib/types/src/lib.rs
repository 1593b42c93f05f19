//! Data model shared by all three fogseal actors.
//!
//! Rust field names are English; the wire (and therefore the hashed
//! canonical form) keeps the Italian names the cloud contract uses, via
//! serde renames. Changing a rename changes every leaf hash, so the
//! names in this crate are part of the integrity protocol.

pub mod measurement;
pub mod payload;
pub mod sensor;

pub use measurement::IngressMeasurement;
pub use payload::{BatchJoinRow, BatchMeta, LeafSet, MeasurementRecord, Payload, PayloadError};
pub use sensor::{normalize_sensor_id, InvalidSensorId, Sensor, SensorKind, SensorPayload};
