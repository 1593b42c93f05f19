use fogseal_types::{Sensor, SensorKind};

/// Representation of a `sensors` row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StorageSensor {
    pub sensor_id: String,
    pub kind: String,
    pub description: String,
    pub ack: bool,
}

impl From<StorageSensor> for Sensor {
    fn from(row: StorageSensor) -> Self {
        Sensor {
            kind: SensorKind::from_wire(&row.kind),
            sensor_id: row.sensor_id,
            description: row.description,
            ack: row.ack,
        }
    }
}
