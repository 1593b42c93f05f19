pub use self::{
    storage_batch::{NonElaborableBatch, StorageBatch},
    storage_sensor::StorageSensor,
};

mod storage_batch;
mod storage_sensor;
