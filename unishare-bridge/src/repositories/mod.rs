mod device;

pub use device::{DeviceRepository, UpsertOutcome};
