use std::sync::Arc;

use rumqttc::{AsyncClient, QoS};
use serde::Serialize;

use crate::errors::BridgeError;
use crate::models::Device;
use crate::repositories::DeviceRepository;

pub const ALL_SENSORS_TOPIC: &str = "unishare/devices/all_sensors";
pub const ALL_DEVICES_TOPIC: &str = "unishare/devices/all_devices";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterFilter {
    All,
    SensorsOnly,
}

impl RosterFilter {
    pub fn topic(self) -> &'static str {
        match self {
            Self::All => ALL_DEVICES_TOPIC,
            Self::SensorsOnly => ALL_SENSORS_TOPIC,
        }
    }
}

// Field casing is consumed downstream as-is.
#[derive(Debug, Serialize)]
struct RosterEntry<'a> {
    #[serde(rename = "MAC_ADDRESS")]
    mac_address: &'a str,
    #[serde(rename = "NAME")]
    name: &'a str,
    #[serde(rename = "TYPE")]
    device_type: &'a str,
}

/// Serialize a roster snapshot. Pure function of its input, so identical
/// registry state always yields byte-identical output.
pub fn render(devices: &[Device]) -> Result<String, BridgeError> {
    let entries: Vec<RosterEntry> = devices
        .iter()
        .map(|device| RosterEntry {
            mac_address: &device.mac_address,
            name: &device.name,
            device_type: &device.device_type,
        })
        .collect();

    Ok(serde_json::to_string(&entries)?)
}

pub struct RosterPublisher {
    client: AsyncClient,
    registry: Arc<DeviceRepository>,
}

impl RosterPublisher {
    pub fn new(client: AsyncClient, registry: Arc<DeviceRepository>) -> Self {
        Self { client, registry }
    }

    /// Recompute the roster from the registry and publish it retained, so
    /// late-joining subscribers immediately see the last-known device list.
    pub async fn publish(&self, filter: RosterFilter) -> Result<(), BridgeError> {
        let devices = match filter {
            RosterFilter::All => self.registry.list_all().await?,
            RosterFilter::SensorsOnly => self.registry.list_sensors().await?,
        };

        let payload = render(&devices)?;

        tracing::debug!(topic = filter.topic(), devices = devices.len(), "publish roster");

        self.client
            .publish(filter.topic(), QoS::AtLeastOnce, true, payload)
            .await?;

        Ok(())
    }
}
