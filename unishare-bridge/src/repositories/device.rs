use std::sync::Arc;

use sqlx::Error;

use crate::configs::Storage;
use crate::models::Device;

/// Result of a registration upsert. `Changed` means the roster derived from the
/// registry differs from before the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Changed,
    Unchanged,
}

pub struct DeviceRepository {
    storage: Arc<Storage>,
}

impl DeviceRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}

impl DeviceRepository {
    pub async fn exists(&self, mac_address: &str) -> Result<bool, Error> {
        let found: Option<(String,)> =
            sqlx::query_as("SELECT mac_address FROM devices WHERE mac_address = $1")
                .bind(mac_address)
                .fetch_optional(self.storage.get_pool())
                .await?;

        Ok(found.is_some())
    }

    pub async fn find_by_mac(&self, mac_address: &str) -> Result<Option<Device>, Error> {
        let device: Option<Device> = sqlx::query_as("SELECT * FROM devices WHERE mac_address = $1")
            .bind(mac_address)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(device)
    }

    /// Insert a previously unseen device, or update the display name of a known
    /// one. Repeating the call with identical arguments is a no-op reported as
    /// `Unchanged`; it never creates a duplicate row.
    pub async fn upsert(
        &self,
        mac_address: &str,
        name: &str,
        device_type: &str,
    ) -> Result<UpsertOutcome, Error> {
        match self.find_by_mac(mac_address).await? {
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO devices (mac_address, name, device_type, connected)
                    VALUES ($1, $2, $3, TRUE)
                    "#,
                )
                .bind(mac_address)
                .bind(name)
                .bind(device_type)
                .execute(self.storage.get_pool())
                .await?;

                Ok(UpsertOutcome::Changed)
            }
            Some(device) if device.name == name => Ok(UpsertOutcome::Unchanged),
            Some(_) => {
                sqlx::query("UPDATE devices SET name = $2 WHERE mac_address = $1")
                    .bind(mac_address)
                    .bind(name)
                    .execute(self.storage.get_pool())
                    .await?;

                Ok(UpsertOutcome::Changed)
            }
        }
    }

    /// Update the last-known connectivity flag. Unknown addresses are ignored.
    pub async fn set_status(&self, mac_address: &str, connected: bool) -> Result<(), Error> {
        sqlx::query("UPDATE devices SET connected = $2 WHERE mac_address = $1")
            .bind(mac_address)
            .bind(connected)
            .execute(self.storage.get_pool())
            .await?;

        Ok(())
    }

    pub async fn list_all(&self) -> Result<Vec<Device>, Error> {
        let devices: Vec<Device> = sqlx::query_as("SELECT * FROM devices")
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(devices)
    }

    pub async fn list_sensors(&self) -> Result<Vec<Device>, Error> {
        let devices: Vec<Device> =
            sqlx::query_as("SELECT * FROM devices WHERE LOWER(device_type) LIKE '%sensor%'")
                .fetch_all(self.storage.get_pool())
                .await?;

        Ok(devices)
    }
}
