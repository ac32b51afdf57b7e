use serde::{Deserialize, Serialize};

use super::Table;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Device {
    pub mac_address: String,
    pub name: String,
    pub device_type: String,
    pub connected: bool,
}

#[derive(Clone)]
pub struct DeviceTable;

impl Table for DeviceTable {
    fn name(&self) -> &'static str {
        "devices"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS devices (
                mac_address VARCHAR(17) PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                device_type VARCHAR(64) NOT NULL,
                connected BOOLEAN NOT NULL DEFAULT TRUE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS devices;")
    }
}
