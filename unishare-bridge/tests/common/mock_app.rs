use std::sync::Arc;

use unishare_bridge::configs::schema::SchemaManager;
use unishare_bridge::configs::settings::Database;
use unishare_bridge::configs::storage::Storage;
use unishare_bridge::repositories::DeviceRepository;

pub struct MockApp {
    pub storage: Arc<Storage>,
    pub registry: Arc<DeviceRepository>,
}

impl MockApp {
    pub async fn new() -> Self {
        let storage = Arc::new(
            Storage::new(
                Database {
                    clean_start: true,
                    url: String::from("sqlite::memory:"),
                },
                SchemaManager::default(),
            )
            .await
            .unwrap(),
        );

        let registry = Arc::new(DeviceRepository::new(storage.clone()));

        Self { storage, registry }
    }

    pub async fn insert_test_device(&self, mac_address: &str, name: &str, device_type: &str) {
        sqlx::query(
            r#"
            INSERT INTO devices (mac_address, name, device_type, connected)
                VALUES ($1, $2, $3, TRUE);
            "#,
        )
        .bind(mac_address)
        .bind(name)
        .bind(device_type)
        .execute(self.storage.get_pool())
        .await
        .unwrap();
    }
}
