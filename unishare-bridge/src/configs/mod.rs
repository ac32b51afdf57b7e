pub mod schema;
pub mod settings;
pub mod storage;

pub use schema::SchemaManager;
pub use settings::{Broker, Database, Influx, Settings};
pub use storage::Storage;
