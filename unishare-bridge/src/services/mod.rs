pub mod decoder;
pub mod ingest;
pub mod roster;
pub mod router;
pub mod telemetry_sink;

pub use decoder::{ReadingKind, ReadingValue, RegisterPayload};
pub use ingest::IngestService;
pub use roster::{RosterFilter, RosterPublisher};
pub use router::MessageIntent;
pub use telemetry_sink::TelemetrySink;
