#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("malformed topic: {0}")]
    MalformedTopic(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("unsupported reading kind: {0}")]
    UnsupportedReadingKind(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] sqlx::Error),

    #[error("telemetry store unavailable: {0}")]
    TelemetryUnavailable(#[from] reqwest::Error),

    #[error("organization not found: {0}")]
    OrganizationNotFound(String),

    #[error("transport error: {0}")]
    Transport(#[from] rumqttc::ClientError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
