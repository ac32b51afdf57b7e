use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::Client;
use serde_json::{Value, json};

use crate::configs::settings::Influx;
use crate::errors::BridgeError;
use crate::services::decoder::{ReadingKind, ReadingValue};

/// Writes typed readings to InfluxDB v2 over its HTTP API, one Line Protocol
/// point per call: measurement = device address, field key = reading kind.
pub struct TelemetrySink {
    http: Client,
    url: String,
    org: String,
    bucket: String,
    token: String,
}

impl TelemetrySink {
    pub fn new(influx: Influx) -> Self {
        Self {
            http: Client::new(),
            url: influx.url.trim_end_matches('/').to_string(),
            org: influx.org,
            bucket: influx.bucket,
            token: influx.token,
        }
    }

    /// Create the bucket if it does not exist yet. Called once at startup;
    /// repeating the call against unchanged state does nothing.
    pub async fn ensure_bucket(&self) -> Result<(), BridgeError> {
        let org_id = self.find_org_id().await?;

        let found: Value = self
            .http
            .get(format!("{}/api/v2/buckets", self.url))
            .header("Authorization", format!("Token {}", self.token))
            .query(&[("name", self.bucket.as_str()), ("orgID", org_id.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let missing = found
            .get("buckets")
            .and_then(Value::as_array)
            .map(|buckets| buckets.is_empty())
            .unwrap_or(true);

        if missing {
            self.http
                .post(format!("{}/api/v2/buckets", self.url))
                .header("Authorization", format!("Token {}", self.token))
                .json(&json!({ "orgID": org_id, "name": self.bucket }))
                .send()
                .await?
                .error_for_status()?;

            tracing::info!("created telemetry bucket {}", self.bucket);
        }

        Ok(())
    }

    async fn find_org_id(&self) -> Result<String, BridgeError> {
        let body: Value = self
            .http
            .get(format!("{}/api/v2/orgs", self.url))
            .header("Authorization", format!("Token {}", self.token))
            .query(&[("org", self.org.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        body.get("orgs")
            .and_then(Value::as_array)
            .and_then(|orgs| orgs.first())
            .and_then(|org| org.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BridgeError::OrganizationNotFound(self.org.clone()))
    }

    /// Write one point with the current timestamp. No batching, no retry; the
    /// caller logs a failure and drops the reading.
    pub async fn write(
        &self,
        mac_address: &str,
        kind: ReadingKind,
        value: &ReadingValue,
    ) -> Result<(), BridgeError> {
        let timestamp_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or_default();

        let line = render_line(mac_address, kind.as_str(), value, timestamp_ns);

        self.http
            .post(format!("{}/api/v2/write", self.url))
            .header("Authorization", format!("Token {}", self.token))
            .header("Content-Type", "text/plain; charset=utf-8")
            .query(&[
                ("org", self.org.as_str()),
                ("bucket", self.bucket.as_str()),
                ("precision", "ns"),
            ])
            .body(line)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

/// One point in InfluxDB v2 Line Protocol:
/// `measurement field=value timestamp_ns`.
fn render_line(measurement: &str, field: &str, value: &ReadingValue, timestamp_ns: u64) -> String {
    format!(
        "{} {}={} {}",
        escape_measurement(measurement),
        escape_field_key(field),
        line_value(value),
        timestamp_ns
    )
}

fn line_value(value: &ReadingValue) -> String {
    match value {
        ReadingValue::Float(v) => format!("{v}"),
        ReadingValue::Integer(v) => format!("{v}i"),
        ReadingValue::Boolean(v) => v.to_string(),
    }
}

// Line Protocol requires backslash-escaping in identifiers; measurements
// additionally tolerate '='.
fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

fn escape_field_key(s: &str) -> String {
    s.replace(',', "\\,").replace('=', "\\=").replace(' ', "\\ ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_float_point() {
        let line = render_line(
            "AA:BB:CC:DD:EE:FF",
            "temperature",
            &ReadingValue::Float(23.5),
            1_000_000_000,
        );
        assert_eq!(line, "AA:BB:CC:DD:EE:FF temperature=23.5 1000000000");
    }

    #[test]
    fn test_render_integer_point_has_suffix() {
        let line = render_line("AA:BB", "rssi", &ReadingValue::Integer(-67), 42);
        assert_eq!(line, "AA:BB rssi=-67i 42");
    }

    #[test]
    fn test_render_boolean_point() {
        let line = render_line("AA:BB", "flame", &ReadingValue::Boolean(true), 42);
        assert_eq!(line, "AA:BB flame=true 42");
    }

    #[test]
    fn test_render_escapes_special_characters() {
        let line = render_line(
            "my device",
            "field=key",
            &ReadingValue::Integer(1),
            7,
        );
        assert_eq!(line, "my\\ device field\\=key=1i 7");
    }
}
