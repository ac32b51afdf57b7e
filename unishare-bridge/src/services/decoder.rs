use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use crate::errors::BridgeError;

/// The reading kinds the devices publish. Anything outside this set is
/// rejected at classification time rather than written with an undefined type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingKind {
    Temperature,
    ApparentTemperature,
    Humidity,
    Rssi,
    Light,
    Flame,
}

/// Expected wire type of the `value` field, keyed by reading kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Float,
    Integer,
    Boolean,
}

impl ReadingKind {
    pub fn wire_type(self) -> WireType {
        match self {
            Self::Temperature | Self::ApparentTemperature | Self::Humidity => WireType::Float,
            Self::Rssi => WireType::Integer,
            Self::Light | Self::Flame => WireType::Boolean,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::ApparentTemperature => "apparent_temperature",
            Self::Humidity => "humidity",
            Self::Rssi => "rssi",
            Self::Light => "light",
            Self::Flame => "flame",
        }
    }
}

impl FromStr for ReadingKind {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temperature" => Ok(Self::Temperature),
            "apparent_temperature" => Ok(Self::ApparentTemperature),
            "humidity" => Ok(Self::Humidity),
            "rssi" => Ok(Self::Rssi),
            "light" => Ok(Self::Light),
            "flame" => Ok(Self::Flame),
            other => Err(BridgeError::UnsupportedReadingKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReadingValue {
    Float(f64),
    Integer(i64),
    Boolean(bool),
}

/// Registration body. Older firmware publishes upper-case field names on the
/// connect topic, the setup topic uses lower-case; both spellings are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterPayload {
    #[serde(alias = "MAC_ADDRESS")]
    pub mac_address: String,
    #[serde(alias = "NAME")]
    pub name: String,
    #[serde(rename = "type", alias = "TYPE")]
    pub device_type: String,
}

pub fn decode_registration(payload: &[u8]) -> Result<RegisterPayload, BridgeError> {
    serde_json::from_slice(payload).map_err(|e| BridgeError::MalformedPayload(e.to_string()))
}

/// Extract the `value` field and coerce it to the type the reading kind
/// declares. Numeric kinds also accept numbers sent as strings.
pub fn decode_reading(kind: ReadingKind, payload: &[u8]) -> Result<ReadingValue, BridgeError> {
    let body: Value = serde_json::from_slice(payload)
        .map_err(|e| BridgeError::MalformedPayload(e.to_string()))?;

    let value = body
        .get("value")
        .ok_or_else(|| BridgeError::MalformedPayload("missing field `value`".to_string()))?;

    coerce(kind.wire_type(), value).ok_or_else(|| {
        BridgeError::MalformedPayload(format!("cannot decode {value} as {}", kind.as_str()))
    })
}

fn coerce(wire_type: WireType, value: &Value) -> Option<ReadingValue> {
    match wire_type {
        WireType::Float => match value {
            Value::Number(n) => n.as_f64().map(ReadingValue::Float),
            Value::String(s) => s.trim().parse().ok().map(ReadingValue::Float),
            _ => None,
        },
        WireType::Integer => match value {
            Value::Number(n) => n.as_i64().map(ReadingValue::Integer),
            Value::String(s) => s.trim().parse().ok().map(ReadingValue::Integer),
            _ => None,
        },
        WireType::Boolean => match value {
            Value::Bool(b) => Some(ReadingValue::Boolean(*b)),
            Value::String(s) => s.trim().parse().ok().map(ReadingValue::Boolean),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_decodes_to_float() {
        let value = decode_reading(ReadingKind::Temperature, br#"{"value": 21.5}"#).unwrap();
        assert_eq!(value, ReadingValue::Float(21.5));
    }

    #[test]
    fn test_humidity_accepts_numeric_string() {
        let value = decode_reading(ReadingKind::Humidity, br#"{"value": "48.2"}"#).unwrap();
        assert_eq!(value, ReadingValue::Float(48.2));
    }

    #[test]
    fn test_non_numeric_string_is_rejected() {
        let result = decode_reading(ReadingKind::Temperature, br#"{"value": "warm"}"#);
        assert!(matches!(result, Err(BridgeError::MalformedPayload(_))));
    }

    #[test]
    fn test_rssi_decodes_to_integer() {
        let value = decode_reading(ReadingKind::Rssi, br#"{"value": "42"}"#).unwrap();
        assert_eq!(value, ReadingValue::Integer(42));

        let value = decode_reading(ReadingKind::Rssi, br#"{"value": -67}"#).unwrap();
        assert_eq!(value, ReadingValue::Integer(-67));
    }

    #[test]
    fn test_light_decodes_to_boolean() {
        let value = decode_reading(ReadingKind::Light, br#"{"value": true}"#).unwrap();
        assert_eq!(value, ReadingValue::Boolean(true));
    }

    #[test]
    fn test_flame_rejects_numeric_value() {
        let result = decode_reading(ReadingKind::Flame, br#"{"value": 1}"#);
        assert!(matches!(result, Err(BridgeError::MalformedPayload(_))));
    }

    #[test]
    fn test_missing_value_field_is_rejected() {
        let result = decode_reading(ReadingKind::Temperature, br#"{"reading": 21.5}"#);
        assert!(matches!(result, Err(BridgeError::MalformedPayload(_))));
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        let result = decode_reading(ReadingKind::Temperature, b"not json");
        assert!(matches!(result, Err(BridgeError::MalformedPayload(_))));
    }

    #[test]
    fn test_registration_accepts_both_spellings() {
        let lower =
            decode_registration(br#"{"mac_address":"AA:BB","name":"Kitchen","type":"sensor"}"#)
                .unwrap();
        assert_eq!(lower.mac_address, "AA:BB");
        assert_eq!(lower.name, "Kitchen");
        assert_eq!(lower.device_type, "sensor");

        let upper =
            decode_registration(br#"{"MAC_ADDRESS":"AA:BB","NAME":"Kitchen","TYPE":"sensor"}"#)
                .unwrap();
        assert_eq!(upper.mac_address, "AA:BB");
        assert_eq!(upper.device_type, "sensor");
    }

    #[test]
    fn test_registration_missing_field_is_rejected() {
        let result = decode_registration(br#"{"mac_address":"AA:BB"}"#);
        assert!(matches!(result, Err(BridgeError::MalformedPayload(_))));
    }
}
