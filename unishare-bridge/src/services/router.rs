use crate::errors::BridgeError;
use crate::services::decoder::ReadingKind;

pub const SETUP_TOPIC: &str = "unishare/devices/setup";
pub const CONNECT_TOPIC: &str = "unishare/devices/connect";
pub const GET_ALL_TOPIC: &str = "unishare/devices/get_all";
pub const SENSOR_TOPIC_PREFIX: &str = "unishare/sensors/";
pub const SENSOR_TOPIC_FILTER: &str = "unishare/sensors/#";

/// Closed classification of an inbound topic. All routing decisions go through
/// [`classify`]; dispatch matches on this enum only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageIntent {
    /// Registration on the setup topic, lower-case body fields.
    Setup,
    /// Device announce on the legacy connect topic, upper-case body fields.
    Connect,
    /// Request for the full device roster.
    RosterRequest,
    /// Sensor reading, address and kind taken from the topic segments.
    Reading {
        mac_address: String,
        kind: ReadingKind,
    },
    /// Topic outside the bridge's grammar, dropped without logging noise.
    Unrecognized,
}

pub fn classify(topic: &str) -> Result<MessageIntent, BridgeError> {
    match topic {
        SETUP_TOPIC => return Ok(MessageIntent::Setup),
        CONNECT_TOPIC => return Ok(MessageIntent::Connect),
        GET_ALL_TOPIC => return Ok(MessageIntent::RosterRequest),
        _ => {}
    }

    if let Some(rest) = topic.strip_prefix(SENSOR_TOPIC_PREFIX) {
        // unishare/sensors/<MAC>/<KIND>
        let mut segments = rest.split('/');
        let mac_address = segments.next().filter(|s| !s.is_empty());
        let kind = segments.next().filter(|s| !s.is_empty());

        return match (mac_address, kind) {
            (Some(mac_address), Some(kind)) => Ok(MessageIntent::Reading {
                mac_address: mac_address.to_string(),
                kind: kind.parse()?,
            }),
            _ => Err(BridgeError::MalformedTopic(topic.to_string())),
        };
    }

    Ok(MessageIntent::Unrecognized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_setup_topic() {
        assert_eq!(
            classify("unishare/devices/setup").unwrap(),
            MessageIntent::Setup
        );
    }

    #[test]
    fn test_classify_connect_topic() {
        assert_eq!(
            classify("unishare/devices/connect").unwrap(),
            MessageIntent::Connect
        );
    }

    #[test]
    fn test_classify_roster_request() {
        assert_eq!(
            classify("unishare/devices/get_all").unwrap(),
            MessageIntent::RosterRequest
        );
    }

    #[test]
    fn test_classify_sensor_reading() {
        assert_eq!(
            classify("unishare/sensors/AA:BB:CC:DD:EE:FF/temperature").unwrap(),
            MessageIntent::Reading {
                mac_address: "AA:BB:CC:DD:EE:FF".to_string(),
                kind: ReadingKind::Temperature,
            }
        );
    }

    #[test]
    fn test_sensor_topic_without_kind_is_malformed() {
        let result = classify("unishare/sensors/AA:BB");
        assert!(matches!(result, Err(BridgeError::MalformedTopic(_))));
    }

    #[test]
    fn test_sensor_topic_with_empty_segments_is_malformed() {
        let result = classify("unishare/sensors//temperature");
        assert!(matches!(result, Err(BridgeError::MalformedTopic(_))));
    }

    #[test]
    fn test_unknown_reading_kind_is_rejected() {
        let result = classify("unishare/sensors/AA:BB/pressure");
        assert!(matches!(
            result,
            Err(BridgeError::UnsupportedReadingKind(_))
        ));
    }

    #[test]
    fn test_foreign_topic_is_unrecognized() {
        assert_eq!(
            classify("unishare/test").unwrap(),
            MessageIntent::Unrecognized
        );
        assert_eq!(
            classify("zigbee2mqtt/bridge/state").unwrap(),
            MessageIntent::Unrecognized
        );
    }
}
