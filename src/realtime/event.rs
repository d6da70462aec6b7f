//! Inbound frames and the events they become.

use serde::Deserialize;
use thiserror::Error;

use super::lifecycle::ChannelState;

/// Where an update came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOrigin {
    /// Written through the REST API (no `source` field)
    Direct,
    /// Published by a device over MQTT
    Mqtt,
    /// Any other `source` value
    Other(String),
}

impl UpdateOrigin {
    fn from_source(source: Option<String>) -> Self {
        match source.as_deref() {
            None | Some("") | Some("api") => UpdateOrigin::Direct,
            Some("mqtt") => UpdateOrigin::Mqtt,
            Some(other) => UpdateOrigin::Other(other.to_string()),
        }
    }
}

/// Something subscribers of the real-time channel are told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealtimeEvent {
    /// An item was created or overwritten
    Updated {
        collection: String,
        key: String,
        origin: UpdateOrigin,
    },
    /// An item was deleted
    Deleted { collection: String, key: String },
    /// The channel moved to a new state
    ConnectionStateChanged { state: ChannelState },
}

impl RealtimeEvent {
    /// True for `Updated` and `Deleted`.
    pub fn is_data_change(&self) -> bool {
        matches!(
            self,
            RealtimeEvent::Updated { .. } | RealtimeEvent::Deleted { .. }
        )
    }

    /// Collection touched by a data change.
    pub fn collection(&self) -> Option<&str> {
        match self {
            RealtimeEvent::Updated { collection, .. } | RealtimeEvent::Deleted { collection, .. } => {
                Some(collection)
            }
            RealtimeEvent::ConnectionStateChanged { .. } => None,
        }
    }
}

/// A text frame that could not be turned into an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(String),
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    action: Option<String>,
    collection: Option<String>,
    key: Option<String>,
    source: Option<String>,
}

/// Parse one text frame.
///
/// `Ok(None)` means a well-formed frame with an action this client does not
/// handle. A data frame missing `collection` or `key` still counts as a
/// change; the missing field is left empty.
pub fn parse_frame(text: &str) -> Result<Option<RealtimeEvent>, FrameError> {
    let raw: RawFrame =
        serde_json::from_str(text).map_err(|e| FrameError::InvalidJson(e.to_string()))?;

    let is_update = match raw.action.as_deref() {
        Some("update") => true,
        Some("delete") => false,
        _ => return Ok(None),
    };
    let collection = raw.collection.unwrap_or_default();
    let key = raw.key.unwrap_or_default();

    Ok(Some(if is_update {
        RealtimeEvent::Updated {
            collection,
            key,
            origin: UpdateOrigin::from_source(raw.source),
        }
    } else {
        RealtimeEvent::Deleted { collection, key }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_update() {
        let event = parse_frame(r#"{"action":"update","collection":"sensors","key":"k1"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            RealtimeEvent::Updated {
                collection: "sensors".to_string(),
                key: "k1".to_string(),
                origin: UpdateOrigin::Direct,
            }
        );
        assert!(event.is_data_change());
        assert_eq!(event.collection(), Some("sensors"));
    }

    #[test]
    fn test_parse_mqtt_update() {
        let event = parse_frame(
            r#"{"action":"update","collection":"esp32","key":"t","source":"mqtt","value":{"temp":20}}"#,
        )
        .unwrap()
        .unwrap();
        assert!(matches!(
            event,
            RealtimeEvent::Updated {
                origin: UpdateOrigin::Mqtt,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_delete() {
        let event = parse_frame(r#"{"action":"delete","collection":"todos","key":"t1"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            RealtimeEvent::Deleted {
                collection: "todos".to_string(),
                key: "t1".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_action_is_ignored() {
        assert_eq!(parse_frame(r#"{"action":"ping"}"#).unwrap(), None);
        assert_eq!(parse_frame(r#"{"hello":"world"}"#).unwrap(), None);
    }

    #[test]
    fn test_invalid_frames() {
        assert!(matches!(
            parse_frame("not json"),
            Err(FrameError::InvalidJson(_))
        ));
        assert!(matches!(
            parse_frame("[1,2]"),
            Err(FrameError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_partial_data_frame_is_still_a_change() {
        let event = parse_frame(r#"{"action":"update","collection":"sensors"}"#)
            .unwrap()
            .unwrap();
        assert!(event.is_data_change());
        assert_eq!(
            event,
            RealtimeEvent::Updated {
                collection: "sensors".to_string(),
                key: String::new(),
                origin: UpdateOrigin::Direct,
            }
        );
        assert_eq!(
            parse_frame(r#"{"action":"delete"}"#).unwrap(),
            Some(RealtimeEvent::Deleted {
                collection: String::new(),
                key: String::new(),
            })
        );
    }

    #[test]
    fn test_other_origin() {
        assert_eq!(
            UpdateOrigin::from_source(Some("import".to_string())),
            UpdateOrigin::Other("import".to_string())
        );
    }
}
