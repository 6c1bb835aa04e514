//! Server-sent events decoding.
//!
//! The realtime database streams changes as `text/event-stream`:
//!
//! ```text
//! event: put
//! data: {"path":"/","data":{"temperature":21.5}}
//!
//! event: keep-alive
//! data: null
//! ```
//!
//! Framing is handled by `eventsource-stream`; [`StreamEvent::parse`]
//! interprets each event's name and data.

use serde::Deserialize;
use serde_json::Value;

use super::DbPath;
use crate::error::DatabaseError;

/// A database change notification.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Replace the value at `path` (relative to the subscribed path).
    Put { path: DbPath, data: Value },
    /// Set each child of `data` under `path`.
    Patch { path: DbPath, data: Value },
    KeepAlive,
    /// The server stopped the stream, e.g. because rules deny the read.
    Cancel(String),
    /// The auth token expired or was revoked.
    AuthRevoked,
}

#[derive(Debug, Deserialize)]
struct ChangePayload {
    path: String,
    data: Value,
}

impl StreamEvent {
    /// Interpret a decoded event by its name and data.
    ///
    /// Unknown event names are ignored (`Ok(None)`).
    pub fn parse(name: &str, data: &str) -> Result<Option<Self>, DatabaseError> {
        let parsed = match name {
            "put" | "patch" => {
                let payload: ChangePayload = serde_json::from_str(data)?;
                let path = DbPath::parse(&payload.path);
                if name == "put" {
                    StreamEvent::Put {
                        path,
                        data: payload.data,
                    }
                } else {
                    StreamEvent::Patch {
                        path,
                        data: payload.data,
                    }
                }
            }
            "keep-alive" => StreamEvent::KeepAlive,
            "cancel" => StreamEvent::Cancel(cancel_reason(data)),
            "auth_revoked" => StreamEvent::AuthRevoked,
            _ => return Ok(None),
        };
        Ok(Some(parsed))
    }
}

fn cancel_reason(data: &str) -> String {
    match serde_json::from_str::<Value>(data) {
        Ok(Value::String(reason)) => reason,
        Ok(Value::Null) => "cancelled by server".to_string(),
        _ if data.trim().is_empty() => "cancelled by server".to_string(),
        _ => data.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_put() {
        let data = r#"{"path":"/08:00","data":{"temperature":20,"humidity":50}}"#;
        assert_eq!(
            StreamEvent::parse("put", data).unwrap(),
            Some(StreamEvent::Put {
                path: DbPath::parse("08:00"),
                data: json!({"temperature": 20, "humidity": 50}),
            })
        );
    }

    #[test]
    fn test_parse_patch() {
        let data = r#"{"path":"/","data":{"09:00":{"temperature":21,"humidity":55}}}"#;
        assert_eq!(
            StreamEvent::parse("patch", data).unwrap(),
            Some(StreamEvent::Patch {
                path: DbPath::root(),
                data: json!({"09:00": {"temperature": 21, "humidity": 55}}),
            })
        );
    }

    #[test]
    fn test_parse_control_events() {
        assert_eq!(StreamEvent::parse("keep-alive", "null").unwrap(), Some(StreamEvent::KeepAlive));
        assert_eq!(
            StreamEvent::parse("cancel", r#""Permission denied""#).unwrap(),
            Some(StreamEvent::Cancel("Permission denied".to_string()))
        );
        assert_eq!(
            StreamEvent::parse("cancel", "null").unwrap(),
            Some(StreamEvent::Cancel("cancelled by server".to_string()))
        );
        assert_eq!(
            StreamEvent::parse("auth_revoked", "credential is no longer valid").unwrap(),
            Some(StreamEvent::AuthRevoked)
        );
        assert_eq!(StreamEvent::parse("message", "").unwrap(), None);
    }

    #[test]
    fn test_parse_invalid_put_is_error() {
        assert!(matches!(StreamEvent::parse("put", "not json"), Err(DatabaseError::Parse(_))));
    }
}
