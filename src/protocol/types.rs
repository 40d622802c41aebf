//! Typed protocol messages.
//!
//! The wire carries one JSON object per frame, in one of three shapes:
//!
//! ```text
//! Request:  { "seq", "type": "request",  "command", "arguments"? }
//! Response: { "seq", "type": "response", "request_seq", "success", "command", "body"?, "message"? }
//! Event:    { "seq", "type": "event",    "event", "body"? }
//! ```
//!
//! Requests are outgoing only; responses and events are incoming only.
//! Incoming payloads are classified by the `event` discriminator: a message
//! carrying one is an event, anything else is treated as a response.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// An outgoing request.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// Session-unique, monotonically increasing sequence number.
    pub seq: i64,
    /// Message type discriminator, always `"request"`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Command name.
    pub command: String,
    /// Command arguments, omitted when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

impl Request {
    /// Build a request for `command` with the given sequence number.
    pub fn new(seq: i64, command: &str, arguments: Option<Value>) -> Self {
        Self {
            seq,
            kind: "request",
            command: command.to_string(),
            arguments,
        }
    }

    /// Serialize to the JSON payload that goes on the wire.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// An incoming response to a previously sent request.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// The response's own sequence number.
    #[serde(default)]
    pub seq: i64,
    /// Sequence number of the request this answers.
    pub request_seq: i64,
    /// Whether the request succeeded.
    pub success: bool,
    /// Command name echoed from the request.
    #[serde(default)]
    pub command: String,
    /// Result payload, present on success for most commands.
    #[serde(default)]
    pub body: Option<Value>,
    /// Error message, present when `success` is false.
    #[serde(default)]
    pub message: Option<String>,
}

/// An unsolicited incoming event.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    /// The event's sequence number.
    #[serde(default)]
    pub seq: i64,
    /// Event name, e.g. `"stopped"` or `"initialized"`.
    pub event: String,
    /// Event payload, if any.
    #[serde(default)]
    pub body: Option<Value>,
}

/// A classified incoming message.
#[derive(Debug, Clone)]
pub enum Incoming {
    /// A response to a pending request.
    Response(Response),
    /// An out-of-band event.
    Event(Event),
}

impl Incoming {
    /// Parse and classify a raw payload.
    ///
    /// A payload whose top-level object carries an `event` key is an event;
    /// anything else is treated as a response.
    pub fn parse(payload: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(payload)?;
        if raw.get("event").is_some() {
            Ok(Incoming::Event(serde_json::from_value(raw)?))
        } else {
            Ok(Incoming::Response(serde_json::from_value(raw)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let request = Request::new(1, "initialize", Some(json!({ "adapterID": "node" })));
        let payload = request.to_json().unwrap();
        let value: Value = serde_json::from_str(&payload).unwrap();

        assert_eq!(value["seq"], 1);
        assert_eq!(value["type"], "request");
        assert_eq!(value["command"], "initialize");
        assert_eq!(value["arguments"]["adapterID"], "node");
    }

    #[test]
    fn test_request_omits_absent_arguments() {
        let request = Request::new(3, "threads", None);
        let payload = request.to_json().unwrap();

        assert!(!payload.contains("arguments"));
    }

    #[test]
    fn test_classify_event() {
        let payload = r#"{"seq":5,"type":"event","event":"stopped","body":{"reason":"breakpoint"}}"#;
        match Incoming::parse(payload).unwrap() {
            Incoming::Event(event) => {
                assert_eq!(event.event, "stopped");
                assert_eq!(event.body.unwrap()["reason"], "breakpoint");
            }
            other => panic!("expected event, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_response() {
        let payload =
            r#"{"seq":6,"type":"response","request_seq":2,"success":true,"command":"launch"}"#;
        match Incoming::parse(payload).unwrap() {
            Incoming::Response(response) => {
                assert_eq!(response.request_seq, 2);
                assert!(response.success);
                assert_eq!(response.command, "launch");
                assert!(response.body.is_none());
            }
            other => panic!("expected response, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_response_carries_message() {
        let payload = r#"{"seq":7,"type":"response","request_seq":4,"success":false,"command":"evaluate","message":"bad args"}"#;
        match Incoming::parse(payload).unwrap() {
            Incoming::Response(response) => {
                assert!(!response.success);
                assert_eq!(response.message.as_deref(), Some("bad args"));
            }
            other => panic!("expected response, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        assert!(Incoming::parse("not json").is_err());
    }
}
