//! JSON-line protocol between automation agents and the bridge.
//!
//! One request per line, one response per line. Commands map 1:1 onto
//! facade operations; agents never reach the registry's mutation surface
//! through this protocol; the embedding UI owns writes.

use serde::{Deserialize, Serialize};

use crate::element::{RegistrySnapshot, TrackedElement, ViewContext};
use crate::error::RegistryError;
use crate::facade::ActionOutcome;

/// A request from an agent to the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    pub command: Command,
}

/// Commands the bridge can execute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    /// List all tracked elements.
    Elements,
    /// Identifiers matching a case-insensitive regex.
    Find { pattern: String },
    /// Elements intersecting a screen region.
    InRegion {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// Tap an element at its center.
    Tap { identifier: String },
    /// Type text into an element.
    TypeText { identifier: String, text: String },
    /// Swipe between two screen points.
    Swipe {
        from_x: f64,
        from_y: f64,
        to_x: f64,
        to_y: f64,
    },
    /// Wait for an element to appear.
    WaitFor {
        identifier: String,
        timeout_ms: Option<u64>,
    },
    /// The active view context.
    Context,
    /// Atomic snapshot of elements plus context.
    Snapshot,
}

/// A response from the bridge to an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<WireError>,
}

impl Response {
    pub fn success(id: impl Into<String>, data: ResponseData) -> Self {
        Self {
            id: id.into(),
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(id: impl Into<String>, error: WireError) -> Self {
        Self {
            id: id.into(),
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

/// Response payload variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseData {
    /// Tracked elements, in unspecified order.
    Elements { elements: Vec<TrackedElement> },
    /// Identifiers from a pattern query.
    Identifiers { identifiers: Vec<String> },
    /// Outcome of a facade action (tap, type, swipe, wait).
    Outcome { outcome: ActionOutcome },
    /// The active view context.
    Context { view: ViewContext },
    /// Atomic registry snapshot.
    Snapshot { snapshot: RegistrySnapshot },
}

/// Protocol-level error with an agent-facing hint.
///
/// Registry errors map onto this via [`From`]; transport problems (bad
/// JSON, unknown command shapes) are built directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireError {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl WireError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: "invalid_request".into(),
            message: message.into(),
            suggestion: Some(
                "Send one JSON object per line with 'id' and 'command' fields, e.g. \
                 {\"id\":\"1\",\"command\":{\"action\":\"elements\"}}"
                    .into(),
            ),
        }
    }
}

impl From<&RegistryError> for WireError {
    fn from(err: &RegistryError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
            suggestion: Some(err.suggestion().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_wire_shape_is_action_tagged() {
        let json = serde_json::to_string(&Command::Tap {
            identifier: "button_save".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"action":"tap","identifier":"button_save"}"#);
    }

    #[test]
    fn request_round_trips() {
        let request = Request {
            id: "req-1".into(),
            command: Command::WaitFor {
                identifier: "button_done".into(),
                timeout_ms: Some(5000),
            },
        };
        let json = serde_json::to_string(&request).unwrap();
        let back: Request = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn wait_for_timeout_is_optional_on_the_wire() {
        let request: Request = serde_json::from_str(
            r#"{"id":"1","command":{"action":"wait_for","identifier":"button_done"}}"#,
        )
        .unwrap();
        assert_eq!(
            request.command,
            Command::WaitFor {
                identifier: "button_done".into(),
                timeout_ms: None,
            }
        );
    }

    #[test]
    fn success_response_omits_error_field() {
        let response = Response::success(
            "req-1",
            ResponseData::Identifiers {
                identifiers: vec!["button_save".into()],
            },
        );
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("\"error\""));
        assert!(json.contains(r#""type":"identifiers""#));
    }

    #[test]
    fn registry_errors_carry_their_suggestion_over_the_wire() {
        let err = RegistryError::ElementNotFound {
            identifier: "button_x".into(),
        };
        let wire = WireError::from(&err);
        assert_eq!(wire.kind, "element_not_found");
        assert!(wire.suggestion.is_some());

        let response = Response::error("req-2", wire);
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("element_not_found"));
    }
}
