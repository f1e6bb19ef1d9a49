//! Registry error taxonomy.
//!
//! Every failure in the tracking core is a value from this closed set, never
//! a panic across the API boundary. Each variant carries an agent-facing
//! suggestion so automation tooling can self-correct instead of guessing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the registry, query engine, and facade.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistryError {
    /// The identifier failed validation (empty, too long, bad characters).
    #[error("invalid identifier: {reason}")]
    InvalidIdentifier { reason: String },

    /// The frame failed validation (non-finite, negative size, out of range).
    #[error("invalid frame: {reason}")]
    InvalidFrame { reason: String },

    /// The context metadata failed validation (size, empty key, denylist).
    #[error("invalid context: {reason}")]
    InvalidContext { reason: String },

    /// No tracked element exists under the identifier.
    #[error("element '{identifier}' not found")]
    ElementNotFound { identifier: String },

    /// Admitting a new element would exceed the registry capacity.
    #[error("registry capacity ({limit}) reached, {current} elements tracked")]
    ResourceLimitExceeded { limit: usize, current: usize },

    /// The query pattern is not a valid regular expression.
    #[error("invalid pattern '{pattern}': {reason}")]
    PatternError { pattern: String, reason: String },

    /// A bounded wait elapsed without the condition being met.
    #[error("timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },
}

impl RegistryError {
    /// Stable machine-readable discriminant, mirrored by the wire encoding.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier { .. } => "invalid_identifier",
            Self::InvalidFrame { .. } => "invalid_frame",
            Self::InvalidContext { .. } => "invalid_context",
            Self::ElementNotFound { .. } => "element_not_found",
            Self::ResourceLimitExceeded { .. } => "resource_limit_exceeded",
            Self::PatternError { .. } => "pattern_error",
            Self::Timeout { .. } => "timeout",
        }
    }

    /// A recovery hint for automation callers.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier { .. } => {
                "Identifiers must be non-empty and use only letters, digits, underscore, hyphen, and period."
            }
            Self::InvalidFrame { .. } => {
                "Frames need finite coordinates and a non-negative, bounded size."
            }
            Self::InvalidContext { .. } => {
                "Keep context keys non-empty, the total size small, and credentials out of metadata."
            }
            Self::ElementNotFound { .. } => {
                "List current identifiers with the elements query, or wait for the element to appear."
            }
            Self::ResourceLimitExceeded { .. } => {
                "Remove stale elements (or clear the registry) before registering new ones."
            }
            Self::PatternError { .. } => {
                "Check the regular expression syntax; patterns match identifiers case-insensitively."
            }
            Self::Timeout { .. } => {
                "Increase the timeout, or verify the element is ever registered on this screen."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_variants() -> Vec<RegistryError> {
        vec![
            RegistryError::InvalidIdentifier {
                reason: "empty".into(),
            },
            RegistryError::InvalidFrame {
                reason: "width is negative".into(),
            },
            RegistryError::InvalidContext {
                reason: "key 'password_hint' matches denylist".into(),
            },
            RegistryError::ElementNotFound {
                identifier: "button_missing".into(),
            },
            RegistryError::ResourceLimitExceeded {
                limit: 10,
                current: 10,
            },
            RegistryError::PatternError {
                pattern: "[".into(),
                reason: "unclosed character class".into(),
            },
            RegistryError::Timeout { elapsed_ms: 5000 },
        ]
    }

    /// Every variant must give automation callers a non-empty hint.
    #[test]
    fn every_variant_has_a_suggestion() {
        for err in all_variants() {
            assert!(
                !err.suggestion().is_empty(),
                "{} is missing a suggestion",
                err.kind()
            );
        }
    }

    #[test]
    fn kind_matches_wire_tag() {
        for err in all_variants() {
            let json = serde_json::to_string(&err).unwrap();
            assert!(
                json.contains(&format!("\"kind\":\"{}\"", err.kind())),
                "wire tag mismatch for {json}"
            );
        }
    }

    #[test]
    fn display_includes_identifier() {
        let err = RegistryError::ElementNotFound {
            identifier: "button_checkout".into(),
        };
        assert_eq!(err.to_string(), "element 'button_checkout' not found");
    }

    #[test]
    fn capacity_error_reports_limit_and_current() {
        let err = RegistryError::ResourceLimitExceeded {
            limit: 10_000,
            current: 10_000,
        };
        let text = err.to_string();
        assert!(text.contains("10000"));
    }

    #[test]
    fn round_trips_through_json() {
        let err = RegistryError::PatternError {
            pattern: "button_(".into(),
            reason: "unclosed group".into(),
        };
        let json = serde_json::to_string(&err).unwrap();
        let back: RegistryError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }
}
