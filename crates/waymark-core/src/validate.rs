//! Validation policy for registry input.
//!
//! All bounds live here so the registry itself stays a thin synchronization
//! layer. The policy is a plain value injected at registry construction:
//! tests tune or disable individual checks (notably the sensitive-term
//! denylist) without touching registry logic.

use std::collections::HashMap;

use crate::error::RegistryError;
use crate::geometry::Rect;

/// Default identifier length bound.
pub const MAX_IDENTIFIER_LEN: usize = 128;

/// Default bound on total context size (keys plus values, in bytes).
pub const MAX_CONTEXT_BYTES: usize = 4096;

/// Default magnitude bound for frame coordinates and extents.
///
/// Guards downstream arithmetic (center derivation, intersection) against
/// overflow-scale values; no real screen is a million points wide.
pub const MAX_COORDINATE: f64 = 1_000_000.0;

/// Substring fragments that flag context entries as likely credentials.
///
/// Deliberately crude: a substring match errs toward rejecting metadata that
/// merely looks sensitive, since context travels to automation tooling and
/// logs.
pub const SENSITIVE_FRAGMENTS: &[&str] =
    &["password", "secret", "token", "credential", "api_key", "auth"];

/// Bounds and checks applied to mutating registry operations.
#[derive(Debug, Clone)]
pub struct ValidationPolicy {
    pub max_identifier_len: usize,
    pub max_context_bytes: usize,
    pub max_coordinate: f64,
    /// When false, the denylist check is skipped entirely.
    pub deny_sensitive_context: bool,
    pub sensitive_fragments: Vec<String>,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            max_identifier_len: MAX_IDENTIFIER_LEN,
            max_context_bytes: MAX_CONTEXT_BYTES,
            max_coordinate: MAX_COORDINATE,
            deny_sensitive_context: true,
            sensitive_fragments: SENSITIVE_FRAGMENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ValidationPolicy {
    /// A policy with the denylist disabled, for tests that need metadata
    /// the default policy would reject.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            deny_sensitive_context: false,
            ..Self::default()
        }
    }

    /// Validate an identifier: non-empty, bounded length, restricted
    /// character set (letters, digits, underscore, hyphen, period).
    pub fn validate_identifier(&self, identifier: &str) -> Result<(), RegistryError> {
        if identifier.is_empty() {
            return Err(RegistryError::InvalidIdentifier {
                reason: "identifier is empty".into(),
            });
        }
        if identifier.len() > self.max_identifier_len {
            return Err(RegistryError::InvalidIdentifier {
                reason: format!(
                    "identifier is {} bytes, limit is {}",
                    identifier.len(),
                    self.max_identifier_len
                ),
            });
        }
        if let Some(bad) = identifier
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '_' | '-' | '.'))
        {
            return Err(RegistryError::InvalidIdentifier {
                reason: format!("character {bad:?} is not allowed"),
            });
        }
        Ok(())
    }

    /// Validate a frame: finite fields, non-negative size, bounded magnitude.
    pub fn validate_frame(&self, frame: &Rect) -> Result<(), RegistryError> {
        let fields = [
            ("x", frame.x),
            ("y", frame.y),
            ("width", frame.width),
            ("height", frame.height),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(RegistryError::InvalidFrame {
                    reason: format!("{name} is not finite"),
                });
            }
            if value.abs() > self.max_coordinate {
                return Err(RegistryError::InvalidFrame {
                    reason: format!("{name} ({value}) exceeds magnitude bound {}", self.max_coordinate),
                });
            }
        }
        if frame.width < 0.0 || frame.height < 0.0 {
            return Err(RegistryError::InvalidFrame {
                reason: "size is negative".into(),
            });
        }
        Ok(())
    }

    /// Validate context metadata: non-empty keys, bounded total size, and
    /// (when enabled) no keys or values matching the sensitive denylist.
    pub fn validate_context(&self, context: &HashMap<String, String>) -> Result<(), RegistryError> {
        if context.keys().any(|k| k.is_empty()) {
            return Err(RegistryError::InvalidContext {
                reason: "context contains an empty key".into(),
            });
        }

        let total = context_size(context);
        if total > self.max_context_bytes {
            return Err(RegistryError::InvalidContext {
                reason: format!(
                    "context is {total} bytes, limit is {}",
                    self.max_context_bytes
                ),
            });
        }

        if self.deny_sensitive_context {
            for (key, value) in context {
                if let Some(fragment) = self.sensitive_fragment_in(key) {
                    return Err(RegistryError::InvalidContext {
                        reason: format!("key '{key}' matches sensitive term '{fragment}'"),
                    });
                }
                // Report the key, not the value: the value may be the
                // credential we're refusing to store.
                if let Some(fragment) = self.sensitive_fragment_in(value) {
                    return Err(RegistryError::InvalidContext {
                        reason: format!(
                            "value for key '{key}' matches sensitive term '{fragment}'"
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    fn sensitive_fragment_in(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.sensitive_fragments
            .iter()
            .find(|fragment| lowered.contains(fragment.as_str()))
            .map(String::as_str)
    }
}

/// Total context size in bytes: the sum of key and value lengths.
#[must_use]
pub fn context_size(context: &HashMap<String, String>) -> usize {
    context.iter().map(|(k, v)| k.len() + v.len()).sum()
}
