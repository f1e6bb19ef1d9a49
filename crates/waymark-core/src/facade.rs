//! Navigation/automation facade.
//!
//! The agent-facing composition of registry lookups, query results, and
//! side-effect hooks. Each operation is independent and stateless across
//! calls: the facade holds no session state, only handles to the registry
//! and the optional hook set.
//!
//! Every operation resolves to one value of the closed [`ActionOutcome`]
//! set. `ElementNotFound` and `Timeout` are ordinary control flow for
//! automation callers, not exceptional conditions. Nothing here panics or
//! escapes the outcome type.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::element::{RegistrySnapshot, TrackedElement, ViewContext};
use crate::error::RegistryError;
use crate::geometry::Point;
use crate::hooks::AutomationHooks;
use crate::log::log_interaction;
use crate::registry::ElementRegistry;

/// Fixed delay between existence checks in [`Automation::wait_for_element`].
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Result of a facade operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The identifier resolved and any registered callback was invoked.
    /// This does not assert the gesture reached the UI, only that the
    /// request was dispatched.
    Success,
    /// No element is registered under the identifier.
    ElementNotFound { identifier: String },
    /// The wait deadline elapsed before the element appeared.
    Timeout { elapsed_ms: u64 },
    /// A registry or query error occurred.
    Error { cause: RegistryError },
}

impl ActionOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Automation entry point over a shared registry.
#[derive(Clone)]
pub struct Automation {
    registry: Arc<ElementRegistry>,
    hooks: Option<Arc<dyn AutomationHooks>>,
}

impl Automation {
    /// Build a facade over `registry` with no hooks registered.
    #[must_use]
    pub fn new(registry: Arc<ElementRegistry>) -> Self {
        Self {
            registry,
            hooks: None,
        }
    }

    /// Register side-effect hooks. Replaces any previous set.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn AutomationHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// The registry this facade reads.
    #[must_use]
    pub fn registry(&self) -> &Arc<ElementRegistry> {
        &self.registry
    }

    /// Tap an element by identifier.
    ///
    /// Resolves the element, computes its center, logs the interaction, and
    /// invokes `on_element_tap`. Absent identifier: no hook runs.
    pub fn tap_element(&self, identifier: &str) -> ActionOutcome {
        let Some(element) = self.registry.get(identifier) else {
            return ActionOutcome::ElementNotFound {
                identifier: identifier.to_string(),
            };
        };
        let center = element.center();
        log_interaction(
            identifier,
            "tap",
            &format!("center=({}, {})", center.x, center.y),
        );
        if let Some(hooks) = &self.hooks {
            hooks.on_element_tap(identifier, center);
        }
        ActionOutcome::Success
    }

    /// Type text into an element by identifier.
    ///
    /// The log event carries only the text length; the raw text goes to the
    /// `on_text_input` hook unmodified.
    pub fn type_text(&self, identifier: &str, text: &str) -> ActionOutcome {
        if self.registry.get(identifier).is_none() {
            return ActionOutcome::ElementNotFound {
                identifier: identifier.to_string(),
            };
        }
        log_interaction(identifier, "type_text", &format!("len={}", text.len()));
        if let Some(hooks) = &self.hooks {
            hooks.on_text_input(identifier, text);
        }
        ActionOutcome::Success
    }

    /// Swipe between two screen points.
    ///
    /// Coordinate-based, not identifier-based, so there is no lookup and no
    /// way to fail: always `Success`.
    pub fn swipe(&self, from: Point, to: Point) -> ActionOutcome {
        log_interaction(
            "",
            "swipe",
            &format!("({}, {}) -> ({}, {})", from.x, from.y, to.x, to.y),
        );
        if let Some(hooks) = &self.hooks {
            hooks.on_swipe(from, to);
        }
        ActionOutcome::Success
    }

    /// Wait for an element to appear, polling every [`POLL_INTERVAL`].
    ///
    /// Checks immediately, then re-checks on the fixed interval until found
    /// or `timeout` elapses. Cooperative: between checks the task is parked
    /// in `tokio::time::sleep`, never spinning and never blocking a thread.
    /// The final sleep is clamped to the remaining budget, so expiry
    /// overshoots the deadline by less than one interval. Cancellation is
    /// by timeout expiry only.
    pub async fn wait_for_element(&self, identifier: &str, timeout: Duration) -> ActionOutcome {
        let start = Instant::now();
        loop {
            if self.registry.get(identifier).is_some() {
                debug!(identifier, elapsed_ms = start.elapsed().as_millis() as u64, "element appeared");
                return ActionOutcome::Success;
            }
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return ActionOutcome::Timeout {
                    elapsed_ms: elapsed.as_millis() as u64,
                };
            }
            sleep(POLL_INTERVAL.min(timeout - elapsed)).await;
        }
    }

    /// Identifiers matching a pattern; empty on invalid pattern (fail-soft).
    #[must_use]
    pub fn find_elements(&self, pattern: &str) -> Vec<String> {
        self.registry.matching(pattern)
    }

    /// Validated variant of [`find_elements`](Self::find_elements).
    pub fn try_find_elements(&self, pattern: &str) -> Result<Vec<String>, RegistryError> {
        self.registry.try_matching(pattern)
    }

    /// The active view context.
    #[must_use]
    pub fn current_context(&self) -> ViewContext {
        self.registry.context()
    }

    /// All tracked elements.
    #[must_use]
    pub fn all_elements(&self) -> Vec<TrackedElement> {
        self.registry.all()
    }

    /// Atomic point-in-time capture of registry plus context.
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.registry.snapshot()
    }

    /// Convenience: register an element through the validated path.
    ///
    /// Embedding UI layers usually call the registry directly; this exists
    /// so a facade handle alone is enough to drive tests and demos.
    pub fn register_element(
        &self,
        identifier: &str,
        frame: crate::geometry::Rect,
        context: HashMap<String, String>,
    ) -> Result<(), RegistryError> {
        self.registry.upsert(identifier, frame, context)
    }
}
