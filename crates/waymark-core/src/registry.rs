//! Element registry: the single owner of tracked-element state.
//!
//! All mutation funnels through one `RwLock` around the element map and the
//! view context. Critical sections are short and never perform I/O; readers
//! get cloned records (copy-on-read), so a reader never observes a
//! half-updated record and writers are never blocked on a slow consumer.
//!
//! Concurrent upserts of the same identifier serialize at the lock;
//! last-writer-wins by write-lock acquisition order. Which of two racing
//! updates wins is unspecified, but the stored record is always one
//! complete payload, never a mix.
//!
//! The registry is an explicitly constructed, injectable instance. There is
//! no global: the embedding application owns it and hands `Arc` clones to
//! the facade and the bridge. Tests build as many independent registries as
//! they like.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use tracing::{debug, warn};

use crate::element::{RegistrySnapshot, TrackedElement, ViewContext};
use crate::error::RegistryError;
use crate::geometry::Rect;
use crate::validate::{context_size, ValidationPolicy};

/// Default bound on the number of tracked elements.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Registry construction parameters.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum number of tracked elements. New identifiers beyond this
    /// fail with `ResourceLimitExceeded`; existing ones stay updatable.
    pub capacity: usize,
    /// Validation applied on the checked mutation path.
    pub policy: ValidationPolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            policy: ValidationPolicy::default(),
        }
    }
}

pub(crate) struct RegistryState {
    pub(crate) elements: HashMap<String, TrackedElement>,
    pub(crate) view: ViewContext,
}

/// Thread-safe store of tracked elements plus the active view context.
pub struct ElementRegistry {
    state: RwLock<RegistryState>,
    config: RegistryConfig,
    /// Snapshot ids only need uniqueness, hence Relaxed.
    snapshot_counter: AtomicU64,
}

impl Default for ElementRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementRegistry {
    /// Create a registry with default capacity and validation policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a registry with explicit configuration.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            state: RwLock::new(RegistryState {
                elements: HashMap::new(),
                view: ViewContext::default(),
            }),
            config,
            snapshot_counter: AtomicU64::new(1),
        }
    }

    /// The configured element capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// The validation policy applied on the checked mutation path.
    #[must_use]
    pub fn policy(&self) -> &ValidationPolicy {
        &self.config.policy
    }

    // A poisoned lock means a writer panicked, but every write either
    // replaces a whole record or mutates one under exclusive access, so the
    // state a panicking thread leaves behind is still structurally sound.
    // Adopt it rather than propagating the poison to every later caller.
    pub(crate) fn read_state(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace a tracked element, validating all input first.
    ///
    /// On validation failure nothing is mutated. A new identifier is
    /// refused with `ResourceLimitExceeded` once the registry holds
    /// `capacity` elements; updating an identifier that is already present
    /// always succeeds, even at capacity.
    pub fn upsert(
        &self,
        identifier: &str,
        frame: Rect,
        context: HashMap<String, String>,
    ) -> Result<(), RegistryError> {
        self.config.policy.validate_identifier(identifier)?;
        self.config.policy.validate_frame(&frame)?;
        self.config.policy.validate_context(&context)?;
        self.apply_upsert(identifier, frame, context)
    }

    /// Best-effort upsert that skips validation short-circuits.
    ///
    /// Legacy escape hatch: validation failures are logged at `warn` and the
    /// element is stored anyway, so records admitted through this path may
    /// violate the registry's documented invariants. Capacity is still
    /// enforced (resource bounding is not negotiable), but a refusal is
    /// only logged, matching the fire-and-forget contract of this path.
    pub fn upsert_unchecked(&self, identifier: &str, frame: Rect, context: HashMap<String, String>) {
        for check in [
            self.config.policy.validate_identifier(identifier),
            self.config.policy.validate_frame(&frame),
            self.config.policy.validate_context(&context),
        ] {
            if let Err(err) = check {
                warn!(identifier, %err, "storing element despite failed validation");
            }
        }
        if let Err(err) = self.apply_upsert(identifier, frame, context) {
            warn!(identifier, %err, "dropping unchecked upsert");
        }
    }

    /// The one write primitive both upsert paths share.
    fn apply_upsert(
        &self,
        identifier: &str,
        frame: Rect,
        context: HashMap<String, String>,
    ) -> Result<(), RegistryError> {
        let mut state = self.write_state();
        if !state.elements.contains_key(identifier) && state.elements.len() >= self.config.capacity
        {
            return Err(RegistryError::ResourceLimitExceeded {
                limit: self.config.capacity,
                current: state.elements.len(),
            });
        }
        state.elements.insert(
            identifier.to_string(),
            TrackedElement {
                identifier: identifier.to_string(),
                frame,
                context,
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    /// Remove an element. Idempotent: removing an absent identifier is a
    /// no-op, not an error.
    pub fn remove(&self, identifier: &str) {
        let mut state = self.write_state();
        if state.elements.remove(identifier).is_some() {
            debug!(identifier, "element removed");
        }
    }

    /// Remove all elements and reset the view context, in one critical
    /// section.
    pub fn clear(&self) {
        let mut state = self.write_state();
        state.elements.clear();
        state.view = ViewContext::default();
    }

    /// Exact lookup, returning a cloned record.
    #[must_use]
    pub fn get(&self, identifier: &str) -> Option<TrackedElement> {
        self.read_state().elements.get(identifier).cloned()
    }

    /// Read-only copies of every tracked element, in unspecified order.
    #[must_use]
    pub fn all(&self) -> Vec<TrackedElement> {
        self.read_state().elements.values().cloned().collect()
    }

    /// Number of tracked elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read_state().elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_state().elements.is_empty()
    }

    /// Capture elements and view context atomically.
    ///
    /// Both halves come from the same lock hold, so a snapshot never mixes
    /// pre- and post-update state for an entity. Entities updated after the
    /// capture instant are simply not included.
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        let state = self.read_state();
        RegistrySnapshot {
            snapshot_id: self.snapshot_counter.fetch_add(1, Ordering::Relaxed),
            elements: state.elements.values().cloned().collect(),
            view: state.view.clone(),
            captured_at: Utc::now(),
        }
    }

    /// Replace the active view context wholesale. Always succeeds.
    ///
    /// The shared metadata-size bound applies leniently here: oversized
    /// metadata is stored as given and logged, since screen changes must
    /// never be droppable by policy.
    pub fn set_context(&self, name: impl Into<String>, metadata: HashMap<String, String>) {
        let name = name.into();
        let size = context_size(&metadata);
        if size > self.config.policy.max_context_bytes {
            warn!(
                screen = %name,
                size,
                limit = self.config.policy.max_context_bytes,
                "view context metadata exceeds size bound"
            );
        }
        let mut state = self.write_state();
        let previous = state.view.name.clone().unwrap_or_default();
        state.view = ViewContext {
            name: Some(name.clone()),
            metadata,
        };
        drop(state);
        crate::log::log_navigation(&previous, &name, "set_context");
    }

    /// The active view context.
    #[must_use]
    pub fn context(&self) -> ViewContext {
        self.read_state().view.clone()
    }

    // --- UI-layer notification surface -----------------------------------
    //
    // Layout and lifecycle events are fire-and-forget: the UI layer cannot
    // meaningfully retry a failed registration mid-layout, so failures are
    // logged and dropped here instead of bubbling back into view code.

    /// A view appeared (or re-registered) with a frame and context.
    pub fn notify_appeared(
        &self,
        identifier: &str,
        frame: Rect,
        context: HashMap<String, String>,
    ) {
        debug!(identifier, "element appeared");
        if let Err(err) = self.upsert(identifier, frame, context) {
            warn!(identifier, %err, "dropping appearance event");
        }
    }

    /// A tracked view moved during a layout pass.
    ///
    /// Keeps the stored context. If the appearance event was missed (the
    /// identifier is unknown), the element is admitted with empty context
    /// rather than losing track of it entirely.
    pub fn notify_moved(&self, identifier: &str, frame: Rect) {
        if let Err(err) = self.config.policy.validate_frame(&frame) {
            warn!(identifier, %err, "dropping move event");
            return;
        }
        let mut state = self.write_state();
        if let Some(existing) = state.elements.get_mut(identifier) {
            // Exclusive access makes the two-field update atomic to readers.
            existing.frame = frame;
            existing.updated_at = Utc::now();
            return;
        }
        drop(state);
        debug!(identifier, "move event for unknown element, admitting");
        if let Err(err) = self.upsert(identifier, frame, HashMap::new()) {
            warn!(identifier, %err, "dropping move event");
        }
    }

    /// A view disappeared.
    pub fn notify_disappeared(&self, identifier: &str) {
        debug!(identifier, "element disappeared");
        self.remove(identifier);
    }
}
