//! Interaction and navigation log events.
//!
//! Structured `tracing` events under stable targets, so embedding
//! applications can route automation telemetry separately from the
//! library's own diagnostics (e.g. `waymark::interaction=info` in an
//! `EnvFilter`). Fire-and-forget by construction: emitting an event cannot
//! fail and cannot block, so nothing here ever propagates to the caller.

use tracing::info;

/// Target for element interaction events (tap, type, swipe).
pub const INTERACTION_TARGET: &str = "waymark::interaction";

/// Target for screen navigation events.
pub const NAVIGATION_TARGET: &str = "waymark::navigation";

/// Record an interaction with an element.
///
/// `detail` carries action-specific context such as a tap point or a
/// text length.
/// Callers are responsible for redacting sensitive payloads before logging;
/// the facade logs text lengths, never text.
pub fn log_interaction(identifier: &str, action: &str, detail: &str) {
    info!(
        target: INTERACTION_TARGET,
        identifier, action, detail, "interaction"
    );
}

/// Record a navigation from one screen to another.
pub fn log_navigation(from: &str, to: &str, method: &str) {
    info!(target: NAVIGATION_TARGET, from, to, method, "navigation");
}
