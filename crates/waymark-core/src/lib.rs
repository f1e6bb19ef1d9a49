//! Core types and logic for waymark.
//!
//! waymark is an accessibility/automation-metadata layer for UI
//! frameworks: views declare stable identifiers and frames, a registry
//! tracks where everything is on screen, and external automation agents
//! locate and drive elements through a small facade instead of parsing
//! screenshots.
//!
//! # Modules
//!
//! - [`geometry`]: points, rectangles, center/intersection math
//! - [`element`]: tracked element, view context, and snapshot records
//! - [`identifier`]: canonical identifier formatting from free-text labels
//! - [`validate`]: pluggable validation policy (bounds, denylist)
//! - [`error`]: the closed registry error taxonomy
//! - [`registry`]: the concurrently-updated element store
//! - [`query`]: read-only lookups (exact, predicate, region, pattern)
//! - [`facade`]: agent-facing actions (tap, type, swipe, wait)
//! - [`hooks`]: side-effect callback interface for gesture injectors
//! - [`log`]: structured interaction/navigation log events
//! - [`protocol`]: JSON-line request/response types
//! - [`bridge`]: Unix-socket server exposing the facade to agents
//!
//! # Wiring
//!
//! The embedding application owns the registry and passes handles down:
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! use waymark_core::facade::Automation;
//! use waymark_core::geometry::Rect;
//! use waymark_core::registry::ElementRegistry;
//!
//! let registry = Arc::new(ElementRegistry::new());
//! // The UI layer reports layout events...
//! registry.notify_appeared(
//!     "button_primary_save_changes",
//!     Rect::new(10.0, 20.0, 100.0, 50.0),
//!     HashMap::new(),
//! );
//! // ...and agents act through the facade.
//! let automation = Automation::new(Arc::clone(&registry));
//! assert!(automation.tap_element("button_primary_save_changes").is_success());
//! ```

pub mod bridge;
pub mod element;
pub mod error;
pub mod facade;
pub mod geometry;
pub mod hooks;
pub mod identifier;
pub mod log;
pub mod protocol;
pub mod query;
pub mod registry;
pub mod validate;
