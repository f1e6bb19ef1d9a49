//! Tracked element and view context data model.
//!
//! These are the records the registry stores and the types agents receive
//! over the wire. Everything here is plain data: cloning a record gives a
//! reader its own consistent copy, independent of later registry updates.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

/// A UI element's identifier, screen frame, and metadata at a point in time.
///
/// The identifier is the unique key: re-registering it replaces the whole
/// record. `updated_at` is refreshed on every upsert, so agents can tell a
/// stale entry from one the layout pass just touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedElement {
    /// Unique identifier, immutable for the lifetime of the record.
    pub identifier: String,

    /// Current screen frame.
    pub frame: Rect,

    /// Free-form metadata attached by the declaring view (label, hint,
    /// screen name, ...). Bounded in total size by the validation policy.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, String>,

    /// Wall-clock time of the last upsert that produced this record.
    pub updated_at: DateTime<Utc>,
}

impl TrackedElement {
    /// Center of the element's frame, the point a tap would target.
    #[must_use]
    pub fn center(&self) -> Point {
        self.frame.center()
    }
}

/// Name and metadata of the currently active screen.
///
/// At most one view context is live per registry; `set_context` replaces it
/// wholesale and `clear` resets it to this unset baseline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewContext {
    /// Screen name, `None` when no screen has been announced yet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Screen-level metadata.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

/// An atomically captured, immutable copy of registry plus context state.
///
/// Captured under the registry lock, so the element list and view context
/// are mutually consistent as of `captured_at`. Snapshot ids are unique per
/// registry instance but carry no ordering guarantee beyond that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub snapshot_id: u64,

    /// All tracked elements at capture time, in unspecified order.
    pub elements: Vec<TrackedElement>,

    /// View context at capture time.
    pub view: ViewContext,

    pub captured_at: DateTime<Utc>,
}

impl RegistrySnapshot {
    /// Exact identifier lookup within the snapshot.
    #[must_use]
    pub fn find(&self, identifier: &str) -> Option<&TrackedElement> {
        self.elements.iter().find(|e| e.identifier == identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(identifier: &str, frame: Rect) -> TrackedElement {
        TrackedElement {
            identifier: identifier.to_string(),
            frame,
            context: HashMap::new(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn element_center_tracks_frame() {
        let e = element("button_primary_save_changes", Rect::new(10.0, 20.0, 100.0, 50.0));
        assert_eq!(e.center(), Point::new(60.0, 45.0));
    }

    #[test]
    fn element_serialization_omits_empty_context() {
        let e = element("textfield_email", Rect::new(0.0, 0.0, 10.0, 10.0));
        let json = serde_json::to_string(&e).unwrap();
        assert!(!json.contains("\"context\""));
    }

    #[test]
    fn view_context_default_is_unset() {
        let view = ViewContext::default();
        assert!(view.name.is_none());
        assert!(view.metadata.is_empty());
    }

    #[test]
    fn snapshot_find_matches_exact_identifier() {
        let snapshot = RegistrySnapshot {
            snapshot_id: 1,
            elements: vec![
                element("button_save", Rect::new(0.0, 0.0, 10.0, 10.0)),
                element("button_save_all", Rect::new(0.0, 20.0, 10.0, 10.0)),
            ],
            view: ViewContext::default(),
            captured_at: Utc::now(),
        };
        assert_eq!(
            snapshot.find("button_save").map(|e| e.frame.y),
            Some(0.0)
        );
        assert!(snapshot.find("button_sav").is_none());
    }
}
