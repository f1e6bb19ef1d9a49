//! Read-only queries over the registry.
//!
//! Everything here is a pure read: queries clone matching records out from
//! under the read lock and never mutate. Result order is unspecified;
//! callers that care must sort. Scans are O(n) by design; at the expected
//! scale (thousands of elements) a spatial index would be overhead, not
//! optimization.

use regex::RegexBuilder;
use tracing::warn;

use crate::element::TrackedElement;
use crate::error::RegistryError;
use crate::geometry::Rect;
use crate::registry::ElementRegistry;

impl ElementRegistry {
    /// Exact identifier lookup. Alias of `get`, named for query-side code.
    #[must_use]
    pub fn find(&self, identifier: &str) -> Option<TrackedElement> {
        self.get(identifier)
    }

    /// All elements satisfying an arbitrary predicate.
    #[must_use]
    pub fn filter<F>(&self, predicate: F) -> Vec<TrackedElement>
    where
        F: Fn(&TrackedElement) -> bool,
    {
        self.read_state()
            .elements
            .values()
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }

    /// Elements whose frame shares positive-area overlap with `region`.
    ///
    /// Touching edges (zero overlap area) do not count.
    #[must_use]
    pub fn in_region(&self, region: Rect) -> Vec<TrackedElement> {
        self.read_state()
            .elements
            .values()
            .filter(|e| e.frame.intersects(&region))
            .cloned()
            .collect()
    }

    /// Identifiers matching `pattern` as a case-insensitive regex.
    ///
    /// Search semantics: the pattern may match anywhere in the identifier,
    /// no anchoring. Returns a `PatternError` for invalid syntax.
    pub fn try_matching(&self, pattern: &str) -> Result<Vec<String>, RegistryError> {
        let re = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| RegistryError::PatternError {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
        Ok(self
            .read_state()
            .elements
            .keys()
            .filter(|id| re.is_match(id))
            .cloned()
            .collect())
    }

    /// Fail-soft variant of [`try_matching`](Self::try_matching).
    ///
    /// Automation callers should not crash on a malformed filter, so an
    /// invalid pattern yields an empty list and a `warn` log instead of an
    /// error.
    #[must_use]
    pub fn matching(&self, pattern: &str) -> Vec<String> {
        match self.try_matching(pattern) {
            Ok(identifiers) => identifiers,
            Err(err) => {
                warn!(pattern, %err, "pattern rejected, returning no matches");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn registry_with(ids: &[(&str, Rect)]) -> ElementRegistry {
        let registry = ElementRegistry::new();
        for (id, frame) in ids {
            registry.upsert(id, *frame, HashMap::new()).unwrap();
        }
        registry
    }

    fn unit_rect() -> Rect {
        Rect::new(0.0, 0.0, 10.0, 10.0)
    }

    #[test]
    fn find_returns_exact_match_only() {
        let registry = registry_with(&[("button_save", unit_rect())]);
        assert!(registry.find("button_save").is_some());
        assert!(registry.find("button_sav").is_none());
        assert!(registry.find("BUTTON_SAVE").is_none());
    }

    #[test]
    fn filter_applies_arbitrary_predicates() {
        let registry = registry_with(&[
            ("button_wide", Rect::new(0.0, 0.0, 200.0, 10.0)),
            ("button_narrow", Rect::new(0.0, 50.0, 20.0, 10.0)),
        ]);
        let wide = registry.filter(|e| e.frame.width > 100.0);
        assert_eq!(wide.len(), 1);
        assert_eq!(wide[0].identifier, "button_wide");
    }

    #[test]
    fn in_region_requires_positive_area_overlap() {
        let registry = registry_with(&[
            ("inside", Rect::new(10.0, 10.0, 20.0, 20.0)),
            ("touching", Rect::new(100.0, 0.0, 20.0, 20.0)),
            ("outside", Rect::new(500.0, 500.0, 20.0, 20.0)),
        ]);
        let hits = registry.in_region(Rect::new(0.0, 0.0, 100.0, 100.0));
        let ids: Vec<_> = hits.iter().map(|e| e.identifier.as_str()).collect();
        assert_eq!(ids, vec!["inside"]);
    }

    #[test]
    fn matching_is_case_insensitive_search() {
        let registry = registry_with(&[
            ("button_primary_save", unit_rect()),
            ("button_secondary_cancel", unit_rect()),
            ("textfield_email", unit_rect()),
        ]);

        let mut hits = registry.matching("BUTTON_.*");
        hits.sort();
        assert_eq!(hits, vec!["button_primary_save", "button_secondary_cancel"]);

        // Search, not full-match: a mid-string fragment hits too.
        let hits = registry.matching("econdary");
        assert_eq!(hits, vec!["button_secondary_cancel"]);
    }

    #[test]
    fn invalid_pattern_is_fail_soft() {
        let registry = registry_with(&[("button_save", unit_rect())]);
        assert!(registry.matching("button_(").is_empty());
    }

    #[test]
    fn try_matching_surfaces_pattern_errors() {
        let registry = registry_with(&[("button_save", unit_rect())]);
        let err = registry.try_matching("button_(").unwrap_err();
        assert!(matches!(err, RegistryError::PatternError { .. }));
    }

    #[test]
    fn queries_on_empty_registry_return_empty() {
        let registry = ElementRegistry::new();
        assert!(registry.find("anything").is_none());
        assert!(registry.filter(|_| true).is_empty());
        assert!(registry.in_region(unit_rect()).is_empty());
        assert!(registry.matching(".*").is_empty());
    }
}
