//! Automation callback interface.
//!
//! The facade resolves identifiers to coordinates; something else performs
//! the actual gesture (a test driver, an OS event injector, a remote
//! agent). That something registers hooks here. All methods default to
//! no-ops: an absent or partial implementation is normal, not an error.

use crate::geometry::Point;

/// Side-effect callbacks invoked by the automation facade.
///
/// Implementations must be cheap and non-blocking; they run inline on the
/// caller of the facade operation.
pub trait AutomationHooks: Send + Sync {
    /// A tap was requested at the element's center point.
    fn on_element_tap(&self, _identifier: &str, _point: Point) {}

    /// Text input was requested for the element. Receives the raw text;
    /// only the facade's log event is length-redacted.
    fn on_text_input(&self, _identifier: &str, _text: &str) {}

    /// A coordinate-based swipe was requested.
    fn on_swipe(&self, _from: Point, _to: Point) {}
}
