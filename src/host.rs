use kurbo::{Rect, Size, Vec2};

use crate::{CssValue, DeclaredValues, ElementId, EventKind, EventTarget};

/// The environment the engine runs against.
///
/// The engine does not own any UI objects. Everything it knows about elements comes through this
/// trait, and every visible effect (styles, classes, listeners) goes back through it. All methods
/// take `&self`; hosts with mutable state are expected to use interior mutability, the same way
/// DOM bindings expose mutation through shared handles.
///
/// Geometry follows the DOM conventions: bounding rects are viewport-relative, `y0` is the top
/// edge, and scroll offsets are `(scrollLeft, scrollTop)`.
pub trait Host {
    /// The viewport root whose client size defines `vw`/`vh`.
    fn root(&self) -> ElementId;

    /// The element whose scroll offset represents page scroll.
    fn page_scrolling_element(&self) -> ElementId;

    /// Whether scroll events for `element` are delivered to the window (true for `html`/`body`).
    fn scrolls_via_window(&self, element: ElementId) -> bool {
        element == self.page_scrolling_element() || element == self.root()
    }

    /// Whether `element` is part of the live document.
    fn contains(&self, element: ElementId) -> bool;

    fn bounding_rect(&self, element: ElementId) -> Rect;

    /// Content box size (`clientWidth`/`clientHeight`).
    fn client_size(&self, element: ElementId) -> Size;

    /// Border box size (`offsetWidth`/`offsetHeight`).
    fn offset_size(&self, element: ElementId) -> Size;

    /// `(scrollLeft, scrollTop)`.
    fn scroll_offset(&self, element: ElementId) -> Vec2;

    fn closest(&self, element: ElementId, selector: &str) -> Option<ElementId>;

    /// Resolves an element reference string such as `find(.item)` relative to `element`.
    fn find(&self, element: ElementId, selector: &str) -> Vec<ElementId>;

    fn matches(&self, element: ElementId, selector: &str) -> bool;

    fn query_selector(&self, element: ElementId, selector: &str) -> Option<ElementId>;

    /// Current computed value of a property: numeric when it parses as a number, text otherwise.
    fn computed_value(&self, element: ElementId, property: &str) -> Option<CssValue>;

    /// Declared end values (pseudo-element content merged with data attributes).
    fn declared_values(&self, element: ElementId) -> DeclaredValues;

    /// Whether the declared values changed since they were last read.
    fn declared_values_changed(&self, element: ElementId) -> bool;

    /// Whether `property` is a style property (as opposed to a plain element property).
    fn is_style_property(&self, element: ElementId, property: &str) -> bool;

    /// Writes an inline style; an empty value removes it.
    fn set_style(&self, element: ElementId, property: &str, value: &str);

    fn set_property(&self, element: ElementId, property: &str, value: &CssValue);

    fn toggle_class(&self, element: ElementId, class: &str, on: bool);

    fn add_listener(&self, target: EventTarget, kind: EventKind);

    fn remove_listener(&self, target: EventTarget, kind: EventKind);

    /// Starts native mutation observation of `element` (child list, optionally the subtree).
    fn observe_mutations(&self, element: ElementId, subtree: bool);

    fn unobserve_mutations(&self, element: ElementId, subtree: bool);

    /// Starts native size observation of `element`; results arrive as layout notifications.
    fn observe_layout(&self, element: ElementId);

    fn unobserve_layout(&self, element: ElementId);
}
