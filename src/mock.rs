//! An in-memory [`Host`] for tests.
//!
//! Element rects are stored in document coordinates and reported relative to the page scroll
//! offset, the way `getBoundingClientRect` behaves for in-flow elements.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use kurbo::{Rect, Size, Vec2};

use crate::{CssValue, DeclaredValues, ElementId, EventKind, EventTarget, Host};

pub const ROOT: ElementId = ElementId(1);
pub const BODY: ElementId = ElementId(2);

#[derive(Clone, Debug, PartialEq)]
pub enum Write {
    Style(ElementId, String, String),
    Property(ElementId, String, CssValue),
    Class(ElementId, String, bool),
}

#[derive(Clone, Debug, Default)]
pub struct MockElement {
    pub parent: Option<ElementId>,
    pub doc_rect: Rect,
    pub client: Size,
    pub offset: Size,
    pub scroll: Vec2,
    pub selectors: BTreeSet<String>,
    pub computed: BTreeMap<String, CssValue>,
    pub declared: DeclaredValues,
    pub declared_changed: bool,
    pub styles: BTreeMap<String, String>,
    pub properties: BTreeMap<String, CssValue>,
    pub classes: BTreeSet<String>,
    pub detached: bool,
}

pub struct MockHost {
    elements: RefCell<HashMap<ElementId, MockElement>>,
    next_id: Cell<u64>,
    pub listeners: RefCell<Vec<(EventTarget, EventKind)>>,
    pub mutation_observers: RefCell<Vec<(ElementId, bool)>>,
    pub layout_observers: RefCell<Vec<ElementId>>,
    pub writes: RefCell<Vec<Write>>,
    plain_properties: BTreeSet<String>,
}

impl MockHost {
    /// A page with an 1000x800 viewport.
    pub fn new() -> Self {
        let host = Self {
            elements: RefCell::new(HashMap::new()),
            next_id: Cell::new(10),
            listeners: RefCell::new(Vec::new()),
            mutation_observers: RefCell::new(Vec::new()),
            layout_observers: RefCell::new(Vec::new()),
            writes: RefCell::new(Vec::new()),
            plain_properties: ["value", "scrollLeft"].into_iter().map(String::from).collect(),
        };
        let viewport = Size::new(1000.0, 800.0);
        host.elements.borrow_mut().insert(
            ROOT,
            MockElement {
                client: viewport,
                offset: viewport,
                ..MockElement::default()
            },
        );
        host.elements.borrow_mut().insert(
            BODY,
            MockElement {
                parent: Some(ROOT),
                client: viewport,
                offset: viewport,
                ..MockElement::default()
            },
        );
        host
    }

    /// Adds an element under `parent` with a document-relative rect. Client and offset sizes
    /// default to the rect size.
    pub fn add(&self, parent: ElementId, doc_rect: Rect) -> ElementId {
        let id = ElementId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.elements.borrow_mut().insert(
            id,
            MockElement {
                parent: Some(parent),
                doc_rect,
                client: doc_rect.size(),
                offset: doc_rect.size(),
                ..MockElement::default()
            },
        );
        id
    }

    pub fn with<R>(&self, id: ElementId, f: impl FnOnce(&mut MockElement) -> R) -> R {
        let mut elements = self.elements.borrow_mut();
        f(elements.get_mut(&id).expect("unknown mock element"))
    }

    pub fn add_selector(&self, id: ElementId, selector: &str) {
        self.with(id, |e| e.selectors.insert(selector.into()));
    }

    pub fn set_page_scroll(&self, top: f64) {
        self.with(BODY, |e| e.scroll = Vec2::new(0.0, top));
    }

    pub fn set_doc_rect(&self, id: ElementId, rect: Rect) {
        self.with(id, |e| e.doc_rect = rect);
    }

    pub fn set_client_size(&self, id: ElementId, size: Size) {
        self.with(id, |e| e.client = size);
    }

    pub fn set_declared(&self, id: ElementId, declared: DeclaredValues) {
        self.with(id, |e| {
            e.declared = declared;
            e.declared_changed = true;
        });
    }

    pub fn set_computed(&self, id: ElementId, property: &str, value: impl Into<CssValue>) {
        self.with(id, |e| e.computed.insert(property.into(), value.into()));
    }

    pub fn style(&self, id: ElementId, property: &str) -> Option<String> {
        self.elements.borrow()[&id].styles.get(property).cloned()
    }

    pub fn property(&self, id: ElementId, property: &str) -> Option<CssValue> {
        self.elements.borrow()[&id].properties.get(property).cloned()
    }

    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.elements.borrow()[&id].classes.contains(class)
    }

    pub fn listener_count(&self, target: EventTarget, kind: EventKind) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|l| **l == (target, kind))
            .count()
    }

    pub fn write_count(&self) -> usize {
        self.writes.borrow().len()
    }

    fn is_descendant(&self, id: ElementId, ancestor: ElementId) -> bool {
        let elements = self.elements.borrow();
        let mut cur = elements.get(&id).and_then(|e| e.parent);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = elements.get(&p).and_then(|e| e.parent);
        }
        false
    }

    fn descendants(&self, id: ElementId, selector: &str) -> Vec<ElementId> {
        let mut ids: Vec<ElementId> = self
            .elements
            .borrow()
            .keys()
            .copied()
            .filter(|&e| self.is_descendant(e, id) && self.matches(e, selector))
            .collect();
        ids.sort();
        ids
    }
}

impl Host for MockHost {
    fn root(&self) -> ElementId {
        ROOT
    }

    fn page_scrolling_element(&self) -> ElementId {
        BODY
    }

    fn contains(&self, element: ElementId) -> bool {
        self.elements
            .borrow()
            .get(&element)
            .is_some_and(|e| !e.detached)
    }

    fn bounding_rect(&self, element: ElementId) -> Rect {
        let scroll = self.scroll_offset(BODY);
        let elements = self.elements.borrow();
        match elements.get(&element) {
            Some(e) if !e.detached => e.doc_rect - scroll,
            _ => Rect::ZERO,
        }
    }

    fn client_size(&self, element: ElementId) -> Size {
        self.elements
            .borrow()
            .get(&element)
            .map_or(Size::ZERO, |e| e.client)
    }

    fn offset_size(&self, element: ElementId) -> Size {
        self.elements
            .borrow()
            .get(&element)
            .map_or(Size::ZERO, |e| e.offset)
    }

    fn scroll_offset(&self, element: ElementId) -> Vec2 {
        self.elements
            .borrow()
            .get(&element)
            .map_or(Vec2::ZERO, |e| e.scroll)
    }

    fn closest(&self, element: ElementId, selector: &str) -> Option<ElementId> {
        let mut cur = Some(element);
        while let Some(id) = cur {
            if self.matches(id, selector) {
                return Some(id);
            }
            cur = self.elements.borrow().get(&id).and_then(|e| e.parent);
        }
        None
    }

    fn find(&self, element: ElementId, selector: &str) -> Vec<ElementId> {
        match selector
            .strip_prefix("find(")
            .and_then(|s| s.strip_suffix(')'))
        {
            Some(inner) => self.descendants(element, inner),
            None => Vec::new(),
        }
    }

    fn matches(&self, element: ElementId, selector: &str) -> bool {
        selector == "*"
            || self
                .elements
                .borrow()
                .get(&element)
                .is_some_and(|e| e.selectors.contains(selector))
    }

    fn query_selector(&self, element: ElementId, selector: &str) -> Option<ElementId> {
        self.descendants(element, selector).into_iter().next()
    }

    fn computed_value(&self, element: ElementId, property: &str) -> Option<CssValue> {
        self.elements
            .borrow()
            .get(&element)
            .and_then(|e| e.computed.get(property).cloned())
    }

    fn declared_values(&self, element: ElementId) -> DeclaredValues {
        self.with(element, |e| {
            e.declared_changed = false;
            e.declared.clone()
        })
    }

    fn declared_values_changed(&self, element: ElementId) -> bool {
        self.elements
            .borrow()
            .get(&element)
            .is_some_and(|e| e.declared_changed)
    }

    fn is_style_property(&self, _element: ElementId, property: &str) -> bool {
        !self.plain_properties.contains(property)
    }

    fn set_style(&self, element: ElementId, property: &str, value: &str) {
        self.with(element, |e| {
            if value.is_empty() {
                e.styles.remove(property);
            } else {
                e.styles.insert(property.into(), value.into());
            }
        });
        self.writes
            .borrow_mut()
            .push(Write::Style(element, property.into(), value.into()));
    }

    fn set_property(&self, element: ElementId, property: &str, value: &CssValue) {
        self.with(element, |e| e.properties.insert(property.into(), value.clone()));
        self.writes
            .borrow_mut()
            .push(Write::Property(element, property.into(), value.clone()));
    }

    fn toggle_class(&self, element: ElementId, class: &str, on: bool) {
        self.with(element, |e| {
            if on {
                e.classes.insert(class.into());
            } else {
                e.classes.remove(class);
            }
        });
        self.writes
            .borrow_mut()
            .push(Write::Class(element, class.into(), on));
    }

    fn add_listener(&self, target: EventTarget, kind: EventKind) {
        self.listeners.borrow_mut().push((target, kind));
    }

    fn remove_listener(&self, target: EventTarget, kind: EventKind) {
        let mut listeners = self.listeners.borrow_mut();
        if let Some(pos) = listeners.iter().position(|l| *l == (target, kind)) {
            listeners.remove(pos);
        }
    }

    fn observe_mutations(&self, element: ElementId, subtree: bool) {
        self.mutation_observers.borrow_mut().push((element, subtree));
    }

    fn unobserve_mutations(&self, element: ElementId, subtree: bool) {
        self.mutation_observers
            .borrow_mut()
            .retain(|o| *o != (element, subtree));
    }

    fn observe_layout(&self, element: ElementId) {
        self.layout_observers.borrow_mut().push(element);
    }

    fn unobserve_layout(&self, element: ElementId) {
        self.layout_observers.borrow_mut().retain(|e| *e != element);
    }
}
