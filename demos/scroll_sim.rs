//! Scrolls a simulated page through a `scrolly` section and prints what the engine writes.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use kurbo::{Rect, Size, Vec2};
use scrollfx::{
    ComponentRegistry, CssValue, DeclaredValue, DeclaredValues, ElementId, EventKind,
    EventTarget, Host, LiveComponent, OptionValue, PageEvent, ProgressEvent, ScrollRange,
    ScrollRangeOptions, handler,
};

const ROOT: ElementId = ElementId(1);
const BODY: ElementId = ElementId(2);
const SECTION: ElementId = ElementId(3);
const LOGO: ElementId = ElementId(4);

/// One section at document offset 1200 with one animated child.
struct SimPage {
    scroll_top: Cell<f64>,
    styles: RefCell<BTreeMap<(ElementId, String), String>>,
}

impl SimPage {
    fn new() -> Self {
        Self {
            scroll_top: Cell::new(0.0),
            styles: RefCell::new(BTreeMap::new()),
        }
    }

    fn doc_rect(&self, element: ElementId) -> Rect {
        match element {
            SECTION => Rect::new(0.0, 1200.0, 960.0, 1600.0),
            LOGO => Rect::new(40.0, 1240.0, 200.0, 1320.0),
            _ => Rect::ZERO,
        }
    }
}

impl Host for SimPage {
    fn root(&self) -> ElementId {
        ROOT
    }

    fn page_scrolling_element(&self) -> ElementId {
        BODY
    }

    fn contains(&self, _element: ElementId) -> bool {
        true
    }

    fn bounding_rect(&self, element: ElementId) -> Rect {
        self.doc_rect(element) - Vec2::new(0.0, self.scroll_top.get())
    }

    fn client_size(&self, element: ElementId) -> Size {
        match element {
            ROOT | BODY => Size::new(960.0, 720.0),
            _ => self.doc_rect(element).size(),
        }
    }

    fn offset_size(&self, element: ElementId) -> Size {
        self.client_size(element)
    }

    fn scroll_offset(&self, element: ElementId) -> Vec2 {
        if element == BODY {
            Vec2::new(0.0, self.scroll_top.get())
        } else {
            Vec2::ZERO
        }
    }

    fn closest(&self, _element: ElementId, _selector: &str) -> Option<ElementId> {
        None
    }

    fn find(&self, element: ElementId, selector: &str) -> Vec<ElementId> {
        match (element, selector) {
            (SECTION, "find(.scrolly-fx)") => vec![LOGO],
            _ => Vec::new(),
        }
    }

    fn matches(&self, _element: ElementId, _selector: &str) -> bool {
        false
    }

    fn query_selector(&self, _element: ElementId, _selector: &str) -> Option<ElementId> {
        None
    }

    fn computed_value(&self, _element: ElementId, property: &str) -> Option<CssValue> {
        match property {
            "opacity" => Some(CssValue::Number(0.0)),
            _ => None,
        }
    }

    fn declared_values(&self, element: ElementId) -> DeclaredValues {
        let mut values = DeclaredValues::new();
        if element == LOGO {
            values.insert("opacity".into(), DeclaredValue::new(1.0));
            values.insert(
                "transform".into(),
                DeclaredValue::with_start("rotate(0deg)", "rotate(10deg)"),
            );
            values.insert("to".into(), DeclaredValue::new(0.5));
            values.insert("easing".into(), DeclaredValue::new("ease-out"));
        }
        values
    }

    fn declared_values_changed(&self, _element: ElementId) -> bool {
        false
    }

    fn is_style_property(&self, _element: ElementId, _property: &str) -> bool {
        true
    }

    fn set_style(&self, element: ElementId, property: &str, value: &str) {
        let mut styles = self.styles.borrow_mut();
        if value.is_empty() {
            styles.remove(&(element, property.to_string()));
        } else {
            styles.insert((element, property.to_string()), value.to_string());
        }
    }

    fn set_property(&self, _element: ElementId, _property: &str, _value: &CssValue) {}

    fn toggle_class(&self, element: ElementId, class: &str, on: bool) {
        println!("  {element} class {class} = {on}");
    }

    fn add_listener(&self, target: EventTarget, kind: EventKind) {
        println!("  listen {kind:?} on {target:?}");
    }

    fn remove_listener(&self, target: EventTarget, kind: EventKind) {
        println!("  unlisten {kind:?} on {target:?}");
    }

    fn observe_mutations(&self, _element: ElementId, _subtree: bool) {}

    fn unobserve_mutations(&self, _element: ElementId, _subtree: bool) {}

    fn observe_layout(&self, _element: ElementId) {}

    fn unobserve_layout(&self, _element: ElementId) {}
}

fn main() -> scrollfx::Result<()> {
    let page = SimPage::new();

    let mut registry = ComponentRegistry::new();
    ScrollRange::register(&mut registry);

    // Declarative mount, as a host would do for `data-module="scrolly"`.
    let options = vec![
        ("from".to_string(), OptionValue::from("-50eh")),
        ("to".to_string(), OptionValue::from("100vh - 50eh")),
    ];
    let mut mounted = registry.create("scrolly", &page, SECTION, &options, 0)?;
    mounted.attached(&page, 0);

    // Direct construction, for code that composes a range.
    let opts = ScrollRangeOptions::default().with_range("0px", "100vh")?;
    let mut range = ScrollRange::new(&page, SECTION, opts, 0)?;
    range.on_progress().add(handler(|_: &dyn Host, e: &ProgressEvent| {
        println!("  progress {:.3}", e.progress);
    }));

    let mut now_ms = 0;
    for step in 0..=12 {
        now_ms += 16;
        page.scroll_top.set(f64::from(step) * 150.0);
        println!("scroll_top={}", page.scroll_top.get());

        mounted.handle_event(&page, &PageEvent::Scroll(EventTarget::Window), now_ms)?;
        mounted.run_frame(&page, now_ms)?;
        range.on_scroll(&page, now_ms)?;
        range.run_frame(&page, now_ms)?;

        for ((element, property), value) in page.styles.borrow().iter() {
            println!("  {element} {property}: {value}");
        }
    }

    mounted.destroy(&page);
    range.destroy(&page);
    Ok(())
}
