//! Viewport position change detection: page scroll offset plus the element's bounding box.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::callbacks::{Callbacks, Handler, fire_all, handler};
use crate::layout::{LayoutChange, LayoutHandler, LayoutObserver};
use crate::{ElementId, Host};

/// Page scroll offset and the element's viewport-relative box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollSnapshot {
    pub scroll_top: f64,
    pub scroll_left: f64,
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl ScrollSnapshot {
    pub fn read(host: &dyn Host, element: ElementId) -> Self {
        let scroll = host.scroll_offset(host.page_scrolling_element());
        let rect = host.bounding_rect(element);
        Self {
            scroll_top: scroll.y,
            scroll_left: scroll.x,
            top: rect.y0,
            left: rect.x0,
            bottom: rect.y1,
            right: rect.x1,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScrollPositionEvent {
    pub target: ElementId,
    pub value: ScrollSnapshot,
    pub prev_value: ScrollSnapshot,
}

pub type ScrollPositionHandler = Handler<ScrollPositionEvent>;

struct PositionRecord {
    // Read on first use, not on subscription.
    value: Option<ScrollSnapshot>,
    cbs: Callbacks<ScrollPositionEvent>,
    layout_handler: LayoutHandler,
}

type RecordTable = RefCell<HashMap<ElementId, PositionRecord>>;

pub struct ScrollPositionDetector {
    layout: Rc<LayoutObserver>,
    records: Rc<RecordTable>,
}

impl ScrollPositionDetector {
    pub fn new(layout: Rc<LayoutObserver>) -> Self {
        Self {
            layout,
            records: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    pub fn add(&self, host: &dyn Host, element: ElementId, handler: ScrollPositionHandler) {
        let mut records = self.records.borrow_mut();
        let record = records.entry(element).or_insert_with(|| {
            let layout_handler = layout_handler(Rc::downgrade(&self.records));
            self.layout.add(host, element, Rc::clone(&layout_handler));
            PositionRecord {
                value: None,
                cbs: Callbacks::new(),
                layout_handler,
            }
        });
        record.cbs.add(handler);
    }

    pub fn remove(&self, host: &dyn Host, element: ElementId, handler: &ScrollPositionHandler) {
        let removed = {
            let mut records = self.records.borrow_mut();
            let Some(record) = records.get_mut(&element) else {
                return;
            };
            record.cbs.remove(handler);
            if record.cbs.has() {
                None
            } else {
                records.remove(&element)
            }
        };
        if let Some(record) = removed {
            self.layout.remove(host, element, &record.layout_handler);
        }
    }

    /// The cached snapshot of an observed element, reading it if nothing is cached yet.
    ///
    /// Returns `None` for unobserved elements without touching the host.
    pub fn value(&self, host: &dyn Host, element: ElementId) -> Option<ScrollSnapshot> {
        let mut records = self.records.borrow_mut();
        let record = records.get_mut(&element)?;
        Some(
            *record
                .value
                .get_or_insert_with(|| ScrollSnapshot::read(host, element)),
        )
    }

    pub fn is_observed(&self, element: ElementId) -> bool {
        self.records.borrow().contains_key(&element)
    }
}

fn layout_handler(records: Weak<RecordTable>) -> LayoutHandler {
    handler(move |host: &dyn Host, change: &LayoutChange| {
        let Some(records) = records.upgrade() else {
            return;
        };
        check_position(&records, host, change.target);
    })
}

fn check_position(records: &RecordTable, host: &dyn Host, target: ElementId) {
    let fired = {
        let mut table = records.borrow_mut();
        let Some(record) = table.get_mut(&target) else {
            return;
        };
        let value = ScrollSnapshot::read(host, target);
        let prev_value = *record.value.get_or_insert(value);
        if prev_value == value {
            return;
        }
        record.value = Some(value);
        (record.cbs.snapshot(), value, prev_value)
    };
    let (handlers, value, prev_value) = fired;
    fxtrace!(
        %target,
        top = value.top,
        scroll_top = value.scroll_top,
        "ScrollPositionDetector: moved"
    );
    fire_all(
        &handlers,
        host,
        &ScrollPositionEvent {
            target,
            value,
            prev_value,
        },
    );
}
