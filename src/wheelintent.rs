//! Wheel events that the user meant for an element.
//!
//! A wheel event is forwarded only after the pointer entered the element and then moved more than
//! [`WHEEL_INTENT_THRESHOLD`] pixels (in either axis) from the entry point. Wheel events arriving
//! while the element merely scrolls underneath a resting pointer never reach subscribers.
//!
//! The detector mirrors its state onto host listeners: `mouseenter`/`mouseleave` while armed,
//! `mousemove` while tracking, and `wheel` only once intent is confirmed.

use std::cell::RefCell;
use std::collections::HashMap;

use kurbo::{Point, Vec2};

use crate::callbacks::{Callbacks, Handler, fire_all};
use crate::{ElementId, EventKind, EventTarget, Host};

/// Pointer displacement from the entry point, in pixels, that confirms intent.
pub const WHEEL_INTENT_THRESHOLD: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WheelIntentState {
    /// No subscribers.
    Idle,
    /// Subscribed, pointer outside.
    Armed,
    /// Pointer inside, waiting for a deliberate move.
    Tracking,
    /// Wheel events are forwarded.
    IntentConfirmed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WheelEvent {
    pub target: ElementId,
    /// Pointer position in page coordinates.
    pub page: Point,
    pub delta: Vec2,
}

pub type WheelHandler = Handler<WheelEvent>;

#[derive(Debug)]
struct WheelRecord {
    state: WheelIntentState,
    entry: Option<Point>,
    cbs: Callbacks<WheelEvent>,
}

#[derive(Debug, Default)]
pub struct WheelIntent {
    records: RefCell<HashMap<ElementId, WheelRecord>>,
}

impl WheelIntent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, host: &dyn Host, element: ElementId, handler: WheelHandler) {
        let mut records = self.records.borrow_mut();
        let record = records.entry(element).or_insert_with(|| {
            let target = EventTarget::Element(element);
            host.add_listener(target, EventKind::MouseEnter);
            host.add_listener(target, EventKind::MouseLeave);
            WheelRecord {
                state: WheelIntentState::Armed,
                entry: None,
                cbs: Callbacks::new(),
            }
        });
        record.cbs.add(handler);
    }

    pub fn remove(&self, host: &dyn Host, element: ElementId, handler: &WheelHandler) {
        let mut records = self.records.borrow_mut();
        let Some(record) = records.get_mut(&element) else {
            return;
        };
        record.cbs.remove(handler);
        if record.cbs.has() {
            return;
        }
        let target = EventTarget::Element(element);
        match record.state {
            WheelIntentState::Tracking => host.remove_listener(target, EventKind::MouseMove),
            WheelIntentState::IntentConfirmed => host.remove_listener(target, EventKind::Wheel),
            WheelIntentState::Idle | WheelIntentState::Armed => {}
        }
        host.remove_listener(target, EventKind::MouseEnter);
        host.remove_listener(target, EventKind::MouseLeave);
        records.remove(&element);
    }

    pub fn state(&self, element: ElementId) -> WheelIntentState {
        self.records
            .borrow()
            .get(&element)
            .map_or(WheelIntentState::Idle, |r| r.state)
    }

    pub fn mouse_enter(&self, host: &dyn Host, element: ElementId, page: Point) {
        let mut records = self.records.borrow_mut();
        let Some(record) = records.get_mut(&element) else {
            return;
        };
        let target = EventTarget::Element(element);
        match record.state {
            WheelIntentState::IntentConfirmed => host.remove_listener(target, EventKind::Wheel),
            WheelIntentState::Tracking => return,
            WheelIntentState::Idle | WheelIntentState::Armed => {}
        }
        host.add_listener(target, EventKind::MouseMove);
        record.entry = Some(page);
        record.state = WheelIntentState::Tracking;
    }

    pub fn mouse_leave(&self, host: &dyn Host, element: ElementId) {
        let mut records = self.records.borrow_mut();
        let Some(record) = records.get_mut(&element) else {
            return;
        };
        let target = EventTarget::Element(element);
        match record.state {
            WheelIntentState::Tracking => host.remove_listener(target, EventKind::MouseMove),
            WheelIntentState::IntentConfirmed => host.remove_listener(target, EventKind::Wheel),
            WheelIntentState::Idle | WheelIntentState::Armed => {}
        }
        record.entry = None;
        record.state = WheelIntentState::Armed;
    }

    pub fn mouse_move(&self, host: &dyn Host, element: ElementId, page: Point) {
        let mut records = self.records.borrow_mut();
        let Some(record) = records.get_mut(&element) else {
            return;
        };
        if record.state != WheelIntentState::Tracking {
            return;
        }
        let Some(entry) = record.entry else {
            return;
        };
        let moved = page - entry;
        if moved.x.abs().max(moved.y.abs()) <= WHEEL_INTENT_THRESHOLD {
            return;
        }
        let target = EventTarget::Element(element);
        host.remove_listener(target, EventKind::MouseMove);
        host.add_listener(target, EventKind::Wheel);
        record.state = WheelIntentState::IntentConfirmed;
        fxtrace!(%element, "WheelIntent: intent confirmed");
    }

    /// Forwards a wheel event to subscribers if intent is confirmed. Returns whether it was.
    pub fn wheel(&self, host: &dyn Host, event: &WheelEvent) -> bool {
        let handlers = {
            let records = self.records.borrow();
            match records.get(&event.target) {
                Some(record) if record.state == WheelIntentState::IntentConfirmed => {
                    record.cbs.snapshot()
                }
                _ => return false,
            }
        };
        fire_all(&handlers, host, event);
        true
    }
}
