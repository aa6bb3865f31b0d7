//! Coalesced "this element's box may have changed" notifications.
//!
//! The host reports raw triggers (native resize observation, mutations, scrolling) through
//! [`LayoutObserver::notify`] as they happen. They are collected per element and delivered once
//! per frame from [`LayoutObserver::run_frame`], so a burst of triggers inside one frame costs a
//! single recomputation per subscriber.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::callbacks::{Callbacks, Handler, fire_all};
use crate::schedule::{FrameQueue, Phase};
use crate::{ElementId, Host};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayoutTrigger {
    Resize,
    Mutation,
    Scroll,
}

/// The set of triggers folded into one notification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutTriggers {
    pub resize: bool,
    pub mutation: bool,
    pub scroll: bool,
}

impl LayoutTriggers {
    pub fn insert(&mut self, trigger: LayoutTrigger) {
        match trigger {
            LayoutTrigger::Resize => self.resize = true,
            LayoutTrigger::Mutation => self.mutation = true,
            LayoutTrigger::Scroll => self.scroll = true,
        }
    }

    pub fn contains(&self, trigger: LayoutTrigger) -> bool {
        match trigger {
            LayoutTrigger::Resize => self.resize,
            LayoutTrigger::Mutation => self.mutation,
            LayoutTrigger::Scroll => self.scroll,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.resize || self.mutation || self.scroll)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutChange {
    pub target: ElementId,
    pub triggers: LayoutTriggers,
}

pub type LayoutHandler = Handler<LayoutChange>;

#[derive(Debug, Default)]
struct LayoutRecord {
    cbs: Callbacks<LayoutChange>,
    triggers: LayoutTriggers,
}

/// Per-element layout-change subscriptions.
///
/// Shared by reference (typically inside an `Rc`) between the host loop and the detectors built
/// on top of it. All state is behind `RefCell`s; no borrow is held while handlers run, so handlers
/// may subscribe or unsubscribe freely.
#[derive(Debug, Default)]
pub struct LayoutObserver {
    records: RefCell<HashMap<ElementId, LayoutRecord>>,
    queue: RefCell<FrameQueue<ElementId>>,
}

impl LayoutObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, host: &dyn Host, element: ElementId, handler: LayoutHandler) {
        let mut records = self.records.borrow_mut();
        let record = records.entry(element).or_insert_with(|| {
            fxtrace!(%element, "LayoutObserver: observe");
            host.observe_layout(element);
            LayoutRecord::default()
        });
        record.cbs.add(handler);
    }

    pub fn remove(&self, host: &dyn Host, element: ElementId, handler: &LayoutHandler) {
        let mut records = self.records.borrow_mut();
        let Some(record) = records.get_mut(&element) else {
            return;
        };
        record.cbs.remove(handler);
        if !record.cbs.has() {
            fxtrace!(%element, "LayoutObserver: unobserve");
            records.remove(&element);
            self.queue.borrow_mut().cancel(element);
            host.unobserve_layout(element);
        }
    }

    pub fn is_observed(&self, element: ElementId) -> bool {
        self.records.borrow().contains_key(&element)
    }

    /// Records a raw trigger. Triggers for unobserved elements are dropped.
    pub fn notify(&self, element: ElementId, trigger: LayoutTrigger) {
        let mut records = self.records.borrow_mut();
        let Some(record) = records.get_mut(&element) else {
            return;
        };
        record.triggers.insert(trigger);
        self.queue.borrow_mut().schedule(element, Phase::Read);
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.borrow().is_empty()
    }

    /// Delivers one [`LayoutChange`] per element notified since the previous frame.
    pub fn run_frame(&self, host: &dyn Host) {
        let frame = self.queue.borrow_mut().take_frame();
        for target in frame {
            let fired = {
                let mut records = self.records.borrow_mut();
                records.get_mut(&target).map(|record| {
                    let triggers = core::mem::take(&mut record.triggers);
                    (record.cbs.snapshot(), triggers)
                })
            };
            let Some((handlers, triggers)) = fired else {
                continue;
            };
            fire_all(&handlers, host, &LayoutChange { target, triggers });
        }
    }
}
