//! Child-list mutation notifications filtered by selector.
//!
//! Each element gets at most one native observer per [`ObserverMode`]. Subscriptions sharing a
//! mode are grouped by `(selector, only_matches)`, and a group fires at most once per delivered
//! batch of records, however many records are relevant to it.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::callbacks::{Callbacks, Handler, fire_all};
use crate::{ElementId, Host};

/// Selector matching every node.
pub const ANY_SELECTOR: &str = "*";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutateOptions {
    /// Selector looked for in added and removed nodes.
    pub selector: String,
    /// Only test added/removed nodes themselves, not their descendants.
    pub only_matches: bool,
    /// Only observe direct children instead of the whole subtree.
    pub only_childs: bool,
}

impl MutateOptions {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            ..Self::default()
        }
    }

    pub fn with_only_matches(mut self, only_matches: bool) -> Self {
        self.only_matches = only_matches;
        self
    }

    pub fn with_only_childs(mut self, only_childs: bool) -> Self {
        self.only_childs = only_childs;
        self
    }

    fn mode(&self) -> ObserverMode {
        if self.only_childs {
            ObserverMode::ChildList
        } else {
            ObserverMode::Subtree
        }
    }

    fn normalized_selector(&self) -> &str {
        match self.selector.trim() {
            "" => ANY_SELECTOR,
            s => s,
        }
    }
}

impl Default for MutateOptions {
    fn default() -> Self {
        Self {
            selector: ANY_SELECTOR.into(),
            only_matches: false,
            only_childs: false,
        }
    }
}

/// How far below the element a native observer reaches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObserverMode {
    ChildList,
    Subtree,
}

impl ObserverMode {
    pub fn is_subtree(self) -> bool {
        matches!(self, Self::Subtree)
    }
}

/// One native child-list record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MutationRecord {
    pub added: Vec<ElementId>,
    pub removed: Vec<ElementId>,
}

impl MutationRecord {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationEvent {
    pub target: ElementId,
    /// The whole batch, including records that were not relevant to this subscriber.
    pub records: Vec<MutationRecord>,
}

pub type MutateHandler = Handler<MutationEvent>;

#[derive(Debug)]
struct SelectorGroup {
    selector: String,
    only_matches: bool,
    cbs: Callbacks<MutationEvent>,
}

impl SelectorGroup {
    fn is_relevant(&self, host: &dyn Host, record: &MutationRecord) -> bool {
        self.any_relevant(host, &record.added) || self.any_relevant(host, &record.removed)
    }

    fn any_relevant(&self, host: &dyn Host, nodes: &[ElementId]) -> bool {
        if self.selector == ANY_SELECTOR {
            return !nodes.is_empty();
        }
        nodes.iter().any(|&node| {
            host.matches(node, &self.selector)
                || (!self.only_matches && host.query_selector(node, &self.selector).is_some())
        })
    }
}

#[derive(Debug, Default)]
struct ModeRecord {
    groups: Vec<SelectorGroup>,
}

impl ModeRecord {
    /// Every group listens for `*`, so record contents do not matter.
    fn everything(&self) -> bool {
        self.groups.iter().all(|g| g.selector == ANY_SELECTOR)
    }
}

/// Selector-filtered mutation subscriptions, keyed by element and observer mode.
#[derive(Debug, Default)]
pub struct MutationDetector {
    records: RefCell<HashMap<(ElementId, ObserverMode), ModeRecord>>,
}

impl MutationDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &self,
        host: &dyn Host,
        element: ElementId,
        handler: MutateHandler,
        options: &MutateOptions,
    ) {
        let mode = options.mode();
        let selector = options.normalized_selector();
        let mut records = self.records.borrow_mut();
        let record = records.entry((element, mode)).or_insert_with(|| {
            fxtrace!(%element, subtree = mode.is_subtree(), "MutationDetector: observe");
            host.observe_mutations(element, mode.is_subtree());
            ModeRecord::default()
        });
        let pos = match record
            .groups
            .iter()
            .position(|g| g.selector == selector && g.only_matches == options.only_matches)
        {
            Some(pos) => pos,
            None => {
                record.groups.push(SelectorGroup {
                    selector: selector.into(),
                    only_matches: options.only_matches,
                    cbs: Callbacks::new(),
                });
                record.groups.len() - 1
            }
        };
        record.groups[pos].cbs.add(handler);
    }

    pub fn remove(
        &self,
        host: &dyn Host,
        element: ElementId,
        handler: &MutateHandler,
        options: &MutateOptions,
    ) {
        let mode = options.mode();
        let selector = options.normalized_selector();
        let mut records = self.records.borrow_mut();
        let Some(record) = records.get_mut(&(element, mode)) else {
            return;
        };
        let Some(pos) = record
            .groups
            .iter()
            .position(|g| g.selector == selector && g.only_matches == options.only_matches)
        else {
            return;
        };
        record.groups[pos].cbs.remove(handler);
        if !record.groups[pos].cbs.has() {
            record.groups.remove(pos);
        }
        if record.groups.is_empty() {
            fxtrace!(%element, subtree = mode.is_subtree(), "MutationDetector: disconnect");
            records.remove(&(element, mode));
            host.unobserve_mutations(element, mode.is_subtree());
        }
    }

    pub fn is_observed(&self, element: ElementId, mode: ObserverMode) -> bool {
        self.records.borrow().contains_key(&(element, mode))
    }

    /// Delivers a batch from the native observer registered for `(element, subtree)`.
    pub fn dispatch(
        &self,
        host: &dyn Host,
        element: ElementId,
        subtree: bool,
        records: &[MutationRecord],
    ) {
        let mode = if subtree {
            ObserverMode::Subtree
        } else {
            ObserverMode::ChildList
        };
        let handlers = {
            let table = self.records.borrow();
            let Some(record) = table.get(&(element, mode)) else {
                return;
            };
            if record.everything() {
                if records.iter().all(MutationRecord::is_empty) {
                    return;
                }
                record
                    .groups
                    .iter()
                    .map(|g| g.cbs.snapshot())
                    .collect::<Vec<_>>()
            } else {
                let mut called = vec![false; record.groups.len()];
                let mut handlers = Vec::new();
                for mutation in records {
                    for (i, group) in record.groups.iter().enumerate() {
                        if !called[i] && group.is_relevant(host, mutation) {
                            called[i] = true;
                            handlers.push(group.cbs.snapshot());
                        }
                    }
                }
                handlers
            }
        };
        if handlers.is_empty() {
            return;
        }
        let event = MutationEvent {
            target: element,
            records: records.to_vec(),
        };
        for group in handlers {
            fire_all(&group, host, &event);
        }
    }
}
