//! Element size change detection on top of [`LayoutObserver`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use kurbo::Size;

use crate::callbacks::{Callbacks, Handler, fire_all, handler};
use crate::layout::{LayoutChange, LayoutHandler, LayoutObserver};
use crate::{ElementId, Host};

/// Which list a resize subscription belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResizeScope {
    /// Any dimension changed.
    Any,
    Width,
    Height,
}

/// Subscription options. Neither flag set means [`ResizeScope::Any`]; each set flag adds the
/// handler to that dimension's list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResizeOptions {
    pub width: bool,
    pub height: bool,
}

impl ResizeOptions {
    pub fn width() -> Self {
        Self {
            width: true,
            height: false,
        }
    }

    pub fn height() -> Self {
        Self {
            width: false,
            height: true,
        }
    }

    /// The lists a subscription goes on. Both flags set means both dimension lists.
    fn scopes(self) -> impl Iterator<Item = ResizeScope> {
        let any = !self.width && !self.height;
        [
            (self.height, ResizeScope::Height),
            (self.width, ResizeScope::Width),
            (any, ResizeScope::Any),
        ]
        .into_iter()
        .filter_map(|(set, scope)| set.then_some(scope))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResizeEvent {
    pub target: ElementId,
    pub original_event: LayoutChange,
    /// The list being fired.
    pub kind: ResizeScope,
    /// Content box width.
    pub width: f64,
    /// Content box height.
    pub height: f64,
    /// Border box width.
    pub offset_width: f64,
    /// Border box height.
    pub offset_height: f64,
}

pub type ResizeHandler = Handler<ResizeEvent>;

struct ResizeSnapshot {
    client: Size,
    offset: Size,
    cbs: Callbacks<ResizeEvent>,
    width_cbs: Callbacks<ResizeEvent>,
    height_cbs: Callbacks<ResizeEvent>,
    layout_handler: LayoutHandler,
}

impl ResizeSnapshot {
    fn list_mut(&mut self, scope: ResizeScope) -> &mut Callbacks<ResizeEvent> {
        match scope {
            ResizeScope::Any => &mut self.cbs,
            ResizeScope::Width => &mut self.width_cbs,
            ResizeScope::Height => &mut self.height_cbs,
        }
    }

    fn is_unused(&self) -> bool {
        !(self.cbs.has() || self.width_cbs.has() || self.height_cbs.has())
    }
}

type SnapshotTable = RefCell<HashMap<ElementId, ResizeSnapshot>>;

/// Fires width/height/any callbacks when an element's content or border box changes.
///
/// When both dimensions changed in one tick, lists fire in the order height, width, any.
pub struct ResizeDetector {
    layout: Rc<LayoutObserver>,
    snapshots: Rc<SnapshotTable>,
}

impl ResizeDetector {
    pub fn new(layout: Rc<LayoutObserver>) -> Self {
        Self {
            layout,
            snapshots: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    pub fn add(
        &self,
        host: &dyn Host,
        element: ElementId,
        handler: ResizeHandler,
        options: ResizeOptions,
    ) {
        let mut snapshots = self.snapshots.borrow_mut();
        let snapshot = snapshots.entry(element).or_insert_with(|| {
            let layout_handler = layout_handler(Rc::downgrade(&self.snapshots));
            self.layout.add(host, element, Rc::clone(&layout_handler));
            ResizeSnapshot {
                client: host.client_size(element),
                offset: host.offset_size(element),
                cbs: Callbacks::new(),
                width_cbs: Callbacks::new(),
                height_cbs: Callbacks::new(),
                layout_handler,
            }
        });
        for scope in options.scopes() {
            snapshot.list_mut(scope).add(Rc::clone(&handler));
        }
    }

    pub fn remove(
        &self,
        host: &dyn Host,
        element: ElementId,
        handler: &ResizeHandler,
        options: ResizeOptions,
    ) {
        let removed = {
            let mut snapshots = self.snapshots.borrow_mut();
            let Some(snapshot) = snapshots.get_mut(&element) else {
                return;
            };
            for scope in options.scopes() {
                snapshot.list_mut(scope).remove(handler);
            }
            if snapshot.is_unused() {
                snapshots.remove(&element)
            } else {
                None
            }
        };
        if let Some(snapshot) = removed {
            self.layout.remove(host, element, &snapshot.layout_handler);
        }
    }

    pub fn is_observed(&self, element: ElementId) -> bool {
        self.snapshots.borrow().contains_key(&element)
    }

    /// The last recorded `(content box, border box)` sizes of an observed element.
    pub fn last_size(&self, element: ElementId) -> Option<(Size, Size)> {
        self.snapshots
            .borrow()
            .get(&element)
            .map(|s| (s.client, s.offset))
    }
}

fn layout_handler(snapshots: Weak<SnapshotTable>) -> LayoutHandler {
    handler(move |host: &dyn Host, change: &LayoutChange| {
        let Some(snapshots) = snapshots.upgrade() else {
            return;
        };
        check_size(&snapshots, host, change);
    })
}

fn check_size(snapshots: &SnapshotTable, host: &dyn Host, change: &LayoutChange) {
    let target = change.target;
    let (fires, client, offset) = {
        let mut table = snapshots.borrow_mut();
        let Some(snapshot) = table.get_mut(&target) else {
            return;
        };
        let client = host.client_size(target);
        let offset = host.offset_size(target);

        let width_changed = client.width != snapshot.client.width
            || offset.width != snapshot.offset.width;
        let height_changed = client.height != snapshot.client.height
            || offset.height != snapshot.offset.height;
        if !width_changed && !height_changed {
            return;
        }
        snapshot.client = client;
        snapshot.offset = offset;

        let mut fires = Vec::with_capacity(3);
        if height_changed {
            fires.push((ResizeScope::Height, snapshot.height_cbs.snapshot()));
        }
        if width_changed {
            fires.push((ResizeScope::Width, snapshot.width_cbs.snapshot()));
        }
        fires.push((ResizeScope::Any, snapshot.cbs.snapshot()));
        (fires, client, offset)
    };

    fxtrace!(
        %target,
        width = client.width,
        height = client.height,
        "ResizeDetector: size changed"
    );

    for (kind, handlers) in fires {
        if handlers.is_empty() {
            continue;
        }
        let event = ResizeEvent {
            target,
            original_event: change.clone(),
            kind,
            width: client.width,
            height: client.height,
            offset_width: offset.width,
            offset_height: offset.height,
        };
        fire_all(&handlers, host, &event);
    }
}
