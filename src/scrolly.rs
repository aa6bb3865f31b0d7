//! The scroll-range controller.
//!
//! A [`ScrollRange`] maps the scroll position of its scrolling element onto a progress value for
//! one host element and keeps three boolean states in sync with it:
//! - `entered`: the position lies within `[min_scroll, max_scroll]`
//! - `prepare_entered`: the position lies within the range widened by `prepare_padding`
//! - `entered_fixed`: the position lies within the range widened by [`FIXED_HEADROOM`], while
//!   which the fixed sub-element (if any) is pinned with `position: fixed`
//!
//! Like the rest of the crate it holds no UI objects. The host forwards scroll and resize
//! events, calls [`ScrollRange::tick`] from its timer and [`ScrollRange::run_frame`] once per
//! animation frame, and passes `now_ms` into every entry point.

use crate::callbacks::{Callbacks, Handler};
use crate::childfx::{ChildAnimator, PROGRESS_UNSET};
use crate::options::{Once, ScrollRangeOptions};
use crate::registry::{ComponentRegistry, LiveComponent, PageEvent};
use crate::schedule::{FrameQueue, Interval, Jitter, Phase, Throttle};
use crate::state::ScrollRangeState;
use crate::template::format_number;
use crate::{ElementId, EventKind, EventTarget, Host, OptionValue, Result};

/// Extra distance around the range in which the fixed sub-element stays pinned.
pub const FIXED_HEADROOM: f64 = 666.0;

const CHECK_TIME_BASE_MS: u64 = 4000;
const CHECK_TIME_SPREAD_MS: u64 = 999;
const REFLOW_PERIOD_BASE_MS: u64 = 9999;
const REFLOW_PERIOD_SPREAD_MS: u64 = 5000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Task {
    /// Child reflow check followed by a layout recompute.
    Reflow,
    /// Periodic drift correction after the frame's writes.
    Relayout,
    Destroy,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressEvent {
    pub target: ElementId,
    pub progress: f64,
}

/// Fired whenever the in-range state flips.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeChange {
    pub target: ElementId,
    pub entered: bool,
}

pub type ProgressHandler = Handler<ProgressEvent>;
pub type RangeChangeHandler = Handler<RangeChange>;

/// Tracks how far an element has been scrolled through its activation range.
///
/// User modules compose a `ScrollRange` (and reach its [`ChildAnimator`] through
/// [`ScrollRange::animator`]) instead of extending it.
pub struct ScrollRange {
    element: ElementId,
    options: ScrollRangeOptions,
    state: ScrollRangeState,
    has_layout: bool,

    animator: ChildAnimator,

    scrolling_element: ElementId,
    scroll_source: Option<EventTarget>,
    listening_resize: bool,

    throttle: Throttle,
    reflow_interval: Interval,
    check_time_ms: u64,
    last_check_ms: u64,
    queue: FrameQueue<Task>,

    fixed_element: Option<ElementId>,
    fixed_top: Option<f64>,
    fixed_width: Option<f64>,

    destroyed: bool,

    on_progress: Callbacks<ProgressEvent>,
    on_change: Callbacks<RangeChange>,
}

impl ScrollRange {
    /// Binds the scroll listener and computes the initial layout.
    ///
    /// The window resize listener and the reflow timer are only installed by
    /// [`ScrollRange::attached`].
    pub fn new(
        host: &dyn Host,
        element: ElementId,
        options: ScrollRangeOptions,
        now_ms: u64,
    ) -> Result<Self> {
        let mut jitter = Jitter::new(options.seed.unwrap_or(element.0));
        let check_time_ms = jitter.spread(CHECK_TIME_BASE_MS, CHECK_TIME_SPREAD_MS);
        let reflow_interval =
            Interval::new(jitter.spread(REFLOW_PERIOD_BASE_MS, REFLOW_PERIOD_SPREAD_MS));

        let mut animator = ChildAnimator::new(options.child_selector());
        animator.set_switched_off(options.switched_off);

        let mut range = Self {
            element,
            throttle: Throttle::new(options.throttle_delay_ms),
            options,
            state: ScrollRangeState::default(),
            has_layout: false,
            animator,
            scrolling_element: host.page_scrolling_element(),
            scroll_source: None,
            listening_resize: false,
            reflow_interval,
            check_time_ms,
            last_check_ms: now_ms,
            queue: FrameQueue::new(),
            fixed_element: None,
            fixed_top: None,
            fixed_width: None,
            destroyed: false,
            on_progress: Callbacks::new(),
            on_change: Callbacks::new(),
        };

        range.bind_scroll_source(host);
        range.calculate_layout(host, now_ms)?;
        if range.options.switched_off {
            range.set_switched_off_class(host);
        }
        Ok(range)
    }

    /// Installs the `scrolly` factory.
    pub fn register(registry: &mut ComponentRegistry) {
        registry.register("scrolly", |host, element, options, now_ms| {
            let mut opts = ScrollRangeOptions::default();
            for (name, value) in options {
                opts.apply(name, value.clone())?;
            }
            let range = ScrollRange::new(host, element, opts, now_ms)?;
            Ok(Box::new(range) as Box<dyn LiveComponent>)
        });
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn options(&self) -> &ScrollRangeOptions {
        &self.options
    }

    pub fn state(&self) -> &ScrollRangeState {
        &self.state
    }

    pub fn progress(&self) -> f64 {
        self.state.progress
    }

    pub fn is_entered(&self) -> bool {
        self.state.entered
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn animator(&self) -> &ChildAnimator {
        &self.animator
    }

    pub fn animator_mut(&mut self) -> &mut ChildAnimator {
        &mut self.animator
    }

    /// The element whose scroll offset drives progress.
    pub fn scrolling_element(&self) -> ElementId {
        self.scrolling_element
    }

    /// Where the scroll listener is currently attached.
    pub fn scroll_source(&self) -> Option<EventTarget> {
        self.scroll_source
    }

    pub fn fixed_element(&self) -> Option<ElementId> {
        self.fixed_element
    }

    pub fn check_time_ms(&self) -> u64 {
        self.check_time_ms
    }

    pub fn reflow_period_ms(&self) -> u64 {
        self.reflow_interval.period_ms()
    }

    pub fn has_pending_frame(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn on_progress(&mut self) -> &mut Callbacks<ProgressEvent> {
        &mut self.on_progress
    }

    pub fn on_change(&mut self) -> &mut Callbacks<RangeChange> {
        &mut self.on_change
    }

    /// The element entered the live document.
    pub fn attached(&mut self, host: &dyn Host, now_ms: u64) {
        if self.destroyed {
            return;
        }
        self.detached(host);
        self.bind_scroll_source(host);
        host.add_listener(EventTarget::Window, EventKind::Resize);
        self.listening_resize = true;
        self.reflow_interval.start(now_ms);
    }

    /// The element left the live document.
    pub fn detached(&mut self, host: &dyn Host) {
        if let Some(source) = self.scroll_source.take() {
            host.remove_listener(source, EventKind::Scroll);
        }
        if self.listening_resize {
            host.remove_listener(EventTarget::Window, EventKind::Resize);
            self.listening_resize = false;
        }
        self.reflow_interval.stop();
    }

    /// A scroll event arrived from [`ScrollRange::scroll_source`].
    pub fn on_scroll(&mut self, host: &dyn Host, now_ms: u64) -> Result<()> {
        if self.destroyed || !self.throttle.call(now_ms) {
            return Ok(());
        }
        self.check_position(host, now_ms)
    }

    /// The window was resized. The reflow runs on the next frame.
    pub fn on_resize(&mut self) {
        if !self.destroyed {
            self.queue.schedule(Task::Reflow, Phase::Read);
        }
    }

    /// Runs owed throttled checks and the periodic reflow timer.
    pub fn tick(&mut self, host: &dyn Host, now_ms: u64) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        if self.throttle.poll(now_ms) {
            self.check_position(host, now_ms)?;
        }
        if self.reflow_interval.poll(now_ms) {
            self.queue.schedule(Task::Reflow, Phase::Read);
        }
        Ok(())
    }

    /// Runs the work scheduled for this frame. Nothing runs once the range is destroyed.
    ///
    /// A failing task does not stop the rest of the frame; the first error is returned after
    /// the frame has run.
    pub fn run_frame(&mut self, host: &dyn Host, now_ms: u64) -> Result<()> {
        let mut result: Result<()> = Ok(());
        for task in self.queue.take_frame() {
            if self.destroyed {
                break;
            }
            let outcome = match task {
                Task::Reflow => self.reflow(host, now_ms),
                Task::Relayout => self.calculate_layout(host, now_ms),
                Task::Destroy => {
                    self.destroy(host);
                    Ok(())
                }
            };
            if result.is_ok() {
                result = outcome;
            }
        }
        result
    }

    /// Rebuilds children whose declared values changed, then recomputes the layout.
    pub fn reflow(&mut self, host: &dyn Host, now_ms: u64) -> Result<()> {
        if self.animator.check_child_reflow(host) {
            self.state.progress = PROGRESS_UNSET;
        }
        self.calculate_layout(host, now_ms)
    }

    /// Recomputes the scroll thresholds from the element's box, then checks the position.
    ///
    /// An all-zero bounding box (detached or hidden element) keeps the previous thresholds.
    pub fn calculate_layout(&mut self, host: &dyn Host, now_ms: u64) -> Result<()> {
        if self.destroyed || self.options.switched_off {
            return Ok(());
        }
        let rect = host.bounding_rect(self.element);
        self.last_check_ms = now_ms;

        if rect.x0 == 0.0 && rect.y0 == 0.0 && rect.x1 == 0.0 && rect.y1 == 0.0 {
            fxtrace!(element = %self.element, "ScrollRange: degenerate box, layout kept");
            return Ok(());
        }

        let scroll_top = host.scroll_offset(self.scrolling_element).y;
        let element_size = host.client_size(self.element);
        let viewport_size = host.client_size(host.root());

        let box_top = rect.y0 + scroll_top;
        let mut min_scroll = box_top - self.options.to.resolve(element_size, viewport_size);
        let mut max_scroll = box_top - self.options.from.resolve(element_size, viewport_size);
        if min_scroll > max_scroll {
            fxwarn!(
                element = %self.element,
                min_scroll,
                max_scroll,
                "ScrollRange: `from` resolves before `to`, swapping"
            );
            core::mem::swap(&mut min_scroll, &mut max_scroll);
        }

        let padding = self.options.prepare_padding;
        let state = &mut self.state;
        state.box_top = box_top;
        state.box_width = rect.width();
        state.scroll_pos = scroll_top;
        state.min_scroll = min_scroll;
        state.max_scroll = max_scroll;
        state.min_fixed = min_scroll - FIXED_HEADROOM;
        state.max_fixed = max_scroll + FIXED_HEADROOM;
        state.min_prepare_scroll = min_scroll - padding;
        state.max_prepare_scroll = max_scroll + padding;
        self.has_layout = true;

        fxtrace!(
            element = %self.element,
            min_scroll,
            max_scroll,
            "ScrollRange: layout"
        );

        self.resolve_fixed_element(host);
        self.check_position(host, now_ms)
    }

    /// Compares the current scroll position against the thresholds and applies every resulting
    /// change: child styles and `on_progress` when progress moved, then the fixed, prepared and
    /// in-range states.
    ///
    /// Calling it again at the same position has no effect. A child that fails to set up is
    /// reported after the range's own state has been updated.
    pub fn check_position(&mut self, host: &dyn Host, now_ms: u64) -> Result<()> {
        if self.destroyed || self.options.switched_off || !self.has_layout {
            return Ok(());
        }

        let pos = host.scroll_offset(self.scrolling_element).y;
        self.state.scroll_pos = pos;

        if now_ms.saturating_sub(self.last_check_ms) > self.check_time_ms {
            self.last_check_ms = now_ms;
            self.queue.schedule(Task::Relayout, Phase::AfterFrame);
        }

        let state = &self.state;
        let should_fix = state.min_fixed <= pos && pos <= state.max_fixed;
        let prepared = state.min_prepare_scroll <= pos && pos <= state.max_prepare_scroll;
        let mut should_enter =
            prepared && should_fix && state.min_scroll <= pos && pos <= state.max_scroll;

        let was = state.progress;
        let mut result: Result<()> = Ok(());
        if should_enter || (was != 0.0 && was != 1.0) {
            let progress = self.progress_at(pos);
            // A range that was never computed and starts out at 0 outside of the range has
            // nothing to report yet.
            let unchanged =
                was == progress || (was == PROGRESS_UNSET && progress == 0.0 && !should_enter);
            if unchanged {
                self.state.progress = progress;
            } else {
                result = self.animator.update_childs(host, self.element, progress);
                self.state.progress = progress;
                fxtrace!(element = %self.element, progress, "ScrollRange: progress");
                self.on_progress.fire_with(
                    host,
                    &ProgressEvent {
                        target: self.element,
                        progress,
                    },
                );
                if self.options.once == Once::Completed && progress == 1.0 {
                    should_enter = true;
                    self.queue.schedule(Task::Destroy, Phase::Write);
                }
            }
        }

        if let Some(fixed) = self.fixed_element {
            if should_fix || should_fix != self.state.entered_fixed {
                self.update_fixed_element(host, fixed, should_fix);
            }
        }

        if self.state.prepare_entered != prepared {
            self.state.prepare_entered = prepared;
            host.toggle_class(self.element, &self.options.classes.prepared, prepared);
        }

        if self.state.entered != should_enter {
            self.change_state(host, should_enter);
        }
        result
    }

    /// Sets one option by its declarative name and applies its side effects.
    pub fn set_option(
        &mut self,
        host: &dyn Host,
        name: &str,
        value: OptionValue,
        now_ms: u64,
    ) -> Result<()> {
        let was_switched_off = self.options.switched_off;
        self.options.apply(name, value)?;
        if self.destroyed {
            return Ok(());
        }

        match name {
            "switchedOff" => {
                let switched_off = self.options.switched_off;
                self.animator.set_switched_off(switched_off);
                if switched_off && !was_switched_off && self.options.reset_switched_off {
                    self.reset(host);
                } else if !switched_off && was_switched_off {
                    self.calculate_layout(host, now_ms)?;
                }
                self.set_switched_off_class(host);
            }
            "restSwitchedOff" => {
                if self.options.switched_off && self.options.reset_switched_off {
                    self.reset(host);
                }
            }
            "from" | "to" | "fixedSel" | "preparePadding" => {
                self.calculate_layout(host, now_ms)?;
            }
            "throttleDelay" => {
                self.detached(host);
                self.throttle = Throttle::new(self.options.throttle_delay_ms);
                if host.contains(self.element) {
                    self.attached(host, now_ms);
                }
            }
            "scrollContainer" => {
                self.bind_scroll_source(host);
                self.calculate_layout(host, now_ms)?;
            }
            "childSel" => {
                let child_sel = self.options.child_selector();
                if child_sel != self.animator.child_sel() {
                    self.animator.set_child_sel(host, child_sel);
                    self.state.progress = PROGRESS_UNSET;
                    self.check_position(host, now_ms)?;
                }
            }
            "setFixedWidth" => {
                if !self.options.set_fixed_width && self.fixed_width.take().is_some() {
                    if let Some(fixed) = self.fixed_element {
                        host.set_style(fixed, "width", "");
                    }
                }
                self.check_position(host, now_ms)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Removes listeners and timers and drops pending frame work.
    ///
    /// Styles and classes written so far stay in place.
    pub fn destroy(&mut self, host: &dyn Host) {
        if self.destroyed {
            return;
        }
        self.detached(host);
        self.queue.clear();
        self.throttle.cancel();
        self.animator.forget_childs();
        self.destroyed = true;
        fxdebug!(element = %self.element, "ScrollRange: destroyed");
    }

    fn progress_at(&self, pos: f64) -> f64 {
        let min = self.state.min_scroll;
        let span = self.state.max_scroll - min;
        if span <= 0.0 {
            return if pos >= min { 1.0 } else { 0.0 };
        }
        ((pos - min) / span).clamp(0.0, 1.0)
    }

    fn change_state(&mut self, host: &dyn Host, entered: bool) {
        if self.state.entered == entered {
            return;
        }
        self.state.entered = entered;
        host.toggle_class(self.element, &self.options.classes.in_range, entered);
        fxdebug!(element = %self.element, entered, "ScrollRange: state changed");

        self.on_change.fire_with(
            host,
            &RangeChange {
                target: self.element,
                entered,
            },
        );

        let destroy = match self.options.once {
            Once::Never => false,
            Once::Entered => true,
            Once::Completed => !self.animator.has_childs(),
        };
        if entered && destroy {
            self.destroy(host);
        }
    }

    /// Leaves every state and clears what the children had written.
    fn reset(&mut self, host: &dyn Host) {
        self.change_state(host, false);
        if self.state.prepare_entered {
            self.state.prepare_entered = false;
            host.toggle_class(self.element, &self.options.classes.prepared, false);
        }
        if let Some(fixed) = self.fixed_element {
            if self.state.entered_fixed {
                self.update_fixed_element(host, fixed, false);
            }
        }
        self.animator.empty_childs(host);
        self.state.progress = PROGRESS_UNSET;
    }

    fn set_switched_off_class(&self, host: &dyn Host) {
        host.toggle_class(
            self.element,
            &self.options.classes.switched_off,
            self.options.switched_off,
        );
    }

    fn bind_scroll_source(&mut self, host: &dyn Host) {
        let page = host.page_scrolling_element();
        self.scrolling_element = self
            .options
            .scroll_container
            .as_deref()
            .and_then(|selector| host.closest(self.element, selector))
            .unwrap_or(page);

        let source = if host.scrolls_via_window(self.scrolling_element) {
            EventTarget::Window
        } else {
            EventTarget::Element(self.scrolling_element)
        };
        if let Some(old) = self.scroll_source.take() {
            host.remove_listener(old, EventKind::Scroll);
        }
        host.add_listener(source, EventKind::Scroll);
        self.scroll_source = Some(source);
    }

    fn resolve_fixed_element(&mut self, host: &dyn Host) {
        let fixed = host
            .find(self.element, &self.options.fixed_selector())
            .first()
            .copied();
        if fixed == self.fixed_element {
            return;
        }
        if let Some(old) = self.fixed_element {
            if self.state.entered_fixed {
                self.update_fixed_element(host, old, false);
            }
        }
        self.state.entered_fixed = false;
        self.fixed_top = None;
        self.fixed_width = None;
        self.fixed_element = fixed;
    }

    fn update_fixed_element(&mut self, host: &dyn Host, fixed: ElementId, entered: bool) {
        if self.state.entered_fixed != entered {
            host.toggle_class(fixed, &self.options.classes.fixed_entered, entered);
            if entered {
                host.set_style(fixed, "position", "fixed");
            }
        }

        if entered {
            let top = self.state.box_top - self.state.scroll_pos;
            if self.fixed_top != Some(top) {
                host.set_style(fixed, "top", &format!("{}px", format_number(top)));
                self.fixed_top = Some(top);
            }
            let width = self.state.box_width;
            if self.options.set_fixed_width && self.fixed_width != Some(width) {
                host.set_style(fixed, "width", &format!("{}px", format_number(width)));
                self.fixed_width = Some(width);
            }
        } else {
            host.set_style(fixed, "position", "");
            host.set_style(fixed, "top", "");
            self.fixed_top = None;
            if self.options.set_fixed_width {
                host.set_style(fixed, "width", "");
                self.fixed_width = None;
            }
        }

        self.state.entered_fixed = entered;
    }
}

impl LiveComponent for ScrollRange {
    fn name(&self) -> &str {
        &self.options.name
    }

    fn element(&self) -> ElementId {
        self.element
    }

    fn attached(&mut self, host: &dyn Host, now_ms: u64) {
        ScrollRange::attached(self, host, now_ms);
    }

    fn detached(&mut self, host: &dyn Host) {
        ScrollRange::detached(self, host);
    }

    fn set_option(
        &mut self,
        host: &dyn Host,
        name: &str,
        value: OptionValue,
        now_ms: u64,
    ) -> Result<()> {
        ScrollRange::set_option(self, host, name, value, now_ms)
    }

    fn handle_event(&mut self, host: &dyn Host, event: &PageEvent, now_ms: u64) -> Result<()> {
        match event {
            PageEvent::Scroll(target) if Some(*target) == self.scroll_source => {
                self.on_scroll(host, now_ms)
            }
            PageEvent::WindowResize if self.listening_resize => {
                self.on_resize();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn tick(&mut self, host: &dyn Host, now_ms: u64) -> Result<()> {
        ScrollRange::tick(self, host, now_ms)
    }

    fn run_frame(&mut self, host: &dyn Host, now_ms: u64) -> Result<()> {
        ScrollRange::run_frame(self, host, now_ms)
    }

    fn destroy(&mut self, host: &dyn Host) {
        ScrollRange::destroy(self, host);
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl core::fmt::Debug for ScrollRange {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ScrollRange")
            .field("element", &self.element)
            .field("options", &self.options)
            .field("state", &self.state)
            .field("scroll_source", &self.scroll_source)
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}
