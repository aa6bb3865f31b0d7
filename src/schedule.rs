//! Frame and timer primitives.
//!
//! Nothing here owns a clock. Callers pass `now_ms` in, and the host decides when a frame tick
//! happens by draining a [`FrameQueue`].

/// The phase of a frame a task runs in. Phases run in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Layout reads.
    Read,
    /// Style and class writes.
    Write,
    /// Work that should see the results of this frame's writes.
    AfterFrame,
}

/// A keyed, coalescing frame queue.
///
/// A key is pending at most once until the next [`FrameQueue::take_frame`]; scheduling it again
/// is a no-op. Keys scheduled after `take_frame` (including from inside the tasks being run) land
/// in the next frame.
#[derive(Clone, Debug)]
pub struct FrameQueue<K> {
    pending: Vec<(Phase, K)>,
}

impl<K: Copy + PartialEq> FrameQueue<K> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Schedules `key` for the next frame. Returns `false` if it was already pending.
    pub fn schedule(&mut self, key: K, phase: Phase) -> bool {
        if self.is_pending(key) {
            return false;
        }
        self.pending.push((phase, key));
        true
    }

    pub fn cancel(&mut self, key: K) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(_, k)| *k != key);
        before != self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, key: K) -> bool {
        self.pending.iter().any(|(_, k)| *k == key)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Removes and returns the keys of the current frame, ordered by phase and then by schedule
    /// order.
    pub fn take_frame(&mut self) -> Vec<K> {
        let mut frame = core::mem::take(&mut self.pending);
        frame.sort_by_key(|(phase, _)| *phase);
        frame.into_iter().map(|(_, k)| k).collect()
    }
}

impl<K: Copy + PartialEq> Default for FrameQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Delays at or below this value are not worth throttling.
pub const MIN_THROTTLE_DELAY_MS: u64 = 30;

/// A leading + trailing time throttle.
///
/// `call` runs immediately when the delay has elapsed, and otherwise remembers that a call is
/// owed; `poll` pays that call once the delay has passed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Throttle {
    delay_ms: u64,
    last_run_ms: Option<u64>,
    pending: bool,
}

impl Throttle {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            last_run_ms: None,
            pending: false,
        }
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub fn is_bypassed(&self) -> bool {
        self.delay_ms <= MIN_THROTTLE_DELAY_MS
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Returns whether the throttled work should run now.
    pub fn call(&mut self, now_ms: u64) -> bool {
        if self.is_bypassed() || self.elapsed(now_ms) {
            self.last_run_ms = Some(now_ms);
            self.pending = false;
            return true;
        }
        self.pending = true;
        false
    }

    /// Returns whether an owed call is due now.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if !self.pending || !self.elapsed(now_ms) {
            return false;
        }
        self.last_run_ms = Some(now_ms);
        self.pending = false;
        true
    }

    pub fn cancel(&mut self) {
        self.pending = false;
    }

    fn elapsed(&self, now_ms: u64) -> bool {
        match self.last_run_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.delay_ms,
        }
    }
}

/// Delays below this value are raised to it before [`DEBOUNCE_DELAY_OFFSET_MS`] is taken off.
pub const MIN_DEBOUNCE_DELAY_MS: u64 = 40;

/// Taken off every debounce delay to make room for the trailing frame.
pub const DEBOUNCE_DELAY_OFFSET_MS: u64 = 18;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DebounceStage {
    Idle,
    Quiet,
    AwaitFrame,
    AwaitIdle,
}

/// A trailing-edge debounce.
///
/// Every [`Debounce::call`] restarts the quiet period. Once it has passed (see
/// [`Debounce::poll`]) and at least `min_frames` frames went by since the last call, the run
/// is deferred to the next [`Debounce::frame`], so the wrapped work lands in a write phase. Unless
/// configured as a write, it then waits for one more `poll` as an idle slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Debounce {
    delay_ms: u64,
    min_frames: u32,
    write: bool,
    last_call_ms: u64,
    frames: u32,
    stage: DebounceStage,
}

impl Debounce {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms: delay_ms.max(MIN_DEBOUNCE_DELAY_MS) - DEBOUNCE_DELAY_OFFSET_MS,
            min_frames: 0,
            write: false,
            last_call_ms: 0,
            frames: 0,
            stage: DebounceStage::Idle,
        }
    }

    pub fn with_min_frames(mut self, min_frames: u32) -> Self {
        self.min_frames = min_frames;
        self
    }

    /// A write debounce runs in the trailing frame instead of waiting for an idle poll.
    pub fn with_write(mut self, write: bool) -> Self {
        self.write = write;
        self
    }

    /// The effective quiet period.
    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub fn is_pending(&self) -> bool {
        self.stage != DebounceStage::Idle
    }

    pub fn call(&mut self, now_ms: u64) {
        self.last_call_ms = now_ms;
        self.frames = 0;
        self.stage = DebounceStage::Quiet;
    }

    /// Checks the quiet period. Returns whether the wrapped work should run now, which only
    /// happens for the idle slot of a non-write debounce.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.stage {
            DebounceStage::Quiet if self.settled(now_ms) => {
                self.stage = DebounceStage::AwaitFrame;
                false
            }
            DebounceStage::AwaitIdle => {
                self.stage = DebounceStage::Idle;
                true
            }
            _ => false,
        }
    }

    /// Counts an animation frame. Returns whether the wrapped work should run now.
    pub fn frame(&mut self) -> bool {
        match self.stage {
            DebounceStage::Idle => false,
            DebounceStage::Quiet => {
                self.frames = self.frames.saturating_add(1);
                false
            }
            DebounceStage::AwaitFrame if self.write => {
                self.stage = DebounceStage::Idle;
                true
            }
            DebounceStage::AwaitFrame => {
                self.stage = DebounceStage::AwaitIdle;
                false
            }
            DebounceStage::AwaitIdle => false,
        }
    }

    pub fn cancel(&mut self) {
        self.stage = DebounceStage::Idle;
    }

    fn settled(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_call_ms) >= self.delay_ms && self.frames >= self.min_frames
    }
}

impl Default for Debounce {
    fn default() -> Self {
        Self::new(100)
    }
}

/// A repeating timer checked against caller-supplied time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interval {
    period_ms: u64,
    next_due_ms: Option<u64>,
}

impl Interval {
    pub fn new(period_ms: u64) -> Self {
        Self {
            period_ms: period_ms.max(1),
            next_due_ms: None,
        }
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    pub fn start(&mut self, now_ms: u64) {
        self.next_due_ms = Some(now_ms.saturating_add(self.period_ms));
    }

    pub fn stop(&mut self) {
        self.next_due_ms = None;
    }

    pub fn is_active(&self) -> bool {
        self.next_due_ms.is_some()
    }

    /// Returns whether the timer fired. Missed periods collapse into a single firing.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        let Some(due) = self.next_due_ms else {
            return false;
        };
        if now_ms < due {
            return false;
        }
        self.next_due_ms = Some(now_ms.saturating_add(self.period_ms));
        true
    }
}

/// Deterministic, dependency-free generator used to spread timer periods across instances.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Jitter(u64);

impl Jitter {
    pub fn new(seed: u64) -> Self {
        // Mix the seed so that consecutive ids do not produce correlated first values.
        Self(seed ^ 0x9E37_79B9_7F4A_7C15)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    /// A value in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// `base + spread * r` for a fresh `r` in `[0, 1)`, rounded.
    pub fn spread(&mut self, base: u64, spread: u64) -> u64 {
        base + (spread as f64 * self.next_unit()).round() as u64
    }
}
