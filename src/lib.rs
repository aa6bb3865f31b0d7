//! A headless scroll-range animation engine.
//!
//! The crate tracks how far elements have been scrolled through an activation range and turns
//! that into state classes, a pinned sub-element and interpolated child styles. Around the core
//! [`ScrollRange`] controller it provides the detectors such effects are usually built from:
//! coalesced layout changes, element resizes, scroll position changes, selector-filtered
//! mutations and deliberate wheel input.
//!
//! It is UI-agnostic. A host environment is expected to provide, through [`Host`]:
//! - element geometry (bounding boxes, client/offset sizes, scroll offsets)
//! - element lookup (`find`, `closest`, selector matching)
//! - computed and declared style values
//! - style, property and class writes, and event listener registration
//!
//! Time is always passed in as `now_ms`; frames are whatever the host decides to call
//! `run_frame` on.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

pub mod callbacks;
pub mod childfx;
pub mod easing;
mod error;
mod host;
pub mod layout;
pub mod mutate;
pub mod offset;
mod options;
pub mod registry;
pub mod resize;
pub mod schedule;
pub mod scrollposition;
mod scrolly;
mod state;
pub mod template;
mod types;
pub mod wheelintent;

#[cfg(test)]
mod mock;

pub use callbacks::{Callbacks, Handler, handler};
pub use childfx::{ChildAnimationSpec, ChildAnimator, PROGRESS_UNSET};
pub use easing::Easing;
pub use error::{Error, Result};
pub use host::Host;
pub use offset::{OffsetExpr, OffsetUnit};
pub use options::{NAME_SEPARATOR, Once, ScrollRangeOptions, StateClasses};
pub use registry::{ComponentRegistry, LiveComponent, PageEvent};
pub use scrolly::{
    FIXED_HEADROOM, ProgressEvent, ProgressHandler, RangeChange, RangeChangeHandler, ScrollRange,
};
pub use state::ScrollRangeState;
pub use types::{
    CssValue, DeclaredValue, DeclaredValues, ElementId, EventKind, EventTarget, OptionValue,
};
