use crate::childfx::PROGRESS_UNSET;

/// A serializable snapshot of a scroll range's thresholds and flags.
///
/// All thresholds are document-absolute scroll offsets of the scrolling element. With
/// `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ScrollRangeState {
    pub min_scroll: f64,
    pub max_scroll: f64,
    /// `min_scroll` minus the fixed headroom.
    pub min_fixed: f64,
    /// `max_scroll` plus the fixed headroom.
    pub max_fixed: f64,
    pub min_prepare_scroll: f64,
    pub max_prepare_scroll: f64,
    /// Element top in document coordinates at the last layout.
    pub box_top: f64,
    pub box_width: f64,
    pub scroll_pos: f64,
    /// In `[0, 1]` once computed, [`PROGRESS_UNSET`] otherwise.
    pub progress: f64,
    pub entered: bool,
    pub prepare_entered: bool,
    pub entered_fixed: bool,
}

impl ScrollRangeState {
    pub fn has_progress(&self) -> bool {
        self.progress != PROGRESS_UNSET
    }
}

impl Default for ScrollRangeState {
    fn default() -> Self {
        Self {
            min_scroll: f64::MAX,
            max_scroll: -1.0,
            min_fixed: f64::MAX,
            max_fixed: -1.0,
            min_prepare_scroll: f64::MAX,
            max_prepare_scroll: -1.0,
            box_top: 0.0,
            box_width: 0.0,
            scroll_pos: 0.0,
            progress: PROGRESS_UNSET,
            entered: false,
            prepare_entered: false,
            entered_fixed: false,
        }
    }
}
