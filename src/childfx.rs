//! Progress-driven interpolation of child element properties.
//!
//! A [`ChildAnimator`] owns one [`ChildAnimationSpec`] per matched child. Each spec pairs start
//! values (computed style, unless declared) with declared end values, and maps the animator's
//! global progress through the child's `[from, to]` sub-range and optional easing before
//! interpolating.

use crate::easing::Easing;
use crate::template::{Template, format_number};
use crate::{CssValue, DeclaredValue, ElementId, Error, Host, Result};

/// Progress value meaning "not computed since the last reset".
pub const PROGRESS_UNSET: f64 = -2.0;

#[derive(Clone, Debug, PartialEq)]
enum Track {
    Number {
        start: f64,
        end: f64,
    },
    Template {
        template: Template,
        start: Vec<f64>,
        end: Vec<f64>,
        round: bool,
    },
}

#[derive(Clone, Debug, PartialEq)]
struct PropertyTrack {
    property: String,
    /// Restored on teardown for properties that are not styles.
    initial: CssValue,
    track: Track,
}

impl PropertyTrack {
    fn new(property: &str, start: CssValue, end: &CssValue) -> Result<Self> {
        let track = match (&start, end) {
            (CssValue::Text(start_text), CssValue::Text(end_text)) => {
                let (start_template, mut start_values) = Template::parse(start_text);
                let (end_template, mut end_values) = Template::parse(end_text);
                // A side without numbers counts as zeros in the other side's slots.
                let template = match (start_values.is_empty(), end_values.is_empty()) {
                    (true, true) => start_template,
                    (true, false) => {
                        start_values = vec![0.0; end_values.len()];
                        end_template
                    }
                    (false, true) => {
                        end_values = vec![0.0; start_values.len()];
                        start_template
                    }
                    (false, false) if start_values.len() != end_values.len() => {
                        return Err(Error::TemplateMismatch {
                            property: property.into(),
                            start: start_values.len(),
                            end: end_values.len(),
                        });
                    }
                    (false, false) => start_template,
                };
                Track::Template {
                    template,
                    start: start_values,
                    end: end_values,
                    round: is_color_property(property),
                }
            }
            _ => Track::Number {
                start: start.to_number(),
                end: end.to_number(),
            },
        };
        Ok(Self {
            property: property.into(),
            initial: start,
            track,
        })
    }

    fn value_at(&self, eased: f64) -> CssValue {
        match &self.track {
            Track::Number { start, end } => CssValue::Number(lerp(*start, *end, eased)),
            Track::Template {
                template,
                start,
                end,
                round,
            } => CssValue::Text(template.render(|slot| {
                let v = lerp(start[slot], end[slot], eased);
                if *round { v.round() } else { v }
            })),
        }
    }
}

/// Animation state of one child element.
#[derive(Clone, Debug, PartialEq)]
pub struct ChildAnimationSpec {
    pub element: ElementId,
    /// Start of this child's slice of the global progress.
    pub from: f64,
    /// End of this child's slice of the global progress.
    pub to: f64,
    pub easing: Option<Easing>,
    tracks: Vec<PropertyTrack>,
}

impl ChildAnimationSpec {
    /// Builds a spec from the child's declared values, reading computed style for start values.
    pub fn from_host(host: &dyn Host, element: ElementId) -> Result<Self> {
        let declared = host.declared_values(element);
        let mut spec = Self {
            element,
            from: 0.0,
            to: 1.0,
            easing: None,
            tracks: Vec::new(),
        };
        for (property, value) in &declared {
            match property.as_str() {
                "easing" => {
                    let name = match &value.end {
                        CssValue::Text(s) => s.clone(),
                        CssValue::Number(n) => format_number(*n),
                    };
                    spec.easing = Some(name.parse()?);
                }
                "from" => spec.from = value.end.to_number(),
                "to" => spec.to = value.end.to_number(),
                _ => spec.tracks.push(track_for(host, element, property, value)?),
            }
        }
        Ok(spec)
    }

    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.tracks.iter().map(|t| t.property.as_str())
    }

    /// Maps global progress into this child's sub-range:
    /// `0` before `from`, `1` after `to`, linear in between.
    pub fn sub_progress(&self, progress: f64) -> f64 {
        if self.from > progress {
            0.0
        } else if self.to < progress {
            1.0
        } else if self.to < 1.0 || self.from > 0.0 {
            let span = self.to - self.from;
            if span <= 0.0 {
                1.0
            } else {
                (progress - self.from) / span
            }
        } else {
            progress
        }
    }

    /// The eased value used for interpolation at `progress`.
    pub fn eased(&self, progress: f64) -> f64 {
        let p = self.sub_progress(progress);
        match self.easing {
            Some(easing) => easing.sample(p),
            None => p,
        }
    }

    /// The value `property` takes at `progress`, if this spec tracks it.
    pub fn value_at(&self, property: &str, progress: f64) -> Option<CssValue> {
        let eased = self.eased(progress);
        self.tracks
            .iter()
            .find(|t| t.property == property)
            .map(|t| t.value_at(eased))
    }

    fn write(&self, host: &dyn Host, progress: f64) {
        let eased = self.eased(progress);
        for track in &self.tracks {
            let value = track.value_at(eased);
            if host.is_style_property(self.element, &track.property) {
                let text = match &value {
                    CssValue::Number(n) if is_unitless_property(&track.property) => {
                        format_number(*n)
                    }
                    CssValue::Number(n) => format!("{}px", format_number(*n)),
                    CssValue::Text(s) => s.clone(),
                };
                host.set_style(self.element, &track.property, &text);
            } else {
                host.set_property(self.element, &track.property, &value);
            }
        }
    }

    fn clear(&self, host: &dyn Host) {
        for track in &self.tracks {
            if host.is_style_property(self.element, &track.property) {
                host.set_style(self.element, &track.property, "");
            } else {
                host.set_property(self.element, &track.property, &track.initial);
            }
        }
    }
}

fn track_for(
    host: &dyn Host,
    element: ElementId,
    property: &str,
    value: &DeclaredValue,
) -> Result<PropertyTrack> {
    let start = match &value.start {
        Some(start) => start.clone(),
        None => host
            .computed_value(element, property)
            .unwrap_or(CssValue::Number(0.0)),
    };
    PropertyTrack::new(property, start, &value.end)
}

/// Interpolates child properties from a progress value in `[0, 1]`.
///
/// Children are resolved lazily on the first update and dropped again on teardown, so a host
/// that changes the declared values can force a rebuild with [`ChildAnimator::check_child_reflow`].
/// The animator does not own the progress value; its owner passes it to every update.
#[derive(Clone, Debug)]
pub struct ChildAnimator {
    child_sel: String,
    switched_off: bool,
    childs: Option<Vec<ChildAnimationSpec>>,
}

impl ChildAnimator {
    /// `child_sel` is resolved with [`Host::find`] relative to the owning element.
    pub fn new(child_sel: impl Into<String>) -> Self {
        Self {
            child_sel: child_sel.into(),
            switched_off: false,
            childs: None,
        }
    }

    pub fn child_sel(&self) -> &str {
        &self.child_sel
    }

    /// Changing the selector tears the current children down; they are rebuilt on the next
    /// update.
    pub fn set_child_sel(&mut self, host: &dyn Host, child_sel: impl Into<String>) {
        let child_sel = child_sel.into();
        if child_sel == self.child_sel {
            return;
        }
        self.empty_childs(host);
        self.child_sel = child_sel;
    }

    pub fn is_switched_off(&self) -> bool {
        self.switched_off
    }

    pub fn set_switched_off(&mut self, switched_off: bool) {
        self.switched_off = switched_off;
    }

    pub fn is_setup(&self) -> bool {
        self.childs.is_some()
    }

    pub fn childs(&self) -> &[ChildAnimationSpec] {
        self.childs.as_deref().unwrap_or(&[])
    }

    pub fn has_childs(&self) -> bool {
        !self.childs().is_empty()
    }

    /// Resolves children and builds their animation specs.
    ///
    /// On error no children are kept, so the next update retries the setup.
    pub fn setup_childs(&mut self, host: &dyn Host, element: ElementId) -> Result<()> {
        self.childs = None;
        let childs = host
            .find(element, &self.child_sel)
            .into_iter()
            .map(|child| ChildAnimationSpec::from_host(host, child))
            .collect::<Result<Vec<_>>>()?;
        fxdebug!(%element, childs = childs.len(), "ChildAnimator: setup");
        self.childs = Some(childs);
        Ok(())
    }

    /// Writes every child's properties for `progress`, setting children up first if needed.
    ///
    /// Negative progress (including [`PROGRESS_UNSET`]) is treated as `0`.
    pub fn update_childs(
        &mut self,
        host: &dyn Host,
        element: ElementId,
        progress: f64,
    ) -> Result<()> {
        if self.childs.is_none() {
            self.setup_childs(host, element)?;
        }
        let progress = progress.max(0.0);
        for child in self.childs() {
            child.write(host, progress);
        }
        Ok(())
    }

    /// Clears every written style (restoring plain properties to their start values) and drops
    /// the children.
    pub fn empty_childs(&mut self, host: &dyn Host) {
        let Some(childs) = self.childs.take() else {
            return;
        };
        for child in &childs {
            child.clear(host);
        }
    }

    /// Drops the children without touching what was written.
    pub fn forget_childs(&mut self) {
        self.childs = None;
    }

    /// Tears the children down if any of them reports changed declared values.
    ///
    /// Returns whether that happened; the owner should then treat its progress as unset so the
    /// next update rebuilds from fresh values.
    pub fn check_child_reflow(&mut self, host: &dyn Host) -> bool {
        if self.switched_off || !self.has_childs() {
            return false;
        }
        let changed = self
            .childs()
            .iter()
            .any(|child| host.declared_values_changed(child.element));
        if changed {
            fxdebug!("ChildAnimator: declared values changed");
            self.empty_childs(host);
        }
        changed
    }
}

fn lerp(start: f64, end: f64, t: f64) -> f64 {
    if t == 1.0 {
        return end;
    }
    (end - start) * t + start
}

fn normalized(property: &str) -> String {
    property
        .chars()
        .filter(|c| *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn is_color_property(property: &str) -> bool {
    normalized(property).ends_with("color")
}

/// Style properties written as plain numbers instead of pixels.
pub fn is_unitless_property(property: &str) -> bool {
    const UNITLESS: &[&str] = &[
        "animationiterationcount",
        "columncount",
        "fillopacity",
        "flexgrow",
        "flexshrink",
        "fontweight",
        "gridcolumn",
        "gridrow",
        "lineheight",
        "opacity",
        "order",
        "orphans",
        "scale",
        "widows",
        "zindex",
        "zoom",
    ];
    UNITLESS.contains(&normalized(property).as_str())
}
