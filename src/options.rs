use core::fmt;

use crate::offset::{OffsetExpr, OffsetUnit};
use crate::{Error, OptionValue, Result};

/// Separator used when expanding `{e}` in selectors.
pub const NAME_SEPARATOR: &str = "-";

/// Self-destruction policy of a scroll range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "OptionValue", into = "OptionValue"))]
pub enum Once {
    /// Keep tracking forever.
    #[default]
    Never,
    /// Destroy once progress reaches `1` (or on first entry when there is nothing to animate).
    Completed,
    /// Destroy on the first entry into the range.
    Entered,
}

impl TryFrom<OptionValue> for Once {
    type Error = Error;

    fn try_from(value: OptionValue) -> Result<Self> {
        match value {
            OptionValue::Null | OptionValue::Bool(false) => Ok(Self::Never),
            OptionValue::Bool(true) => Ok(Self::Completed),
            OptionValue::Text(s) if s == "entered" => Ok(Self::Entered),
            OptionValue::Text(s) if s == "true" => Ok(Self::Completed),
            OptionValue::Text(s) if s == "false" || s.is_empty() => Ok(Self::Never),
            _ => Err(Error::InvalidOptionValue {
                name: "once".into(),
                expected: "a boolean or \"entered\"",
            }),
        }
    }
}

impl From<Once> for OptionValue {
    fn from(value: Once) -> Self {
        match value {
            Once::Never => Self::Bool(false),
            Once::Completed => Self::Bool(true),
            Once::Entered => Self::Text("entered".into()),
        }
    }
}

/// Class names toggled by a scroll range.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct StateClasses {
    pub in_range: String,
    pub prepared: String,
    pub switched_off: String,
    /// Toggled on the fixed sub-element.
    pub fixed_entered: String,
}

impl StateClasses {
    /// Prepends `prefix` (such as `"is-"`) to every class name.
    pub fn with_prefix(self, prefix: &str) -> Self {
        Self {
            in_range: format!("{prefix}{}", self.in_range),
            prepared: format!("{prefix}{}", self.prepared),
            switched_off: format!("{prefix}{}", self.switched_off),
            fixed_entered: format!("{prefix}{}", self.fixed_entered),
        }
    }
}

impl Default for StateClasses {
    fn default() -> Self {
        Self {
            in_range: "in-scroll-range".into(),
            prepared: "scroll-range-prepared".into(),
            switched_off: "switched-off".into(),
            fixed_entered: "fixed-entered".into(),
        }
    }
}

/// Configuration for [`crate::ScrollRange`].
///
/// Field names follow the declarative option names in camelCase (`throttleDelay`,
/// `scrollContainer`, ...) when set through [`ScrollRangeOptions::apply`] or deserialized.
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct ScrollRangeOptions {
    /// Component name, substituted for `{name}` in selectors.
    pub name: String,

    /// Where the range ends, relative to the viewport top. `-100eh` means the element's bottom
    /// edge has just passed the top of the viewport.
    pub from: OffsetExpr,
    /// Where the range starts, relative to the viewport top. `100vh` means the element's top edge
    /// reaches the bottom of the viewport.
    pub to: OffsetExpr,

    pub once: Once,

    pub switched_off: bool,
    /// Whether switching off also resets progress, classes and child styles.
    #[cfg_attr(feature = "serde", serde(rename = "restSwitchedOff"))]
    pub reset_switched_off: bool,

    /// Position checks closer together than this are throttled. Values up to
    /// [`crate::schedule::MIN_THROTTLE_DELAY_MS`] disable throttling.
    #[cfg_attr(feature = "serde", serde(rename = "throttleDelay"))]
    pub throttle_delay_ms: u64,

    /// Children to animate, resolved with [`crate::Host::find`].
    pub child_sel: String,
    /// Sub-element pinned with fixed positioning while near the range.
    pub fixed_sel: String,
    /// Whether the pinned element gets the element's width while fixed.
    pub set_fixed_width: bool,
    /// Padding (px) around the range for the prepared state.
    pub prepare_padding: f64,

    /// Selector for a scroll container (resolved with `closest`). `None` uses page scrolling.
    pub scroll_container: Option<String>,

    pub classes: StateClasses,

    /// Seed for timer jitter. `None` derives it from the element id.
    pub seed: Option<u64>,
}

impl Default for ScrollRangeOptions {
    fn default() -> Self {
        Self {
            name: "scrolly".into(),
            from: OffsetExpr::default().with_term(OffsetUnit::Eh, -100.0),
            to: OffsetExpr::default().with_term(OffsetUnit::Vh, 100.0),
            once: Once::Never,
            switched_off: false,
            reset_switched_off: true,
            throttle_delay_ms: 0,
            child_sel: "find(.{name}{e}fx)".into(),
            fixed_sel: "find(.{name}{e}scrollfixed)".into(),
            set_fixed_width: true,
            prepare_padding: 0.0,
            scroll_container: None,
            classes: StateClasses::default(),
            seed: None,
        }
    }
}

impl ScrollRangeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `from` and `to` offset expressions.
    pub fn with_range(mut self, from: &str, to: &str) -> Result<Self> {
        self.from = from.parse()?;
        self.to = to.parse()?;
        Ok(self)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_once(mut self, once: Once) -> Self {
        self.once = once;
        self
    }

    pub fn with_switched_off(mut self, switched_off: bool) -> Self {
        self.switched_off = switched_off;
        self
    }

    pub fn with_reset_switched_off(mut self, reset: bool) -> Self {
        self.reset_switched_off = reset;
        self
    }

    pub fn with_throttle_delay_ms(mut self, delay_ms: u64) -> Self {
        self.throttle_delay_ms = delay_ms;
        self
    }

    pub fn with_child_sel(mut self, child_sel: impl Into<String>) -> Self {
        self.child_sel = child_sel.into();
        self
    }

    pub fn with_fixed_sel(mut self, fixed_sel: impl Into<String>) -> Self {
        self.fixed_sel = fixed_sel.into();
        self
    }

    pub fn with_set_fixed_width(mut self, set_fixed_width: bool) -> Self {
        self.set_fixed_width = set_fixed_width;
        self
    }

    pub fn with_prepare_padding(mut self, padding: f64) -> Self {
        self.prepare_padding = padding;
        self
    }

    pub fn with_scroll_container(mut self, selector: Option<impl Into<String>>) -> Self {
        self.scroll_container = selector.map(Into::into);
        self
    }

    pub fn with_classes(mut self, classes: StateClasses) -> Self {
        self.classes = classes;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// `child_sel` with `{name}` and `{e}` expanded.
    pub fn child_selector(&self) -> String {
        self.expand(&self.child_sel)
    }

    /// `fixed_sel` with `{name}` and `{e}` expanded.
    pub fn fixed_selector(&self) -> String {
        self.expand(&self.fixed_sel)
    }

    fn expand(&self, selector: &str) -> String {
        selector
            .replace("{name}", &self.name)
            .replace("{e}", NAME_SEPARATOR)
    }

    /// Sets one option from its declarative name and value.
    pub fn apply(&mut self, name: &str, value: OptionValue) -> Result<()> {
        match name {
            "from" => self.from = offset_value(name, value)?,
            "to" => self.to = offset_value(name, value)?,
            "once" => self.once = Once::try_from(value)?,
            "switchedOff" => self.switched_off = bool_value(name, value)?,
            "restSwitchedOff" => self.reset_switched_off = bool_value(name, value)?,
            "throttleDelay" => {
                let delay = number_value(name, value)?;
                self.throttle_delay_ms = if delay > 0.0 { delay.round() as u64 } else { 0 };
            }
            "childSel" => self.child_sel = text_value(name, value)?,
            "fixedSel" => self.fixed_sel = text_value(name, value)?,
            "setFixedWidth" => self.set_fixed_width = bool_value(name, value)?,
            "preparePadding" => self.prepare_padding = number_value(name, value)?,
            "scrollContainer" => {
                self.scroll_container = match value {
                    OptionValue::Null | OptionValue::Bool(false) => None,
                    OptionValue::Text(s) if s.is_empty() => None,
                    OptionValue::Text(s) => Some(s),
                    _ => {
                        return Err(Error::InvalidOptionValue {
                            name: name.into(),
                            expected: "a selector or false",
                        });
                    }
                }
            }
            _ => return Err(Error::UnknownOption(name.into())),
        }
        Ok(())
    }
}

fn bool_value(name: &str, value: OptionValue) -> Result<bool> {
    match value {
        OptionValue::Bool(b) => Ok(b),
        OptionValue::Null => Ok(false),
        OptionValue::Text(s) if s == "true" => Ok(true),
        OptionValue::Text(s) if s == "false" => Ok(false),
        _ => Err(Error::InvalidOptionValue {
            name: name.into(),
            expected: "a boolean",
        }),
    }
}

fn number_value(name: &str, value: OptionValue) -> Result<f64> {
    let invalid = || Error::InvalidOptionValue {
        name: name.into(),
        expected: "a number",
    };
    match value {
        OptionValue::Number(n) if n.is_finite() => Ok(n),
        OptionValue::Text(s) => s.trim().parse().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn text_value(name: &str, value: OptionValue) -> Result<String> {
    match value {
        OptionValue::Text(s) => Ok(s),
        _ => Err(Error::InvalidOptionValue {
            name: name.into(),
            expected: "a string",
        }),
    }
}

fn offset_value(name: &str, value: OptionValue) -> Result<OffsetExpr> {
    match value {
        OptionValue::Text(s) => s.parse(),
        OptionValue::Number(n) => Ok(OffsetExpr::default().with_term(OffsetUnit::Px, n)),
        _ => Err(Error::InvalidOptionValue {
            name: name.into(),
            expected: "an offset expression",
        }),
    }
}

impl fmt::Debug for ScrollRangeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollRangeOptions")
            .field("name", &self.name)
            .field("from", &format_args!("{}", self.from))
            .field("to", &format_args!("{}", self.to))
            .field("once", &self.once)
            .field("switched_off", &self.switched_off)
            .field("reset_switched_off", &self.reset_switched_off)
            .field("throttle_delay_ms", &self.throttle_delay_ms)
            .field("child_sel", &self.child_sel)
            .field("fixed_sel", &self.fixed_sel)
            .field("set_fixed_width", &self.set_fixed_width)
            .field("prepare_padding", &self.prepare_padding)
            .field("scroll_container", &self.scroll_container)
            .finish_non_exhaustive()
    }
}
