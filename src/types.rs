use std::collections::BTreeMap;
use std::fmt;

/// Opaque identity of a host element.
///
/// The engine never looks inside an id; the host decides how ids map onto its own nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where an event listener is attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventTarget {
    Window,
    Element(ElementId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Scroll,
    Resize,
    MouseEnter,
    MouseLeave,
    MouseMove,
    Wheel,
}

/// A CSS or element property value as read from or written to the host.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum CssValue {
    Number(f64),
    Text(String),
}

impl CssValue {
    /// Numeric view of the value: numbers as-is, text through its leading number (or `0`).
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Number(n) => *n,
            Self::Text(s) => leading_number(s).unwrap_or(0.0),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }
}

impl From<f64> for CssValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for CssValue {
    fn from(v: &str) -> Self {
        Self::Text(v.into())
    }
}

impl From<String> for CssValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Parses the longest numeric prefix of `s` after leading whitespace, like `parseFloat`.
pub(crate) fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    let mut seen_dot = false;
    while let Some(&b) = bytes.get(end) {
        match b {
            b'0'..=b'9' => end += 1,
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }
    if end == digits_start || (seen_dot && end == digits_start + 1) {
        return None;
    }
    s[..end].parse().ok()
}

/// A declared animation target for one property.
///
/// `end` is the value reached at full progress. `start` overrides the value that would otherwise
/// be read from the element's computed style.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeclaredValue {
    pub start: Option<CssValue>,
    pub end: CssValue,
}

impl DeclaredValue {
    pub fn new(end: impl Into<CssValue>) -> Self {
        Self {
            start: None,
            end: end.into(),
        }
    }

    pub fn with_start(start: impl Into<CssValue>, end: impl Into<CssValue>) -> Self {
        Self {
            start: Some(start.into()),
            end: end.into(),
        }
    }
}

/// Declared values of one element, keyed by property name.
///
/// Besides animatable properties, the meta keys `from`, `to` and `easing` are recognized.
pub type DeclaredValues = BTreeMap<String, DeclaredValue>;

/// A declarative option value, as found in markup attributes or exported configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum OptionValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for OptionValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        Self::Text(v.into())
    }
}
