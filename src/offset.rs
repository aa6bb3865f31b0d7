//! Offset expressions such as `"100vh - 50eh"`.
//!
//! An expression is a sum of unit-tagged terms. Units:
//! - `px`: absolute pixels (a bare number is also read as pixels)
//! - `vh` / `vw`: 1/100 of the viewport root's client height / width
//! - `eh` / `ew`: 1/100 of the element's own client height / width
//!
//! Whitespace is ignored, so `100vh - 50eh` and `100vh-50eh` are the same expression. Terms with
//! the same unit are summed.

use core::fmt;
use core::str::FromStr;

use kurbo::Size;

use crate::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OffsetUnit {
    Px,
    Vh,
    Vw,
    Eh,
    Ew,
}

impl OffsetUnit {
    const ALL: [Self; 5] = [Self::Px, Self::Vh, Self::Vw, Self::Eh, Self::Ew];

    fn suffix(self) -> &'static str {
        match self {
            Self::Px => "px",
            Self::Vh => "vh",
            Self::Vw => "vw",
            Self::Eh => "eh",
            Self::Ew => "ew",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Px => 0,
            Self::Vh => 1,
            Self::Vw => 2,
            Self::Eh => 3,
            Self::Ew => 4,
        }
    }
}

/// A parsed offset expression: one signed coefficient per unit.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct OffsetExpr {
    coefficients: [f64; 5],
}

impl OffsetExpr {
    pub fn coefficient(&self, unit: OffsetUnit) -> f64 {
        self.coefficients[unit.index()]
    }

    pub fn with_term(mut self, unit: OffsetUnit, value: f64) -> Self {
        self.coefficients[unit.index()] += value;
        self
    }

    pub fn is_zero(&self) -> bool {
        self.coefficients.iter().all(|c| *c == 0.0)
    }

    /// Resolves the expression to pixels against the element's and the viewport's client sizes.
    pub fn resolve(&self, element: Size, viewport: Size) -> f64 {
        OffsetUnit::ALL
            .iter()
            .map(|&unit| {
                let c = self.coefficient(unit);
                if c == 0.0 {
                    return 0.0;
                }
                match unit {
                    OffsetUnit::Px => c,
                    OffsetUnit::Vh => viewport.height / 100.0 * c,
                    OffsetUnit::Vw => viewport.width / 100.0 * c,
                    OffsetUnit::Eh => element.height / 100.0 * c,
                    OffsetUnit::Ew => element.width / 100.0 * c,
                }
            })
            .sum()
    }
}

impl FromStr for OffsetExpr {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let compact: Vec<(usize, u8)> = input
            .bytes()
            .enumerate()
            .filter(|(_, b)| !b.is_ascii_whitespace())
            .collect();
        let err = |i: usize| Error::InvalidOffset {
            input: input.into(),
            at: compact.get(i).map_or(input.len(), |(at, _)| *at),
        };

        let mut expr = Self::default();
        let mut i = 0;
        while i < compact.len() {
            let mut negative = false;
            while let Some((_, sign @ (b'+' | b'-'))) = compact.get(i) {
                if *sign == b'-' {
                    negative = !negative;
                }
                i += 1;
            }

            let number_start = i;
            let mut seen_dot = false;
            while let Some((_, b)) = compact.get(i) {
                match b {
                    b'0'..=b'9' => i += 1,
                    b'.' if !seen_dot => {
                        seen_dot = true;
                        i += 1;
                    }
                    _ => break,
                }
            }
            if i == number_start {
                return Err(err(i));
            }
            let number: String = compact[number_start..i]
                .iter()
                .map(|(_, b)| *b as char)
                .collect();
            let mut value: f64 = number.parse().map_err(|_| err(number_start))?;
            if negative {
                value = -value;
            }

            let unit = match (compact.get(i), compact.get(i + 1)) {
                (Some((_, a)), Some((_, b))) if a.is_ascii_alphabetic() => {
                    let unit = OffsetUnit::ALL
                        .into_iter()
                        .find(|u| u.suffix().as_bytes() == [*a, *b].as_slice())
                        .ok_or_else(|| err(i))?;
                    i += 2;
                    unit
                }
                (Some((_, a)), _) if a.is_ascii_alphabetic() => return Err(err(i)),
                _ => OffsetUnit::Px,
            };

            expr = expr.with_term(unit, value);

            if let Some((_, b)) = compact.get(i) {
                if *b != b'+' && *b != b'-' {
                    return Err(err(i));
                }
            }
        }
        Ok(expr)
    }
}

impl TryFrom<String> for OffsetExpr {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OffsetExpr> for String {
    fn from(value: OffsetExpr) -> Self {
        value.to_string()
    }
}

impl fmt::Display for OffsetExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for unit in OffsetUnit::ALL {
            let c = self.coefficient(unit);
            if c == 0.0 {
                continue;
            }
            if first {
                write!(f, "{c}{}", unit.suffix())?;
            } else if c < 0.0 {
                write!(f, " - {}{}", -c, unit.suffix())?;
            } else {
                write!(f, " + {c}{}", unit.suffix())?;
            }
            first = false;
        }
        if first {
            f.write_str("0px")?;
        }
        Ok(())
    }
}
