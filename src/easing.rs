use core::str::FromStr;

use crate::Error;

/// Easing curves applied to a child's sub-progress.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Easing {
    Linear,
    SmoothStep,
    EaseInOutCubic,
    /// CSS `cubic-bezier(x1, y1, x2, y2)`; `x1`/`x2` are clamped to `[0, 1]`.
    CubicBezier(f64, f64, f64, f64),
}

impl Easing {
    pub const EASE: Self = Self::CubicBezier(0.25, 0.1, 0.25, 1.0);
    pub const EASE_IN: Self = Self::CubicBezier(0.42, 0.0, 1.0, 1.0);
    pub const EASE_OUT: Self = Self::CubicBezier(0.0, 0.0, 0.58, 1.0);
    pub const EASE_IN_OUT: Self = Self::CubicBezier(0.42, 0.0, 0.58, 1.0);

    pub fn sample(self, t: f64) -> f64 {
        match self {
            Self::Linear => t,
            Self::SmoothStep => t * t * (3.0 - 2.0 * t),
            Self::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = -2.0 * t + 2.0;
                    1.0 - (u * u * u) / 2.0
                }
            }
            Self::CubicBezier(x1, y1, x2, y2) => {
                if t <= 0.0 {
                    return 0.0;
                }
                if t >= 1.0 {
                    return 1.0;
                }
                let x1 = x1.clamp(0.0, 1.0);
                let x2 = x2.clamp(0.0, 1.0);
                let s = solve_bezier_x(x1, x2, t);
                bezier(y1, y2, s)
            }
        }
    }
}

fn bezier(p1: f64, p2: f64, s: f64) -> f64 {
    let u = 1.0 - s;
    3.0 * u * u * s * p1 + 3.0 * u * s * s * p2 + s * s * s
}

fn bezier_slope(p1: f64, p2: f64, s: f64) -> f64 {
    let u = 1.0 - s;
    3.0 * u * u * p1 + 6.0 * u * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}

/// Finds the curve parameter whose x equals `x`: Newton steps, falling back to bisection.
fn solve_bezier_x(x1: f64, x2: f64, x: f64) -> f64 {
    const EPSILON: f64 = 1e-7;

    let mut s = x;
    for _ in 0..8 {
        let err = bezier(x1, x2, s) - x;
        if err.abs() < EPSILON {
            return s;
        }
        let slope = bezier_slope(x1, x2, s);
        if slope.abs() < 1e-6 {
            break;
        }
        s -= err / slope;
    }

    let (mut lo, mut hi) = (0.0, 1.0);
    s = x;
    for _ in 0..64 {
        let v = bezier(x1, x2, s);
        if (v - x).abs() < EPSILON {
            break;
        }
        if v < x {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }
    s
}

impl FromStr for Easing {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let easing = match name {
            "linear" => Self::Linear,
            "smoothstep" | "smoothStep" => Self::SmoothStep,
            "ease" => Self::EASE,
            "ease-in" | "easeIn" => Self::EASE_IN,
            "ease-out" | "easeOut" => Self::EASE_OUT,
            "ease-in-out" | "easeInOut" => Self::EASE_IN_OUT,
            "ease-in-out-cubic" | "easeInOutCubic" => Self::EaseInOutCubic,
            _ => return parse_cubic_bezier(name).ok_or_else(|| Error::UnknownEasing(s.into())),
        };
        Ok(easing)
    }
}

fn parse_cubic_bezier(s: &str) -> Option<Easing> {
    let args = s.strip_prefix("cubic-bezier(")?.strip_suffix(')')?;
    let mut it = args.split(',').map(|p| p.trim().parse::<f64>());
    let x1 = it.next()?.ok()?;
    let y1 = it.next()?.ok()?;
    let x2 = it.next()?.ok()?;
    let y2 = it.next()?.ok()?;
    if it.next().is_some() {
        return None;
    }
    Some(Easing::CubicBezier(x1, y1, x2, y2))
}
