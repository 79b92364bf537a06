//! Saturating integer units for flow and storage quantities.
//!
//! Power system quantities in ERIN are tracked as non-negative integer
//! Watts and Joules rather than `f64`, so that a component can declare an
//! "unlimited" capacity (`MAX_FLOW`) without NaN/inf creeping through the
//! propagation kernel. All arithmetic saturates at `MAX_FLOW` instead of
//! wrapping or panicking.
//!
//! # Zero ambiguity between "big" and "unlimited"
//!
//! Comparing a [`Watts`] value against `MAX_FLOW` directly is a common
//! source of bugs once arithmetic saturates (two different additions can
//! both reach the sentinel without either conceptually meaning "infinite").
//! Use [`Watts::is_unbounded`] instead of `== MAX_FLOW` everywhere.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// Saturation ceiling for [`Watts`], standing in for "unlimited" capacity.
pub const MAX_FLOW: u64 = u64::MAX / 2;

/// A non-negative power quantity in Watts with saturating arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watts(pub u64);

impl Watts {
    pub const ZERO: Watts = Watts(0);
    pub const UNLIMITED: Watts = Watts(MAX_FLOW);

    #[inline]
    pub const fn new(value: u64) -> Self {
        if value > MAX_FLOW {
            Self(MAX_FLOW)
        } else {
            Self(value)
        }
    }

    /// True if this value has saturated to the "unlimited" sentinel.
    #[inline]
    pub const fn is_unbounded(self) -> bool {
        self.0 >= MAX_FLOW
    }

    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }

    /// Saturating subtraction; never goes below zero.
    #[inline]
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Round up the result of dividing this flow by an efficiency/COP factor.
    ///
    /// Used when converting an outflow request into an inflow request: the
    /// inflow must be sufficient to deliver the outflow, so we round away
    /// from zero.
    pub fn div_ceil_by(self, factor: f64) -> Watts {
        if self.is_unbounded() || factor <= 0.0 {
            return Watts::UNLIMITED;
        }
        let raw = (self.0 as f64) / factor;
        Watts::new(raw.ceil() as u64)
    }

    /// Round down the result of multiplying this flow by an
    /// efficiency/COP factor.
    ///
    /// Used when converting an inflow availability into an outflow
    /// availability: never promise more than can truthfully be produced.
    pub fn mul_floor_by(self, factor: f64) -> Watts {
        if self.is_unbounded() {
            return Watts::UNLIMITED;
        }
        let raw = (self.0 as f64) * factor.max(0.0);
        Watts::new(raw.floor() as u64)
    }
}

impl Add for Watts {
    type Output = Watts;
    #[inline]
    fn add(self, rhs: Self) -> Watts {
        Watts(self.0.saturating_add(rhs.0).min(MAX_FLOW))
    }
}

impl Sub for Watts {
    type Output = Watts;
    #[inline]
    fn sub(self, rhs: Self) -> Watts {
        Watts(self.0.saturating_sub(rhs.0))
    }
}

impl std::iter::Sum for Watts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Watts::ZERO, |acc, w| acc + w)
    }
}

impl std::fmt::Display for Watts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_unbounded() {
            write!(f, "unlimited")
        } else {
            write!(f, "{} W", self.0)
        }
    }
}

/// A non-negative energy quantity in Joules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Joules(pub u64);

impl Joules {
    pub const ZERO: Joules = Joules(0);

    #[inline]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn clamp(self, lo: Joules, hi: Joules) -> Joules {
        Joules(self.0.clamp(lo.0, hi.0))
    }

    #[inline]
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    #[inline]
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl std::fmt::Display for Joules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} J", self.0)
    }
}

/// Simulated time, in seconds, since the start of the current occurrence.
pub type Seconds = f64;

/// Time units accepted in TOML input (§6). Conversions land in
/// [`TimeUnit::to_seconds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Year,
}

impl TimeUnit {
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag.to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => Self::Second,
            "min" | "mins" | "minute" | "minutes" => Self::Minute,
            "h" | "hr" | "hrs" | "hour" | "hours" => Self::Hour,
            "day" | "days" => Self::Day,
            "week" | "weeks" => Self::Week,
            "year" | "years" | "yr" | "yrs" => Self::Year,
            _ => return None,
        })
    }

    pub fn to_seconds(self, amount: f64) -> Seconds {
        let factor = match self {
            Self::Second => 1.0,
            Self::Minute => 60.0,
            Self::Hour => 3600.0,
            Self::Day => 86_400.0,
            Self::Week => 604_800.0,
            Self::Year => 365.25 * 86_400.0,
        };
        amount * factor
    }
}

/// Power units accepted in TOML input, normalized to Watts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUnit {
    Watt,
    Kilowatt,
    Megawatt,
}

impl PowerUnit {
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "W" => Self::Watt,
            "kW" => Self::Kilowatt,
            "MW" => Self::Megawatt,
            _ => return None,
        })
    }

    pub fn to_watts(self, amount: f64) -> f64 {
        match self {
            Self::Watt => amount,
            Self::Kilowatt => amount * 1_000.0,
            Self::Megawatt => amount * 1_000_000.0,
        }
    }
}

/// Energy units accepted in TOML input, normalized to Joules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyUnit {
    Joule,
    Kilojoule,
    Megajoule,
    WattHour,
    KilowattHour,
    MegawattHour,
}

impl EnergyUnit {
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "J" => Self::Joule,
            "kJ" => Self::Kilojoule,
            "MJ" => Self::Megajoule,
            "Wh" => Self::WattHour,
            "kWh" => Self::KilowattHour,
            "MWh" => Self::MegawattHour,
            _ => return None,
        })
    }

    pub fn to_joules(self, amount: f64) -> f64 {
        match self {
            Self::Joule => amount,
            Self::Kilojoule => amount * 1_000.0,
            Self::Megajoule => amount * 1_000_000.0,
            Self::WattHour => amount * 3_600.0,
            Self::KilowattHour => amount * 3_600_000.0,
            Self::MegawattHour => amount * 3_600_000_000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturating_add_caps_at_max_flow() {
        let a = Watts::new(MAX_FLOW - 1);
        let b = Watts::new(10);
        assert!((a + b).is_unbounded());
    }

    #[test]
    fn div_ceil_rounds_up() {
        let w = Watts::new(10);
        assert_eq!(w.div_ceil_by(0.5).value(), 20);
        assert_eq!(Watts::new(21).div_ceil_by(2.0).value(), 11);
    }

    #[test]
    fn mul_floor_rounds_down() {
        assert_eq!(Watts::new(21).mul_floor_by(0.5).value(), 10);
    }

    #[test]
    fn unbounded_display() {
        assert_eq!(Watts::UNLIMITED.to_string(), "unlimited");
        assert_eq!(Watts::new(5).to_string(), "5 W");
    }

    #[test]
    fn time_unit_parses_plurals_and_abbreviations() {
        assert_eq!(TimeUnit::from_tag("hrs"), Some(TimeUnit::Hour));
        assert_eq!(TimeUnit::from_tag("days"), Some(TimeUnit::Day));
        assert_eq!(TimeUnit::Hour.to_seconds(1.0), 3600.0);
    }
}
