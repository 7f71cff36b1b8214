//! Value newtypes shared by the detectors and the aggregator.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Pct(f64);

impl Pct {
    // A 'general' % clamped between 0 and 1
    pub const fn new(val: f64) -> Self {
        let v = if val.is_nan() || val < 0.0 {
            0.0
        } else if val > 1.0 {
            1.0
        } else {
            val
        };
        Self(v)
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for Pct {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}%", self.0 * 100.)
    }
}

/// Normalized significance of a single factor. Always inside [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Strength(f64);

impl Strength {
    pub const fn new(val: f64) -> Self {
        let v = if val.is_nan() || val < 0.0 {
            0.0
        } else if val > 1.0 {
            1.0
        } else {
            val
        };
        Self(v)
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Prob(f64);

impl Prob {
    pub const fn new(val: f64) -> Self {
        let v = if val.is_nan() || val < 0.0 {
            0.0
        } else if val > 1.0 {
            1.0
        } else {
            val
        };
        Self(v)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for Prob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}%", self.0 * 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct BaseVol(f64);

impl BaseVol {
    pub const fn new(val: f64) -> Self {
        let v = if val.is_nan() || val < 0.0 { 0.0 } else { val };
        Self(v)
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for BaseVol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let val = self.0;
        if val >= 1_000_000.0 {
            write!(f, "{:.1}M", val / 1_000_000.0)
        } else if val >= 1_000.0 {
            write!(f, "{:.0}K", val / 1_000.0)
        } else {
            write!(f, "{:.2}", val)
        }
    }
}

/// A behavioral contract for anything that behaves like a price.
pub trait PriceLike {
    fn value(&self) -> f64;

    const MIN_EPSILON: f64 = 1e-12;

    fn is_positive(&self) -> bool {
        self.value() > Self::MIN_EPSILON
    }

    /// Finite and strictly positive.
    fn is_valid_level(&self) -> bool {
        self.value().is_finite() && self.is_positive()
    }

    fn percent_diff_from_0_1<R: PriceLike>(&self, reference: &R) -> f64 {
        if !reference.is_positive() {
            return 0.0;
        }

        (self.value() - reference.value()).abs() / reference.value()
    }

    /// Formats a price with "Trader Precision" adaptive decimals.
    fn format_price(&self) -> String {
        let price = self.value();
        if price == 0.0 {
            return "$0.00".to_string();
        }

        let abs_price = price.abs();

        if abs_price >= 1000.0 {
            format!("${:.2}", price)
        } else if abs_price >= 1.0 {
            format!("${:.4}", price)
        } else if abs_price >= 0.01 {
            format!("${:.5}", price)
        } else {
            format!("${:.8}", price)
        }
    }
}

macro_rules! impl_into_price {
    ($from:ident) => {
        impl From<$from> for Price {
            fn from(p: $from) -> Self {
                Price::new(p.value())
            }
        }
    };
}

macro_rules! define_price_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
        #[serde(transparent)]
        pub struct $name(f64);

        impl From<f64> for $name {
            fn from(v: f64) -> Self {
                $name::new(v)
            }
        }

        impl $name {
            pub const fn new(val: f64) -> Self {
                // Absolute prices should not be negative
                let v = if val < 0.0 { 0.0 } else { val };
                Self(v)
            }
        }

        impl Add for $name {
            type Output = f64;

            fn add(self, rhs: Self) -> Self::Output {
                self.value() + rhs.value()
            }
        }

        impl Sub for $name {
            type Output = f64;

            fn sub(self, rhs: Self) -> Self::Output {
                self.value() - rhs.value()
            }
        }

        impl Div for $name {
            type Output = f64;

            fn div(self, rhs: Self) -> Self::Output {
                self.value() / rhs.value()
            }
        }

        impl PriceLike for $name {
            fn value(&self) -> f64 {
                self.0
            }
        }

        impl Mul<f64> for $name {
            type Output = $name;

            fn mul(self, rhs: f64) -> Self::Output {
                $name::new(self.value() * rhs)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.format_price())
            }
        }
    };
}

// Generate the Price Hierarchy
define_price_type!(Price);
define_price_type!(OpenPrice);
define_price_type!(HighPrice);
define_price_type!(LowPrice);
define_price_type!(ClosePrice);

impl_into_price!(OpenPrice);
impl_into_price!(HighPrice);
impl_into_price!(LowPrice);
impl_into_price!(ClosePrice);

/// Equal-width partition of `[start, end]` into `n_chunks` bins.
#[derive(serde::Deserialize, serde::Serialize, Default, Debug, Clone)]
pub struct PriceRange<T: PriceLike> {
    pub start: T,
    pub end: T,
    pub n_chunks: usize,
}

impl<T: PriceLike> PriceRange<T> {
    pub fn new(start: T, end: T, n_chunks: usize) -> Self {
        Self {
            start,
            end,
            n_chunks,
        }
    }

    pub fn chunk_size(&self) -> f64 {
        (self.end.value() - self.start.value()) / self.n_chunks as f64
    }

    pub fn chunk_index(&self, value: f64) -> usize {
        let index = ((value - self.start.value()) / self.chunk_size()).max(0.0);
        (index as usize).min(self.n_chunks - 1)
    }

    pub fn chunk_bounds(&self, idx: usize) -> (f64, f64) {
        let low = self.start.value() + idx as f64 * self.chunk_size();
        let high = self.start.value() + (idx + 1) as f64 * self.chunk_size();
        (low, high)
    }

    pub fn chunk_midpoint(&self, idx: usize) -> f64 {
        let (low, high) = self.chunk_bounds(idx);
        (low + high) / 2.0
    }

    pub fn count_intersecting_chunks(&self, low: f64, high: f64) -> usize {
        let mut x_low = low;
        let mut x_high = high;

        if x_high < x_low {
            (x_low, x_high) = (x_high, x_low);
        }

        let first = ((x_low - self.start.value()) / self.chunk_size()).floor() as isize;
        let last = ((x_high - self.start.value()) / self.chunk_size()).floor() as isize;

        let first = first.max(0);
        let last = last.min((self.n_chunks - 1) as isize);

        if last < first {
            return 0;
        }

        (last - first + 1) as usize
    }
}
