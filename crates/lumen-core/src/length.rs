#![forbid(unsafe_code)]

//! Resolution-independent UI lengths.
//!
//! A [`UiLength`] is a magnitude tagged with the [`Unit`] it is expressed
//! in. No conversion happens here: turning a length into device pixels
//! needs screen metrics that only a platform core has.

use std::fmt;

/// Unit of a [`UiLength`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Unit {
    /// Height of the screen's default UI font. The recommended unit.
    #[default]
    Sem,
    /// A physical pixel of the screen the element is on.
    RealPixel,
    /// Perceived size of a pixel on a legacy 96 DPI desktop monitor.
    Pixel96,
}

impl Unit {
    /// Short suffix used when formatting lengths.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Sem => "sem",
            Self::RealPixel => "px",
            Self::Pixel96 => "dip",
        }
    }
}

/// A length or distance used to size and space UI elements.
///
/// Equality is component-wise: `1 sem` and `1 dip` are different lengths
/// even on a screen where they happen to render identically.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UiLength {
    pub unit: Unit,
    pub value: f64,
}

impl UiLength {
    #[must_use]
    pub const fn new(unit: Unit, value: f64) -> Self {
        Self { unit, value }
    }

    #[must_use]
    pub const fn sem(value: f64) -> Self {
        Self::new(Unit::Sem, value)
    }

    #[must_use]
    pub const fn real_pixel(value: f64) -> Self {
        Self::new(Unit::RealPixel, value)
    }

    #[must_use]
    pub const fn pixel96(value: f64) -> Self {
        Self::new(Unit::Pixel96, value)
    }

    /// Whether the magnitude is zero, regardless of unit.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.value == 0.0
    }
}

impl fmt::Display for UiLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}
