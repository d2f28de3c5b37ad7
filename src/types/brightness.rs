// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Brightness type for the lightbulb characteristic.
//!
//! Values are always within 0-100%. Inputs from the wire are clamped rather
//! than rejected, so a device reporting `120` reads as `100`.

use std::fmt;

use crate::error::ValueError;

/// Brightness level as a percentage (0-100).
///
/// # Examples
///
/// ```
/// use hearth_sync::types::Brightness;
///
/// let dim = Brightness::new(75).unwrap();
/// assert_eq!(dim.value(), 75);
///
/// // Wire values are clamped
/// assert_eq!(Brightness::clamped(150).value(), 100);
/// assert_eq!(Brightness::clamped(-5).value(), 0);
///
/// // Invalid values return error from the checked constructor
/// assert!(Brightness::new(101).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Brightness(u8);

impl Brightness {
    /// Minimum brightness (0%).
    pub const MIN: Self = Self(0);

    /// Maximum brightness (100%).
    pub const MAX: Self = Self(100);

    /// Creates a new brightness value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value exceeds 100.
    pub fn new(value: u8) -> Result<Self, ValueError> {
        if value > 100 {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: 100,
                actual: u32::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Creates a brightness value, clamping to the valid range.
    #[must_use]
    pub fn clamped(value: i64) -> Self {
        // Safe: clamped into 0..=100
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = value.clamp(0, 100) as u8;
        Self(value)
    }

    /// Rounds to the nearest multiple of `step`, staying within 0-100.
    ///
    /// A step of 0 or 1 leaves the value unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use hearth_sync::types::Brightness;
    ///
    /// let b = Brightness::new(33).unwrap();
    /// assert_eq!(b.rounded_to_step(5).value(), 35);
    /// assert_eq!(b.rounded_to_step(1).value(), 33);
    /// ```
    #[must_use]
    pub fn rounded_to_step(self, step: u8) -> Self {
        if step <= 1 {
            return self;
        }
        let step = u16::from(step);
        let value = u16::from(self.0);
        let rounded = ((value + step / 2) / step) * step;
        Self::clamped(i64::from(rounded))
    }

    /// Returns the brightness percentage value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl TryFrom<u8> for Brightness {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
