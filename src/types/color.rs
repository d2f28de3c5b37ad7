// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Color types for the lightbulb characteristics.
//!
//! The host describes color with hue (degrees), saturation (percent) and
//! color temperature in mireds. Devices speak Kelvin or RGB; see
//! [`convert`](super::convert) for the translations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

use super::convert;

/// Color temperature in mireds (140-500).
///
/// Lower values are cooler (bluer), higher values warmer.
///
/// - 140 (~7143K) - Cool daylight, also the "not in temperature mode" marker
/// - 250 (4000K) - Neutral white
/// - 500 (2000K) - Warm candlelight
///
/// # Examples
///
/// ```
/// use hearth_sync::types::Mired;
///
/// let ct = Mired::new(250).unwrap();
/// assert_eq!(ct.to_kelvin(), 4000);
///
/// // Wire values are clamped
/// assert_eq!(Mired::clamped(90).value(), 140);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mired(u16);

impl Mired {
    /// Minimum color temperature accepted by the characteristic.
    pub const MIN: u16 = 140;

    /// Maximum color temperature accepted by the characteristic.
    pub const MAX: u16 = 500;

    /// The coolest value, written when the accessory leaves temperature mode.
    pub const COOLEST: Self = Self(Self::MIN);

    /// The warmest value.
    pub const WARMEST: Self = Self(Self::MAX);

    /// Creates a new color temperature value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value is outside [140, 500].
    pub fn new(value: u16) -> Result<Self, ValueError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ValueError::OutOfRange {
                min: u32::from(Self::MIN),
                max: u32::from(Self::MAX),
                actual: u32::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Creates a color temperature, clamping to [140, 500].
    #[must_use]
    pub fn clamped(value: i64) -> Self {
        Self::clamped_to(value, MiredRange::default())
    }

    /// Creates a color temperature, clamping to a device sub-range.
    #[must_use]
    pub fn clamped_to(value: i64, range: MiredRange) -> Self {
        // Safe: clamped into a u16 range
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = value.clamp(i64::from(range.min()), i64::from(range.max())) as u16;
        Self(value)
    }

    /// Converts a Kelvin reading into mireds within a device sub-range.
    #[must_use]
    pub fn from_kelvin(kelvin: u32, range: MiredRange) -> Self {
        Self::clamped_to(i64::from(convert::kelvin_to_mired(kelvin)), range)
    }

    /// Returns the value in mireds.
    #[must_use]
    pub const fn value(&self) -> u16 {
        self.0
    }

    /// Returns the color temperature in Kelvin, rounded to the nearest integer.
    #[must_use]
    pub fn to_kelvin(&self) -> u32 {
        convert::mired_to_kelvin(u32::from(self.0))
    }
}

impl Default for Mired {
    fn default() -> Self {
        Self::COOLEST
    }
}

impl fmt::Display for Mired {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mired", self.0)
    }
}

/// Device-supported color temperature range in mireds.
///
/// Always a sub-range of [140, 500]; construction normalizes swapped or
/// out-of-bounds limits.
///
/// # Examples
///
/// ```
/// use hearth_sync::types::MiredRange;
///
/// let range = MiredRange::new(153, 370);
/// assert_eq!(range.min(), 153);
/// assert_eq!(MiredRange::new(600, 100), MiredRange::default());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(u16, u16)", into = "(u16, u16)")]
pub struct MiredRange {
    min: u16,
    max: u16,
}

impl MiredRange {
    /// Creates a range, clamping both limits into [140, 500].
    #[must_use]
    pub fn new(min: u16, max: u16) -> Self {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min: lo.clamp(Mired::MIN, Mired::MAX),
            max: hi.clamp(Mired::MIN, Mired::MAX),
        }
    }

    /// Lower limit in mireds.
    #[must_use]
    pub const fn min(&self) -> u16 {
        self.min
    }

    /// Upper limit in mireds.
    #[must_use]
    pub const fn max(&self) -> u16 {
        self.max
    }
}

impl Default for MiredRange {
    fn default() -> Self {
        Self {
            min: Mired::MIN,
            max: Mired::MAX,
        }
    }
}

impl From<(u16, u16)> for MiredRange {
    fn from((min, max): (u16, u16)) -> Self {
        Self::new(min, max)
    }
}

impl From<MiredRange> for (u16, u16) {
    fn from(range: MiredRange) -> Self {
        (range.min, range.max)
    }
}

/// Device-supported color temperature range in Kelvin.
///
/// Commands sent to the device are clamped into this range after the mired
/// conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct KelvinRange {
    min: u32,
    max: u32,
}

impl KelvinRange {
    /// Creates a range; swapped limits are reordered.
    #[must_use]
    pub fn new(min: u32, max: u32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Lower limit in Kelvin.
    #[must_use]
    pub const fn min(&self) -> u32 {
        self.min
    }

    /// Upper limit in Kelvin.
    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Clamps a Kelvin value into this range.
    #[must_use]
    pub fn clamp(&self, kelvin: u32) -> u32 {
        kelvin.clamp(self.min, self.max)
    }
}

impl Default for KelvinRange {
    fn default() -> Self {
        Self {
            min: 2700,
            max: 6500,
        }
    }
}

impl From<(u32, u32)> for KelvinRange {
    fn from((min, max): (u32, u32)) -> Self {
        Self::new(min, max)
    }
}

impl From<KelvinRange> for (u32, u32) {
    fn from(range: KelvinRange) -> Self {
        (range.min, range.max)
    }
}

/// Hue in degrees, [0, 360).
///
/// Out-of-range inputs wrap around the color wheel, so `360` is `0`.
///
/// # Examples
///
/// ```
/// use hearth_sync::types::Hue;
///
/// assert_eq!(Hue::normalized(370).value(), 10);
/// assert_eq!(Hue::normalized(-30).value(), 330);
/// assert!(Hue::new(360).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hue(u16);

impl Hue {
    /// Exclusive upper bound.
    pub const MAX_EXCLUSIVE: u16 = 360;

    /// Creates a new hue.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if `value >= 360`.
    pub fn new(value: u16) -> Result<Self, ValueError> {
        if value >= Self::MAX_EXCLUSIVE {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: u32::from(Self::MAX_EXCLUSIVE - 1),
                actual: u32::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Creates a hue, wrapping into [0, 360).
    #[must_use]
    pub fn normalized(value: i64) -> Self {
        // Safe: rem_euclid result is within 0..360
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = value.rem_euclid(i64::from(Self::MAX_EXCLUSIVE)) as u16;
        Self(value)
    }

    /// Returns the hue in degrees.
    #[must_use]
    pub const fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for Hue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.0)
    }
}

/// Saturation in percent, [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Saturation(u8);

impl Saturation {
    /// Full saturation.
    pub const MAX: Self = Self(100);

    /// Creates a new saturation.
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

    /// Creates a saturation, clamping to [0, 100].
    #[must_use]
    pub fn clamped(value: i64) -> Self {
        // Safe: clamped into 0..=100
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = value.clamp(0, 100) as u8;
        Self(value)
    }

    /// Returns the saturation percentage.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Saturation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
