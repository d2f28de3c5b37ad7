// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RGB color type in the `r:g:b` wire format.
//!
//! The cloud API and the push relay both exchange colors as three decimal
//! channels separated by colons, e.g. `"255:128:0"`.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

use super::{Hue, Saturation, convert};

/// RGB color with 8-bit channels (0-255).
///
/// # Examples
///
/// ```
/// use hearth_sync::types::RgbColor;
///
/// let orange: RgbColor = "255:128:0".parse().unwrap();
/// assert_eq!(orange.red(), 255);
/// assert_eq!(orange.green(), 128);
/// assert_eq!(orange.blue(), 0);
/// assert_eq!(orange.to_string(), "255:128:0");
///
/// assert!("255:128".parse::<RgbColor>().is_err());
/// assert!("300:0:0".parse::<RgbColor>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RgbColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl RgbColor {
    /// Creates a new RGB color.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Returns the red component.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Returns the green component.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Returns the blue component.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }

    /// Builds the fully bright color for a hue/saturation pair.
    #[must_use]
    pub fn from_hue_sat(hue: Hue, saturation: Saturation) -> Self {
        convert::hue_sat_to_rgb(hue, saturation)
    }

    /// Returns the hue/saturation pair of this color, ignoring its value.
    #[must_use]
    pub fn to_hue_sat(&self) -> (Hue, Saturation) {
        convert::rgb_to_hue_sat(*self)
    }

    /// Creates a white color.
    #[must_use]
    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }
}

impl Default for RgbColor {
    fn default() -> Self {
        Self::white()
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.red, self.green, self.blue)
    }
}

impl FromStr for RgbColor {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split(':');
        let mut channel = || {
            parts
                .next()
                .and_then(|part| part.trim().parse::<u8>().ok())
                .ok_or_else(|| ValueError::InvalidColor(s.to_string()))
        };
        let red = channel()?;
        let green = channel()?;
        let blue = channel()?;

        if parts.next().is_some() {
            return Err(ValueError::InvalidColor(s.to_string()));
        }
        Ok(Self::new(red, green, blue))
    }
}

impl From<(u8, u8, u8)> for RgbColor {
    fn from((red, green, blue): (u8, u8, u8)) -> Self {
        Self::new(red, green, blue)
    }
}
