// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Unit conversions between host characteristics and device units.
//!
//! Every function here is pure and total: zero inputs are treated as the
//! smallest positive value instead of dividing by zero, and results are
//! rounded to the nearest integer. Callers clamp the results to the range
//! of the characteristic they feed.

use super::{Hue, RgbColor, Saturation};

/// Converts mireds to Kelvin, rounded to the nearest integer.
///
/// # Examples
///
/// ```
/// use hearth_sync::types::convert::mired_to_kelvin;
///
/// assert_eq!(mired_to_kelvin(300), 3333);
/// assert_eq!(mired_to_kelvin(140), 7143);
/// ```
#[must_use]
pub fn mired_to_kelvin(mired: u32) -> u32 {
    reciprocal_million(mired)
}

/// Converts Kelvin to mireds, rounded to the nearest integer.
///
/// # Examples
///
/// ```
/// use hearth_sync::types::convert::kelvin_to_mired;
///
/// assert_eq!(kelvin_to_mired(3333), 300);
/// assert_eq!(kelvin_to_mired(6500), 154);
/// ```
#[must_use]
pub fn kelvin_to_mired(kelvin: u32) -> u32 {
    reciprocal_million(kelvin)
}

fn reciprocal_million(value: u32) -> u32 {
    let value = value.max(1);
    (1_000_000 + value / 2) / value
}

/// Converts a hue/saturation pair to RGB at full brightness.
///
/// # Examples
///
/// ```
/// use hearth_sync::types::{Hue, Saturation, RgbColor};
/// use hearth_sync::types::convert::hue_sat_to_rgb;
///
/// let green = hue_sat_to_rgb(Hue::normalized(120), Saturation::MAX);
/// assert_eq!(green, RgbColor::new(0, 255, 0));
/// ```
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::many_single_char_names
)]
pub fn hue_sat_to_rgb(hue: Hue, saturation: Saturation) -> RgbColor {
    let h = f32::from(hue.value());
    let c = f32::from(saturation.value()) / 100.0;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = 1.0 - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    // Safe: each channel is within 0.0..=1.0 before scaling
    let channel = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    RgbColor::new(channel(r), channel(g), channel(b))
}

/// Converts an RGB color to its hue/saturation pair.
///
/// The value (brightness) component is discarded; brightness is a separate
/// characteristic.
///
/// # Examples
///
/// ```
/// use hearth_sync::types::RgbColor;
/// use hearth_sync::types::convert::rgb_to_hue_sat;
///
/// let (hue, sat) = rgb_to_hue_sat(RgbColor::new(255, 0, 0));
/// assert_eq!((hue.value(), sat.value()), (0, 100));
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::many_single_char_names)]
pub fn rgb_to_hue_sat(rgb: RgbColor) -> (Hue, Saturation) {
    let r = f32::from(rgb.red()) / 255.0;
    let g = f32::from(rgb.green()) / 255.0;
    let b = f32::from(rgb.blue()) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let saturation = if max == 0.0 {
        0.0
    } else {
        (delta / max) * 100.0
    };

    let hue = if delta < f32::EPSILON {
        0.0
    } else if (max - r).abs() < f32::EPSILON {
        60.0 * (((g - b) / delta) % 6.0)
    } else if (max - g).abs() < f32::EPSILON {
        60.0 * (((b - r) / delta) + 2.0)
    } else {
        60.0 * (((r - g) / delta) + 4.0)
    };

    (
        Hue::normalized(hue.round() as i64),
        Saturation::clamped(saturation.round() as i64),
    )
}

/// Approximates the hue/saturation of a black-body light source.
///
/// Used to shadow a color-temperature write onto the hue and saturation
/// characteristics so the host's color picker follows the white point.
///
/// # Examples
///
/// ```
/// use hearth_sync::types::convert::mired_to_hue_sat;
///
/// // Warm white sits in the orange part of the wheel
/// let (hue, sat) = mired_to_hue_sat(300);
/// assert!((20..=40).contains(&hue.value()));
/// assert!(sat.value() > 30);
/// ```
#[must_use]
pub fn mired_to_hue_sat(mired: u32) -> (Hue, Saturation) {
    rgb_to_hue_sat(kelvin_to_rgb(mired_to_kelvin(mired)))
}

/// Black-body RGB approximation (valid for 1000K-40000K).
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn kelvin_to_rgb(kelvin: u32) -> RgbColor {
    let temp = f64::from(kelvin.clamp(1000, 40_000)) / 100.0;

    let red = if temp <= 66.0 {
        255.0
    } else {
        329.698_727_446 * (temp - 60.0).powf(-0.133_204_759_2)
    };

    let green = if temp <= 66.0 {
        99.470_802_586_1 * temp.ln() - 161.119_568_166_1
    } else {
        288.122_169_528_3 * (temp - 60.0).powf(-0.075_514_849_2)
    };

    let blue = if temp >= 66.0 {
        255.0
    } else if temp <= 19.0 {
        0.0
    } else {
        138.517_731_223_1 * (temp - 10.0).ln() - 305.044_792_730_7
    };

    // Safe: clamped into 0..=255
    let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
    RgbColor::new(channel(red), channel(green), channel(blue))
}
