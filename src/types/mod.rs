// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for accessory characteristics.
//!
//! Each type keeps its value inside the characteristic's valid range. Checked
//! constructors (`new`) reject bad input from callers, while the `clamped` and
//! `normalized` constructors used by the ingestion adapters clamp wire values
//! instead of rejecting them.
//!
//! # Types
//!
//! - [`PowerState`] - On/Off power state
//! - [`Brightness`] - Brightness level (0-100%)
//! - [`Hue`] - Hue in degrees (0-359)
//! - [`Saturation`] - Saturation (0-100%)
//! - [`Mired`] - Color temperature in mireds (140-500)
//! - [`MiredRange`] / [`KelvinRange`] - Device-supported color temperature ranges
//! - [`RgbColor`] - RGB color in the `r:g:b` wire format
//!
//! Unit conversions live in [`convert`].

mod brightness;
mod color;
pub mod convert;
mod power;
mod rgb_color;

pub use brightness::Brightness;
pub use color::{Hue, KelvinRange, Mired, MiredRange, Saturation};
pub use power::PowerState;
pub use rgb_color::RgbColor;
