// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Accessory capabilities and device ranges.
//!
//! Capabilities decide which characteristics an accessory exposes and the
//! ranges its values are clamped to. They are configured per device, either
//! from one of the presets, with [`CapabilitiesBuilder`], or deserialized as
//! part of a [`DeviceConfig`](crate::config::DeviceConfig).

use serde::{Deserialize, Serialize};

use crate::types::{Brightness, KelvinRange, Mired, MiredRange};

/// Capabilities of an accessory.
///
/// # Examples
///
/// ```
/// use hearth_sync::Capabilities;
///
/// // Plain on/off switch
/// let plug = Capabilities::switch();
/// assert!(!plug.brightness);
///
/// // Full color bulb
/// let bulb = Capabilities::color_bulb();
/// assert!(bulb.color && bulb.color_temperature);
/// assert!(bulb.has_color_shadow());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Capabilities {
    /// Supports brightness control.
    pub brightness: bool,

    /// Supports hue/saturation color control.
    pub color: bool,

    /// Supports color temperature control.
    pub color_temperature: bool,

    /// Color temperature range exposed to the host, in mireds.
    pub mired_range: MiredRange,

    /// Color temperature range accepted by the device, in Kelvin.
    pub kelvin_range: KelvinRange,

    /// Brightness writes are rounded to multiples of this step.
    pub brightness_step: u8,

    /// Mired offset applied to color temperature writes before conversion.
    pub adaptive_lighting_shift: Option<i16>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::switch()
    }
}

impl Capabilities {
    /// Creates capabilities for a plain on/off device.
    #[must_use]
    pub fn switch() -> Self {
        Self {
            brightness: false,
            color: false,
            color_temperature: false,
            mired_range: MiredRange::default(),
            kelvin_range: KelvinRange::default(),
            brightness_step: 1,
            adaptive_lighting_shift: None,
        }
    }

    /// Creates capabilities for a dimmable white light.
    #[must_use]
    pub fn dimmable_light() -> Self {
        Self {
            brightness: true,
            ..Self::switch()
        }
    }

    /// Creates capabilities for a tunable white bulb.
    #[must_use]
    pub fn white_bulb() -> Self {
        Self {
            color_temperature: true,
            ..Self::dimmable_light()
        }
    }

    /// Creates capabilities for an RGB strip without white channel.
    #[must_use]
    pub fn strip_light() -> Self {
        Self {
            color: true,
            ..Self::dimmable_light()
        }
    }

    /// Creates capabilities for a full color bulb.
    ///
    /// - Brightness
    /// - Hue/saturation
    /// - Color temperature (2700K-6500K)
    #[must_use]
    pub fn color_bulb() -> Self {
        Self {
            color: true,
            color_temperature: true,
            ..Self::dimmable_light()
        }
    }

    /// Returns whether this device supports any light control features.
    #[must_use]
    pub const fn is_light(&self) -> bool {
        self.brightness || self.color || self.color_temperature
    }

    /// Returns whether color temperature and hue/saturation writes shadow
    /// each other.
    ///
    /// Only devices exposing both controls switch between temperature and
    /// color mode.
    #[must_use]
    pub const fn has_color_shadow(&self) -> bool {
        self.color && self.color_temperature
    }

    /// Clamps a mired value into the host range.
    #[must_use]
    pub fn clamp_mired(&self, mired: i64) -> Mired {
        Mired::clamped_to(mired, self.mired_range)
    }

    /// Returns the Kelvin value sent to the device for a color temperature
    /// write, after the adaptive-lighting shift.
    ///
    /// # Examples
    ///
    /// ```
    /// use hearth_sync::Capabilities;
    /// use hearth_sync::types::Mired;
    ///
    /// let mut caps = Capabilities::color_bulb();
    /// assert_eq!(caps.device_kelvin(Mired::new(300).unwrap()), 3333);
    ///
    /// caps.adaptive_lighting_shift = Some(50);
    /// assert_eq!(caps.device_kelvin(Mired::new(300).unwrap()), 2857);
    ///
    /// // Clamped to the device range
    /// assert_eq!(caps.device_kelvin(Mired::new(140).unwrap()), 5263);
    /// caps.adaptive_lighting_shift = None;
    /// assert_eq!(caps.device_kelvin(Mired::new(140).unwrap()), 6500);
    /// ```
    #[must_use]
    pub fn device_kelvin(&self, mired: Mired) -> u32 {
        let shifted = i64::from(mired.value())
            + self.adaptive_lighting_shift.map_or(0, i64::from);
        self.kelvin_range.clamp(self.clamp_mired(shifted).to_kelvin())
    }

    /// Rounds a brightness write to the configured step.
    #[must_use]
    pub fn round_brightness(&self, brightness: Brightness) -> Brightness {
        brightness.rounded_to_step(self.brightness_step)
    }
}

/// Builder for creating custom capabilities.
#[derive(Debug, Default)]
pub struct CapabilitiesBuilder {
    inner: Capabilities,
}

impl CapabilitiesBuilder {
    /// Creates a new builder starting from an on/off device.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables brightness support.
    #[must_use]
    pub fn with_brightness(mut self) -> Self {
        self.inner.brightness = true;
        self
    }

    /// Enables hue/saturation support.
    #[must_use]
    pub fn with_color(mut self) -> Self {
        self.inner.color = true;
        self
    }

    /// Enables color temperature support.
    #[must_use]
    pub fn with_color_temperature(mut self) -> Self {
        self.inner.color_temperature = true;
        self
    }

    /// Sets the host color temperature range in mireds.
    #[must_use]
    pub fn with_mired_range(mut self, min: u16, max: u16) -> Self {
        self.inner.mired_range = MiredRange::new(min, max);
        self
    }

    /// Sets the device color temperature range in Kelvin.
    #[must_use]
    pub fn with_kelvin_range(mut self, min: u32, max: u32) -> Self {
        self.inner.kelvin_range = KelvinRange::new(min, max);
        self
    }

    /// Sets the brightness step.
    #[must_use]
    pub fn with_brightness_step(mut self, step: u8) -> Self {
        self.inner.brightness_step = step.clamp(1, 100);
        self
    }

    /// Sets the adaptive-lighting mired shift.
    #[must_use]
    pub fn with_adaptive_lighting_shift(mut self, shift: i16) -> Self {
        self.inner.adaptive_lighting_shift = Some(shift);
        self
    }

    /// Builds the capabilities.
    #[must_use]
    pub fn build(self) -> Capabilities {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capabilities() {
        let caps = Capabilities::default();
        assert!(!caps.brightness);
        assert!(!caps.color);
        assert!(!caps.color_temperature);
        assert_eq!(caps.brightness_step, 1);
        assert!(!caps.is_light());
    }

    #[test]
    fn presets() {
        assert!(Capabilities::dimmable_light().is_light());
        assert!(!Capabilities::white_bulb().has_color_shadow());
        assert!(!Capabilities::strip_light().has_color_shadow());
        assert!(Capabilities::color_bulb().has_color_shadow());
    }

    #[test]
    fn builder_pattern() {
        let caps = CapabilitiesBuilder::new()
            .with_brightness()
            .with_color_temperature()
            .with_mired_range(153, 370)
            .with_kelvin_range(2700, 6500)
            .with_brightness_step(0)
            .build();

        assert!(caps.brightness);
        assert!(caps.color_temperature);
        assert!(!caps.color);
        assert_eq!(caps.mired_range, MiredRange::new(153, 370));
        assert_eq!(caps.brightness_step, 1);
    }

    #[test]
    fn clamp_mired_uses_device_range() {
        let caps = CapabilitiesBuilder::new().with_mired_range(153, 370).build();
        assert_eq!(caps.clamp_mired(100).value(), 153);
        assert_eq!(caps.clamp_mired(1000).value(), 370);
    }

    #[test]
    fn shift_is_clamped_before_conversion() {
        let caps = CapabilitiesBuilder::new()
            .with_color_temperature()
            .with_kelvin_range(2000, 9000)
            .with_adaptive_lighting_shift(100)
            .build();
        // 450 + 100 clamps to 500 mired = 2000K
        assert_eq!(caps.device_kelvin(Mired::new(450).unwrap()), 2000);

        let negative = CapabilitiesBuilder::new()
            .with_kelvin_range(2000, 9000)
            .with_adaptive_lighting_shift(-100)
            .build();
        // 200 - 100 clamps to 140 mired = 7143K
        assert_eq!(negative.device_kelvin(Mired::new(200).unwrap()), 7143);
    }

    #[test]
    fn round_brightness_step() {
        let caps = CapabilitiesBuilder::new()
            .with_brightness()
            .with_brightness_step(10)
            .build();
        assert_eq!(
            caps.round_brightness(Brightness::new(34).unwrap()).value(),
            30
        );
        assert_eq!(
            caps.round_brightness(Brightness::new(35).unwrap()).value(),
            40
        );
    }

    #[test]
    fn deserialize_camel_case_with_defaults() {
        let json = r#"{
            "brightness": true,
            "colorTemperature": true,
            "kelvinRange": [2000, 9000],
            "adaptiveLightingShift": -20
        }"#;
        let caps: Capabilities = serde_json::from_str(json).unwrap();
        assert!(caps.brightness);
        assert!(caps.color_temperature);
        assert!(!caps.color);
        assert_eq!(caps.kelvin_range, KelvinRange::new(2000, 9000));
        assert_eq!(caps.mired_range, MiredRange::default());
        assert_eq!(caps.adaptive_lighting_shift, Some(-20));
        assert_eq!(caps.brightness_step, 1);
    }
}
