// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Accessory state tracking and diffing.

use crate::types::{Brightness, Hue, Mired, PowerState, Saturation};

use super::{Characteristic, CharacteristicUpdate, CharacteristicValue, StateChange};

/// Characteristics in publish order.
const PUBLISH_ORDER: [Characteristic; 6] = [
    Characteristic::On,
    Characteristic::Brightness,
    Characteristic::ColorTemperature,
    Characteristic::Hue,
    Characteristic::Saturation,
    Characteristic::FirmwareRevision,
];

/// Characteristic state of one accessory.
///
/// Power is always known; the other fields are optional because a device
/// may not support them or may not have reported them yet. Once a field is
/// known it is never cleared by ingestion: payloads only overwrite the
/// fields they carry.
///
/// # Examples
///
/// ```
/// use hearth_sync::state::AccessoryState;
/// use hearth_sync::types::{Brightness, PowerState};
///
/// let mut state = AccessoryState::new();
/// state.set_power(PowerState::On);
/// state.set_brightness(Brightness::new(50).unwrap());
/// assert!(state.power().is_on());
/// assert_eq!(state.brightness().map(|b| b.value()), Some(50));
/// assert!(state.hue().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessoryState {
    power: PowerState,
    brightness: Option<Brightness>,
    hue: Option<Hue>,
    saturation: Option<Saturation>,
    color_temperature: Option<Mired>,
    firmware_version: Option<String>,
}

impl AccessoryState {
    /// Creates a new state with power off and no other known values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Power ==========

    /// Gets the power state.
    #[must_use]
    pub const fn power(&self) -> PowerState {
        self.power
    }

    /// Sets the power state.
    pub fn set_power(&mut self, power: PowerState) {
        self.power = power;
    }

    // ========== Brightness ==========

    /// Gets the brightness.
    #[must_use]
    pub const fn brightness(&self) -> Option<Brightness> {
        self.brightness
    }

    /// Sets the brightness.
    pub fn set_brightness(&mut self, value: Brightness) {
        self.brightness = Some(value);
    }

    // ========== Color ==========

    /// Gets the hue.
    #[must_use]
    pub const fn hue(&self) -> Option<Hue> {
        self.hue
    }

    /// Sets the hue.
    pub fn set_hue(&mut self, hue: Hue) {
        self.hue = Some(hue);
    }

    /// Gets the saturation.
    #[must_use]
    pub const fn saturation(&self) -> Option<Saturation> {
        self.saturation
    }

    /// Sets the saturation.
    pub fn set_saturation(&mut self, saturation: Saturation) {
        self.saturation = Some(saturation);
    }

    /// Gets the color temperature.
    #[must_use]
    pub const fn color_temperature(&self) -> Option<Mired> {
        self.color_temperature
    }

    /// Sets the color temperature.
    pub fn set_color_temperature(&mut self, ct: Mired) {
        self.color_temperature = Some(ct);
    }

    // ========== Firmware ==========

    /// Gets the normalized firmware version.
    #[must_use]
    pub fn firmware_version(&self) -> Option<&str> {
        self.firmware_version.as_deref()
    }

    /// Sets the firmware version.
    pub fn set_firmware_version(&mut self, version: impl Into<String>) {
        self.firmware_version = Some(version.into());
    }

    // ========== State Changes ==========

    /// Applies a state change and returns whether the state actually changed.
    pub fn apply(&mut self, change: &StateChange) -> bool {
        match change {
            StateChange::Power(power) => replace(&mut self.power, *power),
            StateChange::Brightness(value) => replace_some(&mut self.brightness, *value),
            StateChange::Hue(hue) => replace_some(&mut self.hue, *hue),
            StateChange::Saturation(sat) => replace_some(&mut self.saturation, *sat),
            StateChange::ColorTemperature(ct) => replace_some(&mut self.color_temperature, *ct),
            StateChange::FirmwareVersion(version) => {
                if self.firmware_version.as_deref() == Some(version.as_str()) {
                    false
                } else {
                    self.firmware_version = Some(version.clone());
                    true
                }
            }
            StateChange::Batch(changes) => {
                let mut any_changed = false;
                for c in changes {
                    if self.apply(c) {
                        any_changed = true;
                    }
                }
                any_changed
            }
        }
    }

    // ========== Publishing ==========

    /// Returns the host value of a characteristic, if known.
    #[must_use]
    pub fn value_of(&self, characteristic: Characteristic) -> Option<CharacteristicValue> {
        match characteristic {
            Characteristic::On => Some(CharacteristicValue::Bool(self.power.is_on())),
            Characteristic::Brightness => self
                .brightness
                .map(|b| CharacteristicValue::Int(u32::from(b.value()))),
            Characteristic::Hue => self
                .hue
                .map(|h| CharacteristicValue::Int(u32::from(h.value()))),
            Characteristic::Saturation => self
                .saturation
                .map(|s| CharacteristicValue::Int(u32::from(s.value()))),
            Characteristic::ColorTemperature => self
                .color_temperature
                .map(|ct| CharacteristicValue::Int(u32::from(ct.value()))),
            Characteristic::FirmwareRevision => self
                .firmware_version
                .clone()
                .map(CharacteristicValue::Text),
        }
    }

    /// Returns an update for every known characteristic.
    #[must_use]
    pub fn updates(&self) -> Vec<CharacteristicUpdate> {
        PUBLISH_ORDER
            .iter()
            .filter_map(|c| {
                self.value_of(*c)
                    .map(|value| CharacteristicUpdate::new(*c, value))
            })
            .collect()
    }

    /// Returns the characteristics currently known.
    #[must_use]
    pub fn known_characteristics(&self) -> Vec<Characteristic> {
        PUBLISH_ORDER
            .iter()
            .copied()
            .filter(|c| self.value_of(*c).is_some())
            .collect()
    }
}

/// Computes the host updates needed to bring `published` up to `current`.
///
/// Only characteristics known in `current` whose value differs from
/// `published` are returned, so `diff(s, s)` is always empty.
#[must_use]
pub fn diff(current: &AccessoryState, published: &AccessoryState) -> Vec<CharacteristicUpdate> {
    PUBLISH_ORDER
        .iter()
        .filter_map(|c| {
            let value = current.value_of(*c)?;
            (published.value_of(*c).as_ref() != Some(&value))
                .then(|| CharacteristicUpdate::new(*c, value))
        })
        .collect()
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

fn replace_some<T: PartialEq>(slot: &mut Option<T>, value: T) -> bool {
    if slot.as_ref() == Some(&value) {
        false
    } else {
        *slot = Some(value);
        true
    }
}
