// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host-facing characteristic identifiers and values.

use std::fmt;

/// A characteristic exposed to the host for one accessory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Characteristic {
    /// On/off state.
    On,
    /// Brightness percentage.
    Brightness,
    /// Hue in degrees.
    Hue,
    /// Saturation percentage.
    Saturation,
    /// Color temperature in mireds.
    ColorTemperature,
    /// Firmware revision string.
    FirmwareRevision,
}

impl Characteristic {
    /// Returns the characteristic name used by the host.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::On => "On",
            Self::Brightness => "Brightness",
            Self::Hue => "Hue",
            Self::Saturation => "Saturation",
            Self::ColorTemperature => "ColorTemperature",
            Self::FirmwareRevision => "FirmwareRevision",
        }
    }
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value published for a characteristic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharacteristicValue {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(u32),
    /// Text value.
    Text(String),
    /// Error indicator; hosts render the accessory as not responding.
    Error,
}

impl CharacteristicValue {
    /// Returns `true` for the error indicator.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }
}

impl fmt::Display for CharacteristicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Error => f.write_str("<error>"),
        }
    }
}

/// A single characteristic update for the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicUpdate {
    /// The characteristic being updated.
    pub characteristic: Characteristic,
    /// The new value.
    pub value: CharacteristicValue,
}

impl CharacteristicUpdate {
    /// Creates an update.
    #[must_use]
    pub const fn new(characteristic: Characteristic, value: CharacteristicValue) -> Self {
        Self {
            characteristic,
            value,
        }
    }

    /// Creates an error-indicator update for a characteristic.
    #[must_use]
    pub const fn error(characteristic: Characteristic) -> Self {
        Self::new(characteristic, CharacteristicValue::Error)
    }
}
