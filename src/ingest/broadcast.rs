// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser for short-range broadcast advertisements.

use crate::config::DeviceConfig;
use crate::error::ParseError;
use crate::state::StateChange;

use super::ChangeCollector;

/// A decoded broadcast advertisement.
///
/// Advertisements carry fewer fields than the cloud payloads: no color and
/// no firmware version.
///
/// # Examples
///
/// ```
/// use hearth_sync::ingest::BroadcastPayload;
///
/// let adv = BroadcastPayload::new("WoBulb")
///     .with_address("c0:ff:ee:00:00:01")
///     .with_power(true)
///     .with_color_temperature(2700);
///
/// assert!(adv.matches(Some("wobulb"), Some("C0:FF:EE:00:00:01")));
/// assert!(!adv.matches(Some("WoPlug"), None));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastPayload {
    /// Model identifier carried by the advertisement.
    pub model: String,
    /// Advertiser address, if decoded.
    pub address: Option<String>,
    /// Power state.
    pub power: Option<bool>,
    /// Brightness (0-100).
    pub brightness: Option<i64>,
    /// Color temperature in Kelvin.
    pub color_temperature: Option<i64>,
}

impl BroadcastPayload {
    /// Creates an advertisement for a model with no fields.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            address: None,
            power: None,
            brightness: None,
            color_temperature: None,
        }
    }

    /// Sets the advertiser address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Sets the power state.
    #[must_use]
    pub fn with_power(mut self, on: bool) -> Self {
        self.power = Some(on);
        self
    }

    /// Sets the brightness.
    #[must_use]
    pub fn with_brightness(mut self, brightness: i64) -> Self {
        self.brightness = Some(brightness);
        self
    }

    /// Sets the color temperature in Kelvin.
    #[must_use]
    pub fn with_color_temperature(mut self, kelvin: i64) -> Self {
        self.color_temperature = Some(kelvin);
        self
    }

    /// Returns `true` if this advertisement belongs to the expected device.
    ///
    /// Model names compare case-insensitively; addresses ignore separators
    /// and case. A missing expectation matches anything, and an
    /// advertisement without an address only matches on model.
    #[must_use]
    pub fn matches(&self, model: Option<&str>, address: Option<&str>) -> bool {
        let model_ok = model.is_none_or(|m| m.eq_ignore_ascii_case(&self.model));
        let address_ok = match (address, self.address.as_deref()) {
            (Some(expected), Some(actual)) => {
                super::normalize_device_id(expected) == super::normalize_device_id(actual)
            }
            _ => true,
        };
        model_ok && address_ok
    }

    /// Maps the advertisement into state changes.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::UnexpectedModel` if the advertisement belongs to
    /// another model or address.
    pub fn to_state_changes(&self, config: &DeviceConfig) -> Result<Vec<StateChange>, ParseError> {
        if !self.matches(config.model.as_deref(), config.address.as_deref()) {
            return Err(ParseError::UnexpectedModel {
                expected: config.model.clone().unwrap_or_default(),
                actual: self.model.clone(),
            });
        }

        let mut collector = ChangeCollector::new(&config.capabilities);
        collector.power(self.power);
        collector.brightness(self.brightness);
        collector.kelvin(self.color_temperature);
        Ok(collector.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Capabilities;
    use crate::types::{Mired, PowerState};

    fn config() -> DeviceConfig {
        DeviceConfig::local("C0FFEE000001")
            .with_model("WoBulb")
            .with_address("C0:FF:EE:00:00:01")
            .with_capabilities(Capabilities::color_bulb())
    }

    #[test]
    fn power_and_temperature_only() {
        let adv = BroadcastPayload::new("WoBulb")
            .with_power(false)
            .with_color_temperature(2000);
        let changes = adv.to_state_changes(&config()).unwrap();
        assert_eq!(
            changes,
            vec![
                StateChange::Power(PowerState::Off),
                StateChange::ColorTemperature(Mired::WARMEST),
            ]
        );
    }

    #[test]
    fn other_model_is_rejected() {
        let adv = BroadcastPayload::new("WoPlug").with_power(true);
        assert!(matches!(
            adv.to_state_changes(&config()),
            Err(ParseError::UnexpectedModel { expected, actual })
                if expected == "WoBulb" && actual == "WoPlug"
        ));
    }

    #[test]
    fn other_address_is_rejected() {
        let adv = BroadcastPayload::new("WoBulb")
            .with_address("11:22:33:44:55:66")
            .with_power(true);
        assert!(adv.to_state_changes(&config()).is_err());
    }

    #[test]
    fn no_expectation_matches_anything() {
        let adv = BroadcastPayload::new("Anything").with_address("AA");
        assert!(adv.matches(None, None));
    }
}
