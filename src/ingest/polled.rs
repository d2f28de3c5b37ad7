// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser for polled status responses.

use serde::Deserialize;

use crate::Capabilities;
use crate::error::ParseError;
use crate::state::StateChange;

use super::ChangeCollector;

/// Body of a cloud status query.
///
/// Every field is optional; devices only report what they support.
///
/// # Examples
///
/// ```
/// use hearth_sync::ingest::PolledStatus;
///
/// let body = serde_json::json!({
///     "deviceId": "C0FFEE000001",
///     "power": "on",
///     "brightness": 80,
///     "colorTemperature": 4000,
///     "version": "V3.1-2"
/// });
/// let status = PolledStatus::from_body(&body).unwrap();
/// assert_eq!(status.power.as_deref(), Some("on"));
/// assert_eq!(status.color_temperature, Some(4000));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolledStatus {
    /// Device identifier echoed by the API.
    #[serde(default)]
    pub device_id: Option<String>,

    /// Power word, `"on"` or `"off"`.
    #[serde(default)]
    pub power: Option<String>,

    /// Brightness (1-100).
    #[serde(default)]
    pub brightness: Option<i64>,

    /// Color as `r:g:b`.
    #[serde(default)]
    pub color: Option<String>,

    /// Color temperature in Kelvin.
    #[serde(default)]
    pub color_temperature: Option<i64>,

    /// Firmware version, string or number.
    #[serde(default)]
    pub version: Option<serde_json::Value>,
}

impl PolledStatus {
    /// Parses a status body.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` if a field has the wrong JSON type.
    pub fn from_body(body: &serde_json::Value) -> Result<Self, ParseError> {
        Ok(Self::deserialize(body)?)
    }

    /// Maps the reported fields into state changes.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidValue` for an unknown power word, an
    /// unparseable color or a non-scalar version.
    pub fn to_state_changes(&self, caps: &Capabilities) -> Result<Vec<StateChange>, ParseError> {
        let mut collector = ChangeCollector::new(caps);
        collector.power_word(self.power.as_deref())?;
        collector.brightness(self.brightness);
        collector.kelvin(self.color_temperature);
        collector.color(self.color.as_deref())?;
        collector.firmware(self.version.as_ref())?;
        Ok(collector.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Brightness, Hue, Mired, PowerState, Saturation};

    #[test]
    fn parse_full_status() {
        let body = serde_json::json!({
            "deviceId": "C0FFEE000001",
            "deviceType": "Color Bulb",
            "hubDeviceId": "000000000000",
            "power": "on",
            "brightness": 30,
            "color": "255:0:0",
            "colorTemperature": 3333,
            "version": "V3.1-2"
        });
        let status = PolledStatus::from_body(&body).unwrap();
        let changes = status
            .to_state_changes(&Capabilities::color_bulb())
            .unwrap();

        assert_eq!(
            changes,
            vec![
                StateChange::Power(PowerState::On),
                StateChange::Brightness(Brightness::new(30).unwrap()),
                StateChange::ColorTemperature(Mired::new(300).unwrap()),
                StateChange::Hue(Hue::new(0).unwrap()),
                StateChange::Saturation(Saturation::new(100).unwrap()),
                StateChange::FirmwareVersion("3.1".to_string()),
            ]
        );
    }

    #[test]
    fn partial_status_only_reports_present_fields() {
        let body = serde_json::json!({ "power": "off" });
        let status = PolledStatus::from_body(&body).unwrap();
        let changes = status
            .to_state_changes(&Capabilities::color_bulb())
            .unwrap();
        assert_eq!(changes, vec![StateChange::power_off()]);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let body = serde_json::json!({ "brightness": 140, "colorTemperature": 1500 });
        let status = PolledStatus::from_body(&body).unwrap();
        let changes = status
            .to_state_changes(&Capabilities::white_bulb())
            .unwrap();
        assert_eq!(
            changes,
            vec![
                StateChange::Brightness(Brightness::MAX),
                StateChange::ColorTemperature(Mired::WARMEST),
            ]
        );
    }

    #[test]
    fn unknown_power_word_rejects_payload() {
        let body = serde_json::json!({ "power": "dim", "brightness": 10 });
        let status = PolledStatus::from_body(&body).unwrap();
        assert!(matches!(
            status.to_state_changes(&Capabilities::dimmable_light()),
            Err(ParseError::InvalidValue { field, .. }) if field == "power"
        ));
    }

    #[test]
    fn wrong_json_type_is_an_error() {
        let body = serde_json::json!({ "brightness": "bright" });
        assert!(matches!(
            PolledStatus::from_body(&body),
            Err(ParseError::Json(_))
        ));
    }
}
