// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Status ingestion adapters.
//!
//! Device status reaches the engine over three channels, each with its own
//! payload shape:
//!
//! - [`PolledStatus`] - body of a cloud status query
//! - [`PushStatus`] - webhook notification relayed to the accessory
//! - [`BroadcastPayload`] - decoded short-range advertisement
//!
//! [`StatusPayload`] tags a payload with its channel, and
//! [`StatusPayload::to_state_changes`] maps it into a partial list of
//! [`StateChange`]s. Fields absent from the payload, or not supported by the
//! device, produce no change.
//!
//! Shared rules:
//!
//! - Color temperature arrives in Kelvin and is converted to mireds, then
//!   clamped to the device range.
//! - Numbers outside their range are clamped.
//! - An unknown power word or an unparseable color rejects the whole payload.
//! - Firmware strings are normalized with [`normalize_firmware`].
//!
//! # Examples
//!
//! ```
//! use hearth_sync::Capabilities;
//! use hearth_sync::config::DeviceConfig;
//! use hearth_sync::ingest::{PushStatus, StatusPayload};
//! use hearth_sync::state::StateChange;
//!
//! let config = DeviceConfig::remote("C0FFEE000001")
//!     .with_capabilities(Capabilities::color_bulb());
//! let push = PushStatus::from_json(r#"{
//!     "eventType": "changeReport",
//!     "context": { "deviceMac": "C0:FF:EE:00:00:01", "powerState": "ON" }
//! }"#).unwrap();
//!
//! let changes = StatusPayload::Push(push).to_state_changes(&config).unwrap();
//! assert_eq!(changes, vec![StateChange::power_on()]);
//! ```

mod broadcast;
mod polled;
mod push;

pub use broadcast::BroadcastPayload;
pub use polled::PolledStatus;
pub use push::{PushStatus, normalize_device_id};

use crate::Capabilities;
use crate::config::DeviceConfig;
use crate::error::ParseError;
use crate::state::StateChange;
use crate::types::{Brightness, Mired, PowerState, RgbColor};

/// A status payload tagged with the channel it arrived on.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusPayload {
    /// Response body of a polled status query.
    Polled(PolledStatus),
    /// Asynchronous push notification.
    Push(PushStatus),
    /// Short-range broadcast advertisement.
    Broadcast(BroadcastPayload),
}

impl StatusPayload {
    /// Returns the channel name used in logs.
    #[must_use]
    pub const fn channel(&self) -> &'static str {
        match self {
            Self::Polled(_) => "polled",
            Self::Push(_) => "push",
            Self::Broadcast(_) => "broadcast",
        }
    }

    /// Maps the payload into state changes for the configured device.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if any field is malformed, or if a broadcast
    /// belongs to another model or address. No partial result is returned
    /// on error.
    pub fn to_state_changes(&self, config: &DeviceConfig) -> Result<Vec<StateChange>, ParseError> {
        match self {
            Self::Polled(status) => status.to_state_changes(&config.capabilities),
            Self::Push(status) => status.to_state_changes(&config.capabilities),
            Self::Broadcast(payload) => payload.to_state_changes(config),
        }
    }
}

/// Normalizes a firmware version string.
///
/// Strips a leading `V`/`v` marker and anything from the first build suffix
/// separator (`-`, `+`, `_` or whitespace) on. Returns `None` when nothing
/// is left.
///
/// # Examples
///
/// ```
/// use hearth_sync::ingest::normalize_firmware;
///
/// assert_eq!(normalize_firmware("V3.1").as_deref(), Some("3.1"));
/// assert_eq!(normalize_firmware("v1.2.3-beta4").as_deref(), Some("1.2.3"));
/// assert_eq!(normalize_firmware("6.3+build17").as_deref(), Some("6.3"));
/// assert_eq!(normalize_firmware("V"), None);
/// ```
#[must_use]
pub fn normalize_firmware(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let unmarked = trimmed.strip_prefix(['V', 'v']).unwrap_or(trimmed);
    let end = unmarked
        .find(|c: char| matches!(c, '-' | '+' | '_') || c.is_whitespace())
        .unwrap_or(unmarked.len());
    let version = &unmarked[..end];
    (!version.is_empty()).then(|| version.to_string())
}

/// Collects the changes of one payload, filtered by device capabilities.
struct ChangeCollector<'a> {
    caps: &'a Capabilities,
    changes: Vec<StateChange>,
}

impl<'a> ChangeCollector<'a> {
    fn new(caps: &'a Capabilities) -> Self {
        Self {
            caps,
            changes: Vec::new(),
        }
    }

    fn power(&mut self, power: Option<bool>) {
        if let Some(on) = power {
            self.changes.push(StateChange::Power(PowerState::from(on)));
        }
    }

    fn power_word(&mut self, word: Option<&str>) -> Result<(), ParseError> {
        if let Some(word) = word {
            let power = word.parse::<PowerState>().map_err(|e| ParseError::InvalidValue {
                field: "power".to_string(),
                message: e.to_string(),
            })?;
            self.changes.push(StateChange::Power(power));
        }
        Ok(())
    }

    fn brightness(&mut self, value: Option<i64>) {
        if let Some(value) = value
            && self.caps.brightness
        {
            self.changes
                .push(StateChange::Brightness(Brightness::clamped(value)));
        }
    }

    fn color(&mut self, color: Option<&str>) -> Result<(), ParseError> {
        if let Some(color) = color {
            let rgb = color.parse::<RgbColor>().map_err(|e| ParseError::InvalidValue {
                field: "color".to_string(),
                message: e.to_string(),
            })?;
            if self.caps.color {
                let (hue, saturation) = rgb.to_hue_sat();
                self.changes.push(StateChange::Hue(hue));
                self.changes.push(StateChange::Saturation(saturation));
            }
        }
        Ok(())
    }

    fn kelvin(&mut self, kelvin: Option<i64>) {
        if let Some(kelvin) = kelvin
            && self.caps.color_temperature
        {
            let kelvin = u32::try_from(kelvin.max(0)).unwrap_or(u32::MAX);
            let mired = Mired::from_kelvin(kelvin, self.caps.mired_range);
            self.changes.push(StateChange::ColorTemperature(mired));
        }
    }

    fn firmware(&mut self, version: Option<&serde_json::Value>) -> Result<(), ParseError> {
        let raw = match version {
            None | Some(serde_json::Value::Null) => return Ok(()),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            Some(other) => {
                return Err(ParseError::InvalidValue {
                    field: "version".to_string(),
                    message: format!("unexpected value {other}"),
                });
            }
        };
        if let Some(version) = normalize_firmware(&raw) {
            self.changes.push(StateChange::FirmwareVersion(version));
        }
        Ok(())
    }

    fn finish(self) -> Vec<StateChange> {
        self.changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn firmware_normalization() {
        assert_eq!(normalize_firmware("1.0").as_deref(), Some("1.0"));
        assert_eq!(normalize_firmware(" V2.4_rc1 ").as_deref(), Some("2.4"));
        assert_eq!(normalize_firmware("v5.0 build 12").as_deref(), Some("5.0"));
        assert_eq!(normalize_firmware("").as_deref(), None);
        assert_eq!(normalize_firmware("-dirty").as_deref(), None);
    }

    #[test]
    fn collector_skips_unsupported_characteristics() {
        let caps = Capabilities::switch();
        let mut collector = ChangeCollector::new(&caps);
        collector.brightness(Some(40));
        collector.kelvin(Some(3000));
        collector.color(Some("255:0:0")).unwrap();
        assert!(collector.finish().is_empty());
    }

    #[test]
    fn collector_rejects_bad_color_even_when_unsupported() {
        let caps = Capabilities::switch();
        let mut collector = ChangeCollector::new(&caps);
        assert!(matches!(
            collector.color(Some("red")),
            Err(ParseError::InvalidValue { field, .. }) if field == "color"
        ));
    }

    #[test]
    fn collector_clamps_kelvin() {
        let caps = Capabilities::white_bulb();
        let mut collector = ChangeCollector::new(&caps);
        collector.kelvin(Some(-5));
        collector.kelvin(Some(20_000));
        let changes = collector.finish();
        assert_eq!(
            changes,
            vec![
                StateChange::ColorTemperature(Mired::WARMEST),
                StateChange::ColorTemperature(Mired::COOLEST),
            ]
        );
    }

    #[test]
    fn collector_firmware_accepts_numbers() {
        let caps = Capabilities::switch();
        let mut collector = ChangeCollector::new(&caps);
        collector.firmware(Some(&serde_json::json!(3.1))).unwrap();
        assert!(collector.firmware(Some(&serde_json::json!([1]))).is_err());
        assert_eq!(
            collector.finish(),
            vec![StateChange::FirmwareVersion("3.1".to_string())]
        );
    }
}
