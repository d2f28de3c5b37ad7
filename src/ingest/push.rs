// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser for push notifications.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::Capabilities;
use crate::error::ParseError;
use crate::state::StateChange;

use super::ChangeCollector;

/// Status carried by a push notification.
///
/// Push notifications wrap the device status in an envelope:
///
/// ```json
/// {
///   "eventType": "changeReport",
///   "eventVersion": "1",
///   "context": {
///     "deviceType": "WoBulb",
///     "deviceMac": "C0:FF:EE:00:00:01",
///     "powerState": "ON",
///     "brightness": 10,
///     "color": "255:245:235",
///     "colorTemperature": 3500,
///     "timeOfSample": 1698720698088
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushStatus {
    /// Event type from the envelope.
    #[serde(skip)]
    pub event_type: Option<String>,

    /// Device MAC address as reported.
    pub device_mac: String,

    /// Device model name.
    #[serde(default)]
    pub device_type: Option<String>,

    /// Power word, `"ON"` or `"OFF"`.
    #[serde(default)]
    pub power_state: Option<String>,

    /// Brightness (1-100).
    #[serde(default)]
    pub brightness: Option<i64>,

    /// Color as `r:g:b`.
    #[serde(default)]
    pub color: Option<String>,

    /// Color temperature in Kelvin.
    #[serde(default)]
    pub color_temperature: Option<i64>,

    /// Time the device sampled this status.
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub time_of_sample: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PushEnvelope {
    #[serde(default)]
    event_type: Option<String>,
    context: PushStatus,
}

impl PushStatus {
    /// Parses a push notification envelope.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` if the envelope or its context is malformed.
    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        let envelope: PushEnvelope = serde_json::from_str(json)?;
        Ok(Self {
            event_type: envelope.event_type,
            ..envelope.context
        })
    }

    /// Returns the device identifier the notification belongs to.
    #[must_use]
    pub fn device_id(&self) -> String {
        normalize_device_id(&self.device_mac)
    }

    /// Maps the reported fields into state changes.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidValue` for an unknown power word or an
    /// unparseable color.
    pub fn to_state_changes(&self, caps: &Capabilities) -> Result<Vec<StateChange>, ParseError> {
        let mut collector = ChangeCollector::new(caps);
        collector.power_word(self.power_state.as_deref())?;
        collector.brightness(self.brightness);
        collector.kelvin(self.color_temperature);
        collector.color(self.color.as_deref())?;
        Ok(collector.finish())
    }
}

/// Normalizes a device identifier or MAC address for lookups.
///
/// Separators are removed and letters upper-cased, so
/// `"c0:ff:ee:00:00:01"` and `"C0FFEE000001"` compare equal.
///
/// # Examples
///
/// ```
/// use hearth_sync::ingest::normalize_device_id;
///
/// assert_eq!(normalize_device_id("c0:ff:ee:00:00:01"), "C0FFEE000001");
/// assert_eq!(normalize_device_id("C0-FF-EE-00-00-01"), "C0FFEE000001");
/// ```
#[must_use]
pub fn normalize_device_id(id: &str) -> String {
    id.trim()
        .chars()
        .filter(|c| !matches!(c, ':' | '-'))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
