// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Capabilities;
use crate::error::ConfigError;
use crate::state::AccessoryState;
use crate::types::{Brightness, Hue, PowerState, Saturation};

use super::{RetryPolicy, duration_secs};

/// Default period between polled refreshes.
const DEFAULT_REFRESH_RATE: Duration = Duration::from_secs(120);

/// Default debounce window for user writes.
const DEFAULT_PUSH_RATE: Duration = Duration::from_millis(100);

/// Preferred transport for a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    /// Local short-range link only.
    Local,
    /// Remote cloud API only.
    Remote,
    /// Local link preferred, cloud API as fallback.
    #[default]
    Dual,
}

/// Configuration for one accessory.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use hearth_sync::Capabilities;
/// use hearth_sync::config::{ConnectionMode, DeviceConfig};
///
/// let config = DeviceConfig::dual("C0FFEE000001")
///     .with_name("Desk Lamp")
///     .with_model("WoBulb")
///     .with_capabilities(Capabilities::color_bulb())
///     .with_push_rate(Duration::from_millis(50));
///
/// assert_eq!(config.connection, ConnectionMode::Dual);
/// assert_eq!(config.display_name(), "Desk Lamp");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    /// Device identifier used by the cloud API and push routing.
    pub id: String,
    /// Optional display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Model identifier expected in broadcast advertisements.
    #[serde(default)]
    pub model: Option<String>,
    /// Short-range address expected in broadcast advertisements.
    #[serde(default)]
    pub address: Option<String>,
    /// Preferred transport.
    #[serde(default)]
    pub connection: ConnectionMode,
    /// Whether the cloud service may be used for this device.
    #[serde(default = "default_true")]
    pub cloud_enabled: bool,
    /// Device is configured as offline.
    #[serde(default)]
    pub offline: bool,
    /// Period between polled refreshes.
    #[serde(default = "default_refresh_rate", with = "duration_secs")]
    pub refresh_rate: Duration,
    /// Debounce window for user writes.
    #[serde(default = "default_push_rate", with = "duration_secs")]
    pub push_rate: Duration,
    /// Retry policy for local transport calls.
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Device capabilities.
    #[serde(default)]
    pub capabilities: Capabilities,
    /// Values the accessory starts with before the first refresh.
    #[serde(default)]
    pub defaults: InitialState,
}

fn default_true() -> bool {
    true
}

fn default_refresh_rate() -> Duration {
    DEFAULT_REFRESH_RATE
}

fn default_push_rate() -> Duration {
    DEFAULT_PUSH_RATE
}

impl DeviceConfig {
    fn with_mode(id: impl Into<String>, connection: ConnectionMode) -> Self {
        Self {
            id: id.into(),
            name: None,
            model: None,
            address: None,
            connection,
            cloud_enabled: true,
            offline: false,
            refresh_rate: DEFAULT_REFRESH_RATE,
            push_rate: DEFAULT_PUSH_RATE,
            retry: RetryPolicy::default(),
            capabilities: Capabilities::default(),
            defaults: InitialState::default(),
        }
    }

    /// Creates a configuration for a device reached over the local link only.
    #[must_use]
    pub fn local(id: impl Into<String>) -> Self {
        Self::with_mode(id, ConnectionMode::Local)
    }

    /// Creates a configuration for a device reached over the cloud API only.
    #[must_use]
    pub fn remote(id: impl Into<String>) -> Self {
        Self::with_mode(id, ConnectionMode::Remote)
    }

    /// Creates a configuration preferring the local link with cloud fallback.
    #[must_use]
    pub fn dual(id: impl Into<String>) -> Self {
        Self::with_mode(id, ConnectionMode::Dual)
    }

    /// Sets a display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the expected broadcast model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the expected broadcast address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Enables or disables the cloud service for this device.
    #[must_use]
    pub fn with_cloud_enabled(mut self, enabled: bool) -> Self {
        self.cloud_enabled = enabled;
        self
    }

    /// Marks the device as offline.
    #[must_use]
    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Sets the refresh period.
    #[must_use]
    pub fn with_refresh_rate(mut self, rate: Duration) -> Self {
        self.refresh_rate = rate;
        self
    }

    /// Sets the debounce window.
    #[must_use]
    pub fn with_push_rate(mut self, rate: Duration) -> Self {
        self.push_rate = rate;
        self
    }

    /// Sets the local retry policy.
    #[must_use]
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Sets the device capabilities.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Sets the starting values.
    #[must_use]
    pub fn with_defaults(mut self, defaults: InitialState) -> Self {
        self.defaults = defaults;
        self
    }

    /// Returns the display name, falling back to the device id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Builds the transport descriptor consulted on every operation.
    #[must_use]
    pub fn descriptor(&self, has_credentials: bool, has_local_handle: bool) -> TransportDescriptor {
        TransportDescriptor {
            mode: self.connection,
            has_credentials,
            cloud_enabled: self.cloud_enabled,
            offline: self.offline,
            has_local_handle,
        }
    }

    /// Builds the starting canonical state, clamped to the capabilities.
    ///
    /// Characteristics the device does not support stay unknown.
    #[must_use]
    pub fn initial_state(&self) -> AccessoryState {
        let caps = &self.capabilities;
        let mut state = AccessoryState::new();
        state.set_power(PowerState::from(self.defaults.power));

        if caps.brightness {
            state.set_brightness(Brightness::clamped(i64::from(
                self.defaults.brightness.unwrap_or(100),
            )));
        }
        if caps.color {
            state.set_hue(Hue::normalized(i64::from(
                self.defaults.hue.unwrap_or_default(),
            )));
            state.set_saturation(Saturation::clamped(i64::from(
                self.defaults.saturation.unwrap_or_default(),
            )));
        }
        if caps.color_temperature {
            let ct = self
                .defaults
                .color_temperature
                .unwrap_or(caps.mired_range.min());
            state.set_color_temperature(caps.clamp_mired(i64::from(ct)));
        }
        state
    }

    /// Checks the configuration for values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an empty id or a zero refresh rate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "id".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.refresh_rate.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "refreshRate".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Starting values for an accessory, in host units.
///
/// Missing values fall back to power off, full brightness, hue/saturation 0
/// and the coolest supported color temperature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InitialState {
    /// Starting power state.
    pub power: bool,
    /// Starting brightness (0-100).
    pub brightness: Option<u8>,
    /// Starting hue (degrees).
    pub hue: Option<u16>,
    /// Starting saturation (0-100).
    pub saturation: Option<u8>,
    /// Starting color temperature (mireds).
    pub color_temperature: Option<u16>,
}

/// Connection facts the transport selector decides on.
///
/// Built once per accessory from its [`DeviceConfig`] and the transports
/// that were supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct TransportDescriptor {
    /// Preferred transport.
    pub mode: ConnectionMode,
    /// Cloud credentials are configured.
    pub has_credentials: bool,
    /// Cloud service is enabled for the device.
    pub cloud_enabled: bool,
    /// Device is configured as offline.
    pub offline: bool,
    /// A local transport handle was supplied.
    pub has_local_handle: bool,
}

impl TransportDescriptor {
    /// Returns `true` if the cloud API may be called for this device.
    #[must_use]
    pub const fn remote_usable(&self) -> bool {
        self.has_credentials && self.cloud_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mired;

    #[test]
    fn config_constructors() {
        assert_eq!(DeviceConfig::local("a").connection, ConnectionMode::Local);
        assert_eq!(DeviceConfig::remote("a").connection, ConnectionMode::Remote);
        assert_eq!(DeviceConfig::dual("a").connection, ConnectionMode::Dual);

        let config = DeviceConfig::local("a");
        assert!(config.cloud_enabled);
        assert!(!config.offline);
        assert_eq!(config.refresh_rate, Duration::from_secs(120));
        assert_eq!(config.push_rate, Duration::from_millis(100));
    }

    #[test]
    fn display_name_falls_back_to_id() {
        assert_eq!(DeviceConfig::local("ABC").display_name(), "ABC");
        assert_eq!(
            DeviceConfig::local("ABC").with_name("Lamp").display_name(),
            "Lamp"
        );
    }

    #[test]
    fn descriptor_reflects_config() {
        let config = DeviceConfig::remote("a")
            .with_cloud_enabled(false)
            .with_offline(true);
        let descriptor = config.descriptor(true, false);
        assert_eq!(descriptor.mode, ConnectionMode::Remote);
        assert!(descriptor.offline);
        assert!(!descriptor.remote_usable());
        assert!(!descriptor.has_local_handle);
    }

    #[test]
    fn initial_state_respects_capabilities() {
        let config = DeviceConfig::local("a").with_defaults(InitialState {
            power: true,
            brightness: Some(150),
            ..InitialState::default()
        });
        let state = config.initial_state();
        assert!(state.power().is_on());
        // Switch capabilities: no brightness
        assert!(state.brightness().is_none());

        let bulb = config.with_capabilities(Capabilities::color_bulb());
        let state = bulb.initial_state();
        assert_eq!(state.brightness().map(|b| b.value()), Some(100));
        assert_eq!(state.hue().map(|h| h.value()), Some(0));
        assert_eq!(state.color_temperature(), Some(Mired::COOLEST));
    }

    #[test]
    fn validate_rejects_zero_refresh_rate() {
        let config = DeviceConfig::local("a").with_refresh_rate(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "refreshRate"
        ));
        assert!(DeviceConfig::local(" ").validate().is_err());
        assert!(DeviceConfig::local("a").validate().is_ok());
    }

    #[test]
    fn deserialize_with_defaults() {
        let json = r#"{
            "id": "C0FFEE000001",
            "connection": "remote",
            "cloudEnabled": false,
            "refreshRate": 30,
            "capabilities": { "brightness": true },
            "defaults": { "power": true, "brightness": 40 }
        }"#;
        let config: DeviceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.connection, ConnectionMode::Remote);
        assert!(!config.cloud_enabled);
        assert_eq!(config.refresh_rate, Duration::from_secs(30));
        assert_eq!(config.push_rate, Duration::from_millis(100));
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.initial_state().brightness().map(|b| b.value()), Some(40));
    }

    #[test]
    fn deserialize_rejects_negative_duration() {
        let json = r#"{ "id": "a", "pushRate": -1 }"#;
        assert!(serde_json::from_str::<DeviceConfig>(json).is_err());
    }
}
