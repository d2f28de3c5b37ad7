// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Platform-wide configuration: cloud credentials, push relay and devices.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

use super::{DeviceConfig, duration_secs};

/// Default cloud API base URL.
pub(crate) const DEFAULT_CLOUD_BASE_URL: &str = "https://api.switch-bot.com";

/// Default timeout for a single cloud request.
pub(crate) const DEFAULT_CLOUD_TIMEOUT: Duration = Duration::from_secs(10);

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlatformConfig {
    /// Cloud API access; absent means no credentials.
    pub cloud: Option<CloudConfig>,
    /// MQTT relay delivering push notifications.
    pub push: Option<PushRelayConfig>,
    /// Configured accessories.
    pub devices: Vec<DeviceConfig>,
}

impl PlatformConfig {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` for malformed JSON and
    /// `ConfigError::InvalidValue` if a device fails validation or two
    /// devices share an id.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every device entry.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` on the first invalid device.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = std::collections::HashSet::new();
        for device in &self.devices {
            device.validate()?;
            if !seen.insert(device.id.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "devices".to_string(),
                    message: format!("duplicate device id {}", device.id),
                });
            }
        }
        Ok(())
    }

    /// Returns `true` if a non-empty cloud token is configured.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.cloud.as_ref().is_some_and(CloudConfig::has_token)
    }
}

/// Cloud API access settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudConfig {
    /// API token sent in the `Authorization` header.
    pub token: String,
    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout.
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub timeout: Duration,
}

fn default_base_url() -> String {
    DEFAULT_CLOUD_BASE_URL.to_string()
}

fn default_timeout() -> Duration {
    DEFAULT_CLOUD_TIMEOUT
}

impl CloudConfig {
    /// Creates cloud settings for a token with default URL and timeout.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: default_base_url(),
            timeout: DEFAULT_CLOUD_TIMEOUT,
        }
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns `true` if the token is not blank.
    #[must_use]
    pub fn has_token(&self) -> bool {
        !self.token.trim().is_empty()
    }
}

/// MQTT relay that forwards push notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRelayConfig {
    /// Broker URL, e.g. `mqtt://192.168.1.50:1883`.
    pub broker_url: String,
    /// Topic carrying the push payloads.
    pub topic: String,
    /// Optional broker username.
    #[serde(default)]
    pub username: Option<String>,
    /// Optional broker password.
    #[serde(default)]
    pub password: Option<String>,
}

impl PushRelayConfig {
    /// Creates a relay configuration.
    #[must_use]
    pub fn new(broker_url: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            broker_url: broker_url.into(),
            topic: topic.into(),
            username: None,
            password: None,
        }
    }

    /// Sets broker credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionMode;

    #[test]
    fn empty_config() {
        let config = PlatformConfig::from_json("{}").unwrap();
        assert!(config.devices.is_empty());
        assert!(!config.has_credentials());
    }

    #[test]
    fn full_config() {
        let json = r#"{
            "cloud": { "token": "t0k3n", "timeout": 5 },
            "push": { "brokerUrl": "mqtt://broker:1883", "topic": "hearth/push" },
            "devices": [
                { "id": "A1", "connection": "local", "model": "WoBulb" },
                { "id": "B2" }
            ]
        }"#;
        let config = PlatformConfig::from_json(json).unwrap();
        let cloud = config.cloud.as_ref().unwrap();
        assert_eq!(cloud.base_url, DEFAULT_CLOUD_BASE_URL);
        assert_eq!(cloud.timeout, Duration::from_secs(5));
        assert!(config.has_credentials());
        assert_eq!(config.push.unwrap().topic, "hearth/push");
        assert_eq!(config.devices[0].connection, ConnectionMode::Local);
        assert_eq!(config.devices[1].connection, ConnectionMode::Dual);
    }

    #[test]
    fn blank_token_is_not_a_credential() {
        let config = PlatformConfig {
            cloud: Some(CloudConfig::new("  ")),
            ..PlatformConfig::default()
        };
        assert!(!config.has_credentials());
    }

    #[test]
    fn duplicate_ids_rejected() {
        let json = r#"{ "devices": [ { "id": "A1" }, { "id": "A1" } ] }"#;
        assert!(matches!(
            PlatformConfig::from_json(json),
            Err(ConfigError::InvalidValue { field, .. }) if field == "devices"
        ));
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(matches!(
            PlatformConfig::from_json("{ devices: "),
            Err(ConfigError::Json(_))
        ));
    }
}
