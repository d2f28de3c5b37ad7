// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transports reaching the physical device.
//!
//! The engine talks to devices through two object-safe traits:
//!
//! - [`LocalTransport`]: the short-range link, offering a broadcast scan
//!   and a direct-connect handle executing [`DeviceCommand`]s
//! - [`RemoteTransport`]: the cloud API, answering with a
//!   [`RemoteResponse`] envelope
//!
//! The wire protocols behind these traits belong to the wrapped libraries.
//! With the `http` feature, [`CloudClient`] implements [`RemoteTransport`]
//! on top of `reqwest`.
//!
//! [`select_transport`] decides which of the two handles an operation.

#[cfg(feature = "http")]
mod cloud;
mod selector;

#[cfg(feature = "http")]
pub use cloud::CloudClient;
pub use selector::{Route, select_transport};

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, ProtocolError};
use crate::ingest::BroadcastPayload;
use crate::types::{Brightness, RgbColor};

/// Status codes the cloud API reports on success.
pub const SUCCESS_STATUS_CODES: [u16; 2] = [100, 200];

/// A single instruction sent to a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceCommand {
    /// Switch the device on.
    TurnOn,
    /// Switch the device off.
    TurnOff,
    /// Set brightness.
    SetBrightness(Brightness),
    /// Set an RGB color.
    SetColor(RgbColor),
    /// Set the color temperature in Kelvin.
    SetColorTemperature(u32),
}

impl DeviceCommand {
    /// Returns the cloud API command name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TurnOn => "turnOn",
            Self::TurnOff => "turnOff",
            Self::SetBrightness(_) => "setBrightness",
            Self::SetColor(_) => "setColor",
            Self::SetColorTemperature(_) => "setColorTemperature",
        }
    }

    /// Returns the cloud API parameter.
    ///
    /// Brightness is sent as 1-100; a 0% write is sent as 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use hearth_sync::transport::DeviceCommand;
    /// use hearth_sync::types::{Brightness, RgbColor};
    ///
    /// assert_eq!(DeviceCommand::TurnOn.parameter(), "default");
    /// assert_eq!(DeviceCommand::SetBrightness(Brightness::MIN).parameter(), "1");
    /// assert_eq!(DeviceCommand::SetColor(RgbColor::new(255, 0, 0)).parameter(), "255:0:0");
    /// assert_eq!(DeviceCommand::SetColorTemperature(3333).parameter(), "3333");
    /// ```
    #[must_use]
    pub fn parameter(&self) -> String {
        match self {
            Self::TurnOn | Self::TurnOff => "default".to_string(),
            Self::SetBrightness(b) => b.value().max(1).to_string(),
            Self::SetColor(rgb) => rgb.to_string(),
            Self::SetColorTemperature(kelvin) => kelvin.to_string(),
        }
    }

    /// Returns the request body for the cloud command endpoint.
    #[must_use]
    pub fn to_request(&self) -> CommandRequest {
        CommandRequest {
            command: self.name().to_string(),
            parameter: self.parameter(),
            command_type: "command".to_string(),
        }
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.parameter())
    }
}

/// Request body of the cloud command endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
    /// Command name.
    pub command: String,
    /// Command parameter.
    pub parameter: String,
    /// Always `"command"` for standard commands.
    pub command_type: String,
}

/// Response envelope of the cloud API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteResponse {
    /// API status code; see [`SUCCESS_STATUS_CODES`].
    pub status_code: u16,
    /// Human-readable status message.
    #[serde(default)]
    pub message: String,
    /// Response body.
    #[serde(default)]
    pub body: serde_json::Value,
}

impl RemoteResponse {
    /// Creates a successful response with the given body.
    #[must_use]
    pub fn success(body: serde_json::Value) -> Self {
        Self {
            status_code: 100,
            message: "success".to_string(),
            body,
        }
    }

    /// Returns `true` if the status code signals success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        SUCCESS_STATUS_CODES.contains(&self.status_code)
    }

    /// Converts a failure status code into an error.
    ///
    /// # Errors
    ///
    /// Returns `Error::BadStatusCode` if the status code is not a success code.
    pub fn into_result(self) -> Result<Self, Error> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::BadStatusCode {
                status_code: self.status_code,
                message: self.message,
            })
        }
    }
}

/// Short-range link to devices.
#[async_trait]
pub trait LocalTransport: Send + Sync {
    /// Scans for broadcast advertisements currently in range.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the scan cannot be performed. Handles
    /// without a scanner keep the default, which returns
    /// `ProtocolError::Unsupported`.
    async fn scan(&self) -> Result<Vec<BroadcastPayload>, ProtocolError> {
        Err(ProtocolError::Unsupported("scan".to_string()))
    }

    /// Connects to the device and executes a command.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the device cannot be reached or rejects
    /// the command.
    async fn execute(&self, command: &DeviceCommand) -> Result<(), ProtocolError>;
}

/// Cloud API for devices.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// Queries the status of a device.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails before a response
    /// envelope is received.
    async fn status(&self, device_id: &str) -> Result<RemoteResponse, ProtocolError>;

    /// Sends a command to a device.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the request fails before a response
    /// envelope is received.
    async fn command(
        &self,
        device_id: &str,
        command: &DeviceCommand,
    ) -> Result<RemoteResponse, ProtocolError>;
}

/// Transport handles supplied for one accessory.
///
/// A missing local handle means the device cannot be reached over the
/// short-range link; a missing remote handle means no cloud credentials.
#[derive(Clone, Default)]
pub struct Transports {
    /// Short-range link.
    pub local: Option<Arc<dyn LocalTransport>>,
    /// Cloud API.
    pub remote: Option<Arc<dyn RemoteTransport>>,
}

impl Transports {
    /// Creates an empty set of transports.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the local transport.
    #[must_use]
    pub fn with_local(mut self, local: Arc<dyn LocalTransport>) -> Self {
        self.local = Some(local);
        self
    }

    /// Sets the remote transport.
    #[must_use]
    pub fn with_remote(mut self, remote: Arc<dyn RemoteTransport>) -> Self {
        self.remote = Some(remote);
        self
    }
}

impl fmt::Debug for Transports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transports")
            .field("local", &self.local.is_some())
            .field("remote", &self.remote.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_names() {
        assert_eq!(DeviceCommand::TurnOn.name(), "turnOn");
        assert_eq!(DeviceCommand::TurnOff.name(), "turnOff");
        assert_eq!(
            DeviceCommand::SetColorTemperature(2700).to_string(),
            "setColorTemperature(2700)"
        );
    }

    #[test]
    fn command_request_serialization() {
        let request = DeviceCommand::SetBrightness(Brightness::new(30).unwrap()).to_request();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "command": "setBrightness",
                "parameter": "30",
                "commandType": "command"
            })
        );
    }

    #[test]
    fn response_success_codes() {
        assert!(RemoteResponse::success(serde_json::Value::Null).is_success());

        let ok: RemoteResponse =
            serde_json::from_str(r#"{"statusCode":200,"body":{}}"#).unwrap();
        assert!(ok.is_success());

        let offline: RemoteResponse =
            serde_json::from_str(r#"{"statusCode":161,"message":"device offline"}"#).unwrap();
        assert!(!offline.is_success());
        assert!(matches!(
            offline.into_result(),
            Err(Error::BadStatusCode { status_code: 161, message }) if message == "device offline"
        ));
    }

    struct ConnectOnly;

    #[async_trait]
    impl LocalTransport for ConnectOnly {
        async fn execute(&self, _command: &DeviceCommand) -> Result<(), ProtocolError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn scan_defaults_to_unsupported() {
        assert!(matches!(
            ConnectOnly.scan().await,
            Err(ProtocolError::Unsupported(op)) if op == "scan"
        ));
        assert!(ConnectOnly.execute(&DeviceCommand::TurnOn).await.is_ok());
    }
}
