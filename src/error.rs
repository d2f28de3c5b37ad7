// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `hearth_sync` library.
//!
//! The engine never lets these errors escape its reconciliation and dispatch
//! entry points: they are logged and turned into an error indicator at the
//! host-publish boundary. They are returned as values from the boundary calls
//! (transport selection, ingestion, transport invocations) so callers can
//! match on the taxonomy.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Neither the local nor the remote transport can be reached.
    #[error("no usable transport")]
    TransportUnavailable,

    /// The device is configured for the cloud API but the cloud service is disabled.
    #[error("cloud service is disabled")]
    CloudDisabled,

    /// Remote access requested without cloud credentials.
    #[error("no cloud credentials configured")]
    NoCredentials,

    /// The remote endpoint answered with a status code outside the success set.
    #[error("remote returned status code {status_code}: {message}")]
    BadStatusCode {
        /// Status code reported in the response envelope.
        status_code: u16,
        /// Message reported alongside the status code.
        message: String,
    },

    /// An ingestion adapter received fields outside the expected shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] ParseError),

    /// Error occurred during protocol communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Accessory was not found in the manager.
    #[error("accessory not found")]
    AccessoryNotFound,
}

impl Error {
    /// Returns `true` if the accessory should be reported as not responding.
    ///
    /// `CloudDisabled` is a configuration state rather than a device fault and
    /// is only logged.
    #[must_use]
    pub fn marks_not_responding(&self) -> bool {
        !matches!(self, Self::CloudDisabled)
    }
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u32,
        /// Maximum allowed value.
        max: u32,
        /// The actual value that was provided.
        actual: u32,
    },

    /// An invalid power state string was provided.
    #[error("invalid power state: {0}")]
    InvalidPowerState(String),

    /// An invalid color string was provided.
    #[error("invalid color: {0}")]
    InvalidColor(String),
}

/// Errors raised by the wrapped transports.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// MQTT connection or communication failed.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Connection to the device failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The local device did not answer in time.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The expected device was not seen during a broadcast scan.
    #[error("device {0} not found during scan")]
    NotFound(String),

    /// The transport does not implement the requested operation.
    #[error("operation not supported: {0}")]
    Unsupported(String),
}

/// Errors related to parsing channel payloads.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the payload.
    #[error("missing field in payload: {0}")]
    MissingField(String),

    /// Failed to parse a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },

    /// Broadcast payload belongs to another device model.
    #[error("unexpected model {actual}, expected {expected}")]
    UnexpectedModel {
        /// Model identifier configured for the accessory.
        expected: String,
        /// Model identifier carried by the payload.
        actual: String,
    },
}

/// Errors related to loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// JSON parsing failed.
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value is invalid.
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// The offending field.
        field: String,
        /// Description of the problem.
        message: String,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
