// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP client for the cloud device API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};

use crate::config::CloudConfig;
use crate::error::{Error, ProtocolError};

use super::{DeviceCommand, RemoteResponse, RemoteTransport};

/// Client for the cloud device API.
///
/// Each call is an independent request; there is no persistent connection.
/// Requests carry the token in the `Authorization` header together with a
/// millisecond timestamp `t` and a random `nonce`.
///
/// # Examples
///
/// ```
/// use hearth_sync::config::CloudConfig;
/// use hearth_sync::transport::CloudClient;
///
/// let client = CloudClient::new(&CloudConfig::new("t0k3n")).unwrap();
/// assert_eq!(client.base_url(), "https://api.switch-bot.com");
///
/// assert!(CloudClient::new(&CloudConfig::new("  ")).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct CloudClient {
    base_url: String,
    token: String,
    client: Client,
}

impl CloudClient {
    /// Creates a client from cloud settings.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoCredentials` if the token is blank, or
    /// `Error::Protocol` if the HTTP client cannot be created.
    pub fn new(config: &CloudConfig) -> Result<Self, Error> {
        if !config.has_token() {
            return Err(Error::NoCredentials);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.trim().to_string(),
            client,
        })
    }

    /// Returns the API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the URL of a device endpoint.
    fn device_url(&self, device_id: &str, endpoint: &str) -> String {
        format!(
            "{}/v1.1/devices/{}/{endpoint}",
            self.base_url,
            urlencoding::encode(device_id)
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let t = chrono::Utc::now().timestamp_millis();
        let nonce = uuid::Uuid::new_v4();
        request
            .header("Authorization", &self.token)
            .header("t", t.to_string())
            .header("nonce", nonce.to_string())
    }

    async fn send(&self, request: RequestBuilder) -> Result<RemoteResponse, ProtocolError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(ProtocolError::Http)?;

        if !response.status().is_success() {
            return Err(ProtocolError::ConnectionFailed(format!(
                "HTTP {} - {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body: RemoteResponse = response.json().await.map_err(ProtocolError::Http)?;

        tracing::debug!(
            status_code = body.status_code,
            message = %body.message,
            "Received cloud response"
        );

        Ok(body)
    }
}

#[async_trait]
impl RemoteTransport for CloudClient {
    async fn status(&self, device_id: &str) -> Result<RemoteResponse, ProtocolError> {
        let url = self.device_url(device_id, "status");

        tracing::debug!(url = %url, "Querying cloud status");

        self.send(self.client.get(&url)).await
    }

    async fn command(
        &self,
        device_id: &str,
        command: &DeviceCommand,
    ) -> Result<RemoteResponse, ProtocolError> {
        let url = self.device_url(device_id, "commands");

        tracing::debug!(url = %url, %command, "Sending cloud command");

        self.send(self.client.post(&url).json(&command.to_request()))
            .await
    }
}
