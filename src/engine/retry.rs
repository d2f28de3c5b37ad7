// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Retry and fallback for transport operations.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::{DeviceConfig, RetryPolicy};
use crate::error::{Error, ProtocolError};
use crate::ingest::{PolledStatus, StatusPayload};
use crate::transport::{DeviceCommand, Route, Transports};

/// Runs transport operations for one device.
///
/// Local operations are retried with the device's [`RetryPolicy`]. Once
/// local retries are exhausted and the route allows fallback, the operation
/// is attempted exactly once over the cloud API. Remote operations are
/// never retried.
#[derive(Debug, Clone)]
pub struct RetryController {
    device_id: String,
    model: Option<String>,
    address: Option<String>,
    policy: RetryPolicy,
    transports: Transports,
}

impl RetryController {
    /// Creates a controller for the configured device.
    #[must_use]
    pub fn new(config: &DeviceConfig, transports: Transports) -> Self {
        Self {
            device_id: config.id.clone(),
            model: config.model.clone(),
            address: config.address.clone(),
            policy: config.retry.clone(),
            transports,
        }
    }

    /// Returns the transports this controller uses.
    #[must_use]
    pub fn transports(&self) -> &Transports {
        &self.transports
    }

    /// Fetches the device status over `route`.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt: the final local attempt, or
    /// the remote fallback if one was made.
    pub async fn fetch_status(&self, route: Route) -> Result<StatusPayload, Error> {
        match route {
            Route::Remote => self.remote_status().await,
            Route::Local { fallback } => {
                match self.retry_local("status", || self.local_status()).await {
                    Err(e) if fallback => {
                        tracing::warn!(
                            device = %self.device_id,
                            error = %e,
                            "Local status failed, falling back to cloud"
                        );
                        self.remote_status().await
                    }
                    result => result,
                }
            }
        }
    }

    /// Executes one command over `route`.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt: the final local attempt, or
    /// the remote fallback if one was made.
    pub async fn execute(&self, route: Route, command: &DeviceCommand) -> Result<(), Error> {
        self.execute_batch(route, std::slice::from_ref(command)).await
    }

    /// Executes a batch of commands over `route` as one operation.
    ///
    /// A local attempt resumes at the first command not yet acknowledged,
    /// and the retry budget covers the whole batch. Once it is exhausted,
    /// the remaining commands go to the cloud API in a single fallback.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt: the final local attempt, or
    /// the remote fallback if one was made.
    pub async fn execute_batch(
        &self,
        route: Route,
        commands: &[DeviceCommand],
    ) -> Result<(), Error> {
        match route {
            Route::Remote => self.remote_batch(commands).await,
            Route::Local { fallback } => {
                let sent = AtomicUsize::new(0);
                match self
                    .retry_local("batch", || self.local_batch(commands, &sent))
                    .await
                {
                    Err(e) if fallback => {
                        let remaining = &commands[sent.load(Ordering::SeqCst)..];
                        tracing::warn!(
                            device = %self.device_id,
                            remaining = remaining.len(),
                            error = %e,
                            "Local batch failed, falling back to cloud"
                        );
                        self.remote_batch(remaining).await
                    }
                    result => result,
                }
            }
        }
    }

    async fn retry_local<T, F, Fut>(&self, operation: &str, mut attempt: F) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let mut attempts_made = 0;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    attempts_made += 1;
                    if !self.policy.should_retry(attempts_made) {
                        tracing::warn!(
                            device = %self.device_id,
                            operation,
                            attempts = attempts_made,
                            error = %e,
                            "Local attempts exhausted"
                        );
                        return Err(e);
                    }

                    let delay = self.policy.delay_for_attempt(attempts_made - 1);
                    tracing::debug!(
                        device = %self.device_id,
                        operation,
                        attempt = attempts_made,
                        ?delay,
                        error = %e,
                        "Local attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn local_status(&self) -> Result<StatusPayload, Error> {
        let local = self
            .transports
            .local
            .as_deref()
            .ok_or(Error::TransportUnavailable)?;

        let advertisements = local.scan().await?;
        advertisements
            .into_iter()
            .find(|adv| adv.matches(self.model.as_deref(), self.address.as_deref()))
            .map(StatusPayload::Broadcast)
            .ok_or_else(|| ProtocolError::NotFound(self.device_id.clone()).into())
    }

    async fn local_execute(&self, command: &DeviceCommand) -> Result<(), Error> {
        let local = self
            .transports
            .local
            .as_deref()
            .ok_or(Error::TransportUnavailable)?;

        local.execute(command).await?;
        tracing::debug!(device = %self.device_id, %command, "Local command executed");
        Ok(())
    }

    async fn local_batch(
        &self,
        commands: &[DeviceCommand],
        sent: &AtomicUsize,
    ) -> Result<(), Error> {
        for command in &commands[sent.load(Ordering::SeqCst)..] {
            self.local_execute(command).await?;
            sent.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn remote_status(&self) -> Result<StatusPayload, Error> {
        let remote = self
            .transports
            .remote
            .as_deref()
            .ok_or(Error::NoCredentials)?;

        let response = remote.status(&self.device_id).await?.into_result()?;
        let status = PolledStatus::from_body(&response.body)?;
        Ok(StatusPayload::Polled(status))
    }

    async fn remote_batch(&self, commands: &[DeviceCommand]) -> Result<(), Error> {
        for command in commands {
            self.remote_execute(command).await?;
        }
        Ok(())
    }

    async fn remote_execute(&self, command: &DeviceCommand) -> Result<(), Error> {
        let remote = self
            .transports
            .remote
            .as_deref()
            .ok_or(Error::NoCredentials)?;

        remote.command(&self.device_id, command).await?.into_result()?;
        tracing::debug!(device = %self.device_id, %command, "Cloud command executed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::ingest::BroadcastPayload;
    use crate::transport::{LocalTransport, RemoteResponse, RemoteTransport};

    #[derive(Default)]
    struct FlakyLocal {
        failures_left: AtomicU32,
        calls: AtomicU32,
        advertisements: Vec<BroadcastPayload>,
    }

    #[async_trait]
    impl LocalTransport for FlakyLocal {
        async fn scan(&self) -> Result<Vec<BroadcastPayload>, ProtocolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.advertisements.clone())
        }

        async fn execute(&self, _command: &DeviceCommand) -> Result<(), ProtocolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(ProtocolError::Timeout(5000));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingRemote {
        calls: AtomicU32,
        status_code: u16,
    }

    #[async_trait]
    impl RemoteTransport for CountingRemote {
        async fn status(&self, _device_id: &str) -> Result<RemoteResponse, ProtocolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RemoteResponse {
                status_code: self.status_code,
                message: String::new(),
                body: serde_json::json!({ "power": "on" }),
            })
        }

        async fn command(
            &self,
            _device_id: &str,
            _command: &DeviceCommand,
        ) -> Result<RemoteResponse, ProtocolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RemoteResponse {
                status_code: self.status_code,
                message: "boom".to_string(),
                body: serde_json::Value::Null,
            })
        }
    }

    fn config() -> DeviceConfig {
        DeviceConfig::dual("C0FFEE000001")
            .with_model("WoBulb")
            .with_retry(RetryPolicy::new().with_initial_delay(Duration::from_millis(100)))
    }

    fn controller(local: &Arc<FlakyLocal>, remote: &Arc<CountingRemote>) -> RetryController {
        let transports = Transports::new()
            .with_local(local.clone())
            .with_remote(remote.clone());
        RetryController::new(&config(), transports)
    }

    #[tokio::test(start_paused = true)]
    async fn local_retry_succeeds_before_exhaustion() {
        let local = Arc::new(FlakyLocal {
            failures_left: AtomicU32::new(2),
            ..FlakyLocal::default()
        });
        let remote = Arc::new(CountingRemote::default());
        let controller = controller(&local, &remote);

        controller
            .execute(Route::Local { fallback: true }, &DeviceCommand::TurnOn)
            .await
            .unwrap();

        assert_eq!(local.calls.load(Ordering::SeqCst), 3);
        assert_eq!(remote.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_local_falls_back_exactly_once() {
        let local = Arc::new(FlakyLocal {
            failures_left: AtomicU32::new(u32::MAX),
            ..FlakyLocal::default()
        });
        let remote = Arc::new(CountingRemote {
            status_code: 190,
            ..CountingRemote::default()
        });
        let controller = controller(&local, &remote);

        let result = controller
            .execute(Route::Local { fallback: true }, &DeviceCommand::TurnOn)
            .await;

        assert!(matches!(
            result,
            Err(Error::BadStatusCode {
                status_code: 190,
                ..
            })
        ));
        assert_eq!(local.calls.load(Ordering::SeqCst), 3);
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn no_fallback_surfaces_local_error() {
        let local = Arc::new(FlakyLocal {
            failures_left: AtomicU32::new(u32::MAX),
            ..FlakyLocal::default()
        });
        let remote = Arc::new(CountingRemote::default());
        let controller = controller(&local, &remote);

        let result = controller
            .execute(Route::Local { fallback: false }, &DeviceCommand::TurnOff)
            .await;

        assert!(matches!(
            result,
            Err(Error::Protocol(ProtocolError::Timeout(5000)))
        ));
        assert_eq!(remote.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn remote_is_not_retried() {
        let local = Arc::new(FlakyLocal::default());
        let remote = Arc::new(CountingRemote {
            status_code: 161,
            ..CountingRemote::default()
        });
        let controller = controller(&local, &remote);

        assert!(controller.fetch_status(Route::Remote).await.is_err());
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
        assert_eq!(local.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn local_status_filters_advertisements() {
        let local = Arc::new(FlakyLocal {
            advertisements: vec![
                BroadcastPayload::new("WoPlug").with_power(false),
                BroadcastPayload::new("WoBulb").with_power(true),
            ],
            ..FlakyLocal::default()
        });
        let remote = Arc::new(CountingRemote::default());
        let controller = controller(&local, &remote);

        let status = controller
            .fetch_status(Route::Local { fallback: false })
            .await
            .unwrap();
        assert!(matches!(
            status,
            StatusPayload::Broadcast(adv) if adv.model == "WoBulb"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_advertisement_counts_as_failure() {
        let local = Arc::new(FlakyLocal::default());
        let remote = Arc::new(CountingRemote {
            status_code: 100,
            ..CountingRemote::default()
        });
        let controller = controller(&local, &remote);

        let status = controller
            .fetch_status(Route::Local { fallback: true })
            .await
            .unwrap();
        assert!(matches!(status, StatusPayload::Polled(_)));
        assert_eq!(local.calls.load(Ordering::SeqCst), 3);
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn batch_shares_one_retry_budget_and_one_fallback() {
        let local = Arc::new(FlakyLocal {
            failures_left: AtomicU32::new(u32::MAX),
            ..FlakyLocal::default()
        });
        let remote = Arc::new(CountingRemote {
            status_code: 100,
            ..CountingRemote::default()
        });
        let controller = controller(&local, &remote);

        controller
            .execute_batch(
                Route::Local { fallback: true },
                &[DeviceCommand::TurnOn, DeviceCommand::TurnOff],
            )
            .await
            .unwrap();

        assert_eq!(local.calls.load(Ordering::SeqCst), 3);
        assert_eq!(remote.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn batch_retry_resumes_after_acknowledged_commands() {
        let local = Arc::new(ScriptedLocal::new(&[true, false, true, true]));
        let transports = Transports::new().with_local(local.clone());
        let controller = RetryController::new(&config(), transports);

        controller
            .execute_batch(
                Route::Local { fallback: false },
                &[
                    DeviceCommand::TurnOn,
                    DeviceCommand::SetColorTemperature(2700),
                    DeviceCommand::TurnOff,
                ],
            )
            .await
            .unwrap();

        assert_eq!(
            *local.executed.lock(),
            vec![
                DeviceCommand::TurnOn,
                DeviceCommand::SetColorTemperature(2700),
                DeviceCommand::TurnOff,
            ]
        );
    }

    struct ScriptedLocal {
        outcomes: parking_lot::Mutex<std::collections::VecDeque<bool>>,
        executed: parking_lot::Mutex<Vec<DeviceCommand>>,
    }

    impl ScriptedLocal {
        fn new(outcomes: &[bool]) -> Self {
            Self {
                outcomes: parking_lot::Mutex::new(outcomes.iter().copied().collect()),
                executed: parking_lot::Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LocalTransport for ScriptedLocal {
        async fn execute(&self, command: &DeviceCommand) -> Result<(), ProtocolError> {
            if self.outcomes.lock().pop_front().unwrap_or(true) {
                self.executed.lock().push(*command);
                Ok(())
            } else {
                Err(ProtocolError::Timeout(5000))
            }
        }
    }
}
