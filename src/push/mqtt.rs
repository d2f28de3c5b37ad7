// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT relay for push notifications.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::PushRelayConfig;
use crate::error::ProtocolError;

use super::PushRouter;

/// Global counter for generating unique client IDs.
static CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Payloads buffered between the event loop and the router.
const RELAY_BUFFER: usize = 64;

/// Subscribes to a broker topic and feeds its payloads to a [`PushRouter`].
///
/// Payloads are routed one at a time in arrival order. The listener stops
/// when dropped.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use hearth_sync::config::PushRelayConfig;
/// use hearth_sync::push::{MqttPushListener, PushRouter};
///
/// # async fn example() -> Result<(), hearth_sync::ProtocolError> {
/// let router = Arc::new(PushRouter::new());
/// let config = PushRelayConfig::new("mqtt://192.168.1.50:1883", "hearth/push");
/// let listener = MqttPushListener::connect(&config, Arc::clone(&router)).await?;
/// assert_eq!(listener.topic(), "hearth/push");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MqttPushListener {
    client: AsyncClient,
    topic: String,
    tasks: Vec<JoinHandle<()>>,
}

impl MqttPushListener {
    /// Connects to the relay broker and subscribes to its topic.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidAddress` for a malformed broker URL and
    /// `ProtocolError::Mqtt` if the subscription cannot be queued.
    pub async fn connect(
        config: &PushRelayConfig,
        router: Arc<PushRouter>,
    ) -> Result<Self, ProtocolError> {
        let (host, port) = parse_mqtt_url(&config.broker_url)?;

        // PID + counter to avoid conflicts
        let counter = CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        let client_id = format!("hearth_{}_{}", std::process::id(), counter);

        let mut mqtt_options = MqttOptions::new(&client_id, host, port);
        mqtt_options.set_keep_alive(Duration::from_secs(30));
        mqtt_options.set_clean_session(true);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, 10);
        client
            .subscribe(&config.topic, QoS::AtLeastOnce)
            .await
            .map_err(ProtocolError::Mqtt)?;

        let (payload_tx, payload_rx) = mpsc::channel::<String>(RELAY_BUFFER);
        let topic = config.topic.clone();
        let events = tokio::spawn(handle_mqtt_events(event_loop, topic, payload_tx));
        let relay = tokio::spawn(relay_payloads(payload_rx, router));

        tracing::info!(broker = %config.broker_url, topic = %config.topic, "Push relay started");

        Ok(Self {
            client,
            topic: config.topic.clone(),
            tasks: vec![events, relay],
        })
    }

    /// Returns the subscribed topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Unsubscribes and disconnects from the broker.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Mqtt` if the requests cannot be queued.
    pub async fn disconnect(&self) -> Result<(), ProtocolError> {
        self.client.unsubscribe(&self.topic).await?;
        self.client.disconnect().await?;
        Ok(())
    }
}

impl Drop for MqttPushListener {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

/// Parses an MQTT URL into host and port.
fn parse_mqtt_url(url: &str) -> Result<(String, u16), ProtocolError> {
    let url = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    if url.is_empty() {
        return Err(ProtocolError::InvalidAddress("empty broker URL".to_string()));
    }

    let (host, port) = if let Some((h, p)) = url.rsplit_once(':') {
        let port = p
            .parse()
            .map_err(|_| ProtocolError::InvalidAddress(format!("Invalid port: {p}")))?;
        (h.to_string(), port)
    } else {
        (url.to_string(), 1883)
    };

    Ok((host, port))
}

/// Polls the event loop and forwards payloads published on `topic`.
///
/// Connection errors are logged and polling continues; rumqttc reconnects on
/// the next poll.
async fn handle_mqtt_events(
    mut event_loop: EventLoop,
    topic: String,
    payload_tx: mpsc::Sender<String>,
) {
    use rumqttc::{Event, Packet};

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT connected");
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                if publish.topic != topic {
                    continue;
                }
                match String::from_utf8(publish.payload.to_vec()) {
                    Ok(payload) => {
                        tracing::trace!(topic = %publish.topic, "Received push payload");
                        if payload_tx.send(payload).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::debug!(error = %e, "Ignoring non-UTF-8 push payload"),
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "MQTT event loop error");
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }
}

async fn relay_payloads(mut payload_rx: mpsc::Receiver<String>, router: Arc<PushRouter>) {
    while let Some(payload) = payload_rx.recv().await {
        router.route(&payload);
    }
    tracing::debug!("Push relay stopped");
}
