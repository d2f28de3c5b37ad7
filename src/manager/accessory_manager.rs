// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Manager owning every configured accessory.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

#[cfg(feature = "mqtt")]
use crate::config::PushRelayConfig;
use crate::config::{DeviceConfig, PlatformConfig};
use crate::engine::Accessory;
use crate::error::{ConfigError, Error};
use crate::event::{AccessoryEvent, AccessoryId, EventBus};
#[cfg(feature = "mqtt")]
use crate::push::MqttPushListener;
use crate::push::PushRouter;
use crate::state::StateChange;
use crate::transport::{LocalTransport, RemoteTransport, Transports};

/// Owns accessory engines, the push routing table and the event bus.
///
/// All accessories share the manager's transports. Adding an accessory
/// registers it for push delivery under its device identifier and emits
/// [`AccessoryEvent::AccessoryAdded`]; characteristic updates from every
/// accessory arrive on the same bus.
///
/// # Examples
///
/// ```no_run
/// use hearth_sync::config::PlatformConfig;
/// use hearth_sync::manager::AccessoryManager;
///
/// #[tokio::main]
/// async fn main() -> hearth_sync::Result<()> {
///     let config = PlatformConfig::from_json(r#"{
///         "cloud": { "token": "t0k3n" },
///         "devices": [ { "id": "C0FFEE000001", "connection": "remote" } ]
///     }"#)?;
///
///     let manager = AccessoryManager::from_config(&config)?;
///     let mut events = manager.subscribe();
///     tokio::spawn(async move {
///         while let Ok(event) = events.recv().await {
///             println!("Event: {event:?}");
///         }
///     });
///
///     manager.refresh_all().await;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct AccessoryManager {
    accessories: RwLock<HashMap<AccessoryId, Arc<Accessory>>>,
    event_bus: EventBus,
    router: Arc<PushRouter>,
    transports: Transports,
}

impl AccessoryManager {
    /// Creates a manager without transports.
    #[must_use]
    pub fn new() -> Self {
        Self::with_transports(Transports::new())
    }

    /// Creates a manager whose accessories use `transports`.
    #[must_use]
    pub fn with_transports(transports: Transports) -> Self {
        Self {
            accessories: RwLock::new(HashMap::new()),
            event_bus: EventBus::new(),
            router: Arc::new(PushRouter::new()),
            transports,
        }
    }

    /// Creates a manager from platform configuration and adds every
    /// configured device.
    ///
    /// With the `http` feature, a [`CloudClient`](crate::transport::CloudClient)
    /// is created when a cloud token is configured.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a device entry is invalid.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn from_config(config: &PlatformConfig) -> Result<Self, Error> {
        config.validate()?;

        let manager = Self::with_transports(platform_transports(config)?);
        for device in &config.devices {
            manager.add_accessory(device.clone())?;
        }
        Ok(manager)
    }

    /// Sets the local transport used by accessories added afterwards.
    #[must_use]
    pub fn with_local(mut self, local: Arc<dyn LocalTransport>) -> Self {
        self.transports = self.transports.with_local(local);
        self
    }

    /// Sets the remote transport used by accessories added afterwards.
    #[must_use]
    pub fn with_remote(mut self, remote: Arc<dyn RemoteTransport>) -> Self {
        self.transports = self.transports.with_remote(remote);
        self
    }

    // ========== Events ==========

    /// Subscribes to accessory events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AccessoryEvent> {
        self.event_bus.subscribe()
    }

    /// Returns the number of event subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.event_bus.subscriber_count()
    }

    /// Returns the push routing table.
    #[must_use]
    pub fn push_router(&self) -> &Arc<PushRouter> {
        &self.router
    }

    /// Starts relaying push notifications from an MQTT broker.
    ///
    /// The relay runs until the returned listener is dropped.
    ///
    /// # Errors
    ///
    /// Returns `Error::Protocol` if the broker URL is invalid or the
    /// subscription fails.
    #[cfg(feature = "mqtt")]
    pub async fn start_push_relay(
        &self,
        config: &PushRelayConfig,
    ) -> Result<MqttPushListener, Error> {
        let listener = MqttPushListener::connect(config, Arc::clone(&self.router)).await?;
        Ok(listener)
    }

    // ========== Accessories ==========

    /// Adds an accessory and starts its engine.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the device configuration is invalid or
    /// another accessory already uses the device identifier.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn add_accessory(&self, config: DeviceConfig) -> Result<AccessoryId, Error> {
        config.validate()?;

        let device_id = config.id.clone();
        let accessory = Accessory::new(
            config,
            self.transports.clone(),
            Arc::new(self.event_bus.clone()),
        );
        let accessory_id = accessory.id();

        if !self.router.register(&device_id, &accessory) {
            return Err(ConfigError::InvalidValue {
                field: "id".to_string(),
                message: format!("device {device_id} is already configured"),
            }
            .into());
        }
        self.accessories.write().insert(accessory_id, accessory);

        tracing::info!(%accessory_id, device = %device_id, "Accessory added");
        self.event_bus
            .publish(AccessoryEvent::accessory_added(accessory_id));
        Ok(accessory_id)
    }

    /// Removes an accessory and stops its engine.
    ///
    /// Returns `true` if the accessory existed.
    pub fn remove_accessory(&self, accessory_id: AccessoryId) -> bool {
        let Some(accessory) = self.accessories.write().remove(&accessory_id) else {
            return false;
        };

        self.router.unregister(&accessory.config().id);
        tracing::info!(%accessory_id, device = %accessory.config().id, "Accessory removed");
        self.event_bus
            .publish(AccessoryEvent::accessory_removed(accessory_id));
        true
    }

    /// Returns an accessory.
    ///
    /// # Errors
    ///
    /// Returns `Error::AccessoryNotFound` for an unknown identifier.
    pub fn get(&self, accessory_id: AccessoryId) -> Result<Arc<Accessory>, Error> {
        self.accessories
            .read()
            .get(&accessory_id)
            .cloned()
            .ok_or(Error::AccessoryNotFound)
    }

    /// Returns the accessory configured for a device identifier.
    #[must_use]
    pub fn find_by_device_id(&self, device_id: &str) -> Option<Arc<Accessory>> {
        self.router.lookup(device_id)
    }

    /// Returns all accessory identifiers.
    #[must_use]
    pub fn accessory_ids(&self) -> Vec<AccessoryId> {
        self.accessories.read().keys().copied().collect()
    }

    /// Returns the number of accessories.
    #[must_use]
    pub fn accessory_count(&self) -> usize {
        self.accessories.read().len()
    }

    /// Applies a host write to an accessory.
    ///
    /// # Errors
    ///
    /// Returns `Error::AccessoryNotFound` for an unknown identifier.
    pub fn set(&self, accessory_id: AccessoryId, change: StateChange) -> Result<(), Error> {
        self.get(accessory_id)?.set(change);
        Ok(())
    }

    /// Refreshes one accessory.
    ///
    /// # Errors
    ///
    /// Returns `Error::AccessoryNotFound` for an unknown identifier.
    pub async fn refresh(&self, accessory_id: AccessoryId) -> Result<(), Error> {
        let accessory = self.get(accessory_id)?;
        accessory.refresh().await;
        Ok(())
    }

    /// Refreshes every accessory in turn.
    pub async fn refresh_all(&self) {
        let accessories: Vec<_> = self.accessories.read().values().cloned().collect();
        for accessory in accessories {
            accessory.refresh().await;
        }
    }
}

#[cfg(feature = "http")]
fn platform_transports(config: &PlatformConfig) -> Result<Transports, Error> {
    let transports = Transports::new();
    match config.cloud.as_ref().filter(|c| c.has_token()) {
        Some(cloud) => {
            let client = crate::transport::CloudClient::new(cloud)?;
            Ok(transports.with_remote(Arc::new(client)))
        }
        None => Ok(transports),
    }
}

#[cfg(not(feature = "http"))]
#[allow(clippy::unnecessary_wraps)]
fn platform_transports(config: &PlatformConfig) -> Result<Transports, Error> {
    if config.has_credentials() {
        tracing::warn!("Cloud token configured but the http feature is disabled");
    }
    Ok(Transports::new())
}

impl Default for AccessoryManager {
    fn default() -> Self {
        Self::new()
    }
}
