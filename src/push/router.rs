// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Push notification routing.
//!
//! ```text
//! {"eventType":"changeReport","context":{"deviceMac":"C0FFEE000001",...}}
//!                     ↓
//!             PushRouter.route()
//!                     ↓
//!       Lookup "C0FFEE000001" in accessories
//!                     ↓
//!          Weak<Accessory>.upgrade()
//!                     ↓
//!       accessory.deliver(StatusPayload::Push)
//! ```
//!
//! Routing never waits for the accessory: delivered payloads queue in the
//! accessory's inbox, so a busy accessory does not hold up the others.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::engine::Accessory;
use crate::ingest::{PushStatus, StatusPayload, normalize_device_id};

/// Dispatch table from device identifier to accessory.
///
/// Identifiers are normalized on registration and lookup, so MAC-style and
/// bare identifiers match. Entries hold weak references; dropped accessories
/// are skipped and removed by [`cleanup`](Self::cleanup).
#[derive(Debug, Default)]
pub struct PushRouter {
    accessories: RwLock<HashMap<String, Weak<Accessory>>>,
}

impl PushRouter {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an accessory under a device identifier.
    ///
    /// Returns `false` and keeps the existing entry if a live accessory is
    /// already registered for the identifier. Entries of dropped accessories
    /// are replaced.
    pub fn register(&self, device_id: &str, accessory: &Arc<Accessory>) -> bool {
        let key = normalize_device_id(device_id);
        let mut accessories = self.accessories.write();
        if let Some(existing) = accessories.get(&key).and_then(Weak::upgrade) {
            tracing::warn!(
                device = %key,
                registered = %existing.id(),
                rejected = %accessory.id(),
                "Device already registered for push"
            );
            return false;
        }
        tracing::debug!(device = %key, accessory_id = %accessory.id(), "Registering for push");
        accessories.insert(key, Arc::downgrade(accessory));
        true
    }

    /// Removes a registration.
    ///
    /// Returns `true` if the identifier was registered.
    pub fn unregister(&self, device_id: &str) -> bool {
        let key = normalize_device_id(device_id);
        tracing::debug!(device = %key, "Unregistering from push");
        self.accessories.write().remove(&key).is_some()
    }

    /// Returns the live accessory registered for `device_id`.
    #[must_use]
    pub fn lookup(&self, device_id: &str) -> Option<Arc<Accessory>> {
        self.accessories
            .read()
            .get(&normalize_device_id(device_id))
            .and_then(Weak::upgrade)
    }

    /// Parses a push payload and queues it on the matching accessory.
    ///
    /// Returns `false` if the payload is malformed or no live accessory is
    /// registered for it.
    pub fn route(&self, payload: &str) -> bool {
        let status = match PushStatus::from_json(payload) {
            Ok(status) => status,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed push payload");
                return false;
            }
        };

        let device_id = status.device_id();
        let Some(accessory) = self.lookup(&device_id) else {
            tracing::trace!(device = %device_id, "No registered accessory for push");
            return false;
        };

        accessory.deliver(StatusPayload::Push(status));
        true
    }

    /// Removes entries whose accessory has been dropped.
    pub fn cleanup(&self) {
        self.accessories.write().retain(|device, weak| {
            let alive = weak.strong_count() > 0;
            if !alive {
                tracing::debug!(device = %device, "Cleaning up dropped accessory");
            }
            alive
        });
    }

    /// Returns the number of registered identifiers.
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.accessories.read().len()
    }

    /// Returns the number of registrations whose accessory is still alive.
    #[must_use]
    pub fn active_device_count(&self) -> usize {
        self.accessories
            .read()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::Capabilities;
    use crate::config::DeviceConfig;
    use crate::event::{AccessoryId, CharacteristicSink};
    use crate::state::CharacteristicUpdate;
    use crate::transport::Transports;
    use crate::types::Brightness;

    struct NullSink;

    impl CharacteristicSink for NullSink {
        fn publish(&self, _accessory_id: AccessoryId, _updates: &[CharacteristicUpdate]) {}
    }

    fn accessory(id: &str) -> Arc<Accessory> {
        let config = DeviceConfig::remote(id)
            .with_capabilities(Capabilities::dimmable_light())
            .with_refresh_rate(Duration::from_secs(3600));
        Accessory::new(config, Transports::new(), Arc::new(NullSink))
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    const PAYLOAD: &str = r#"{
        "eventType": "changeReport",
        "context": {
            "deviceMac": "c0:ff:ee:00:00:01",
            "powerState": "ON",
            "brightness": 42
        }
    }"#;

    #[tokio::test(start_paused = true)]
    async fn routes_by_normalized_id() {
        let router = PushRouter::new();
        let lamp = accessory("C0FFEE000001");
        router.register("C0-FF-EE-00-00-01", &lamp);

        assert!(router.route(PAYLOAD));
        settle().await;
        let state = lamp.state();
        assert!(state.power().is_on());
        assert_eq!(state.brightness(), Some(Brightness::new(42).unwrap()));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_device_is_not_routed() {
        let router = PushRouter::new();
        let lamp = accessory("AABBCCDDEEFF");
        router.register("AABBCCDDEEFF", &lamp);

        assert!(!router.route(PAYLOAD));
        settle().await;
        assert!(!lamp.state().power().is_on());
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_payload_is_not_routed() {
        let router = PushRouter::new();
        assert!(!router.route("not json"));
        assert!(!router.route(r#"{"eventType":"changeReport"}"#));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_accessory_is_cleaned_up() {
        let router = PushRouter::new();
        let lamp = accessory("C0FFEE000001");
        let other = accessory("C0FFEE000002");
        router.register("C0FFEE000001", &lamp);
        router.register("C0FFEE000002", &other);
        assert_eq!(router.active_device_count(), 2);

        drop(lamp);
        assert_eq!(router.device_count(), 2);
        assert_eq!(router.active_device_count(), 1);
        assert!(!router.route(PAYLOAD));

        router.cleanup();
        assert_eq!(router.device_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unregister() {
        let router = PushRouter::new();
        let lamp = accessory("C0FFEE000001");
        router.register("C0FFEE000001", &lamp);

        assert!(router.unregister("c0:ff:ee:00:00:01"));
        assert!(!router.unregister("c0:ff:ee:00:00:01"));
        assert!(router.lookup("C0FFEE000001").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn live_registration_is_not_replaced() {
        let router = PushRouter::new();
        let lamp = accessory("C0FFEE000001");
        let twin = accessory("C0FFEE000001");

        assert!(router.register("C0FFEE000001", &lamp));
        assert!(!router.register("c0:ff:ee:00:00:01", &twin));
        assert_eq!(router.lookup("C0FFEE000001").unwrap().id(), lamp.id());

        drop(lamp);
        assert!(router.register("C0FFEE000001", &twin));
        assert_eq!(router.lookup("C0FFEE000001").unwrap().id(), twin.id());
    }

    #[tokio::test(start_paused = true)]
    async fn busy_accessory_does_not_hold_up_others() {
        let router = PushRouter::new();
        let config = DeviceConfig::remote("C0FFEE000001")
            .with_capabilities(Capabilities::dimmable_light())
            .with_refresh_rate(Duration::from_secs(3600))
            .with_push_rate(Duration::from_secs(60));
        let busy = Accessory::new(config, Transports::new(), Arc::new(NullSink));
        let idle = accessory("C0FFEE000002");
        router.register("C0FFEE000001", &busy);
        router.register("C0FFEE000002", &idle);

        // A pending write holds ingestion on the busy accessory
        busy.set_brightness(Brightness::new(10).unwrap());
        assert!(router.route(PAYLOAD));
        assert!(router.route(&PAYLOAD.replace("00:01", "00:02")));
        settle().await;

        assert!(idle.state().power().is_on());
        assert!(busy.is_update_in_progress());
        assert_eq!(busy.state().brightness(), Some(Brightness::new(10).unwrap()));
    }
}
