// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event bus broadcasting accessory events.

use tokio::sync::broadcast;

use crate::state::CharacteristicUpdate;

use super::{AccessoryEvent, AccessoryId, CharacteristicSink};

/// Default channel capacity for the event bus.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Event bus for broadcasting accessory events to multiple subscribers.
///
/// Each subscriber gets its own copy of each event. If a subscriber falls
/// more than the channel capacity behind, it loses the oldest events and
/// receives `RecvError::Lagged`.
///
/// `EventBus` implements [`CharacteristicSink`], so it can be handed to
/// accessories directly.
///
/// # Examples
///
/// ```
/// use hearth_sync::event::{AccessoryEvent, AccessoryId, EventBus};
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(AccessoryEvent::accessory_added(AccessoryId::new()));
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AccessoryEvent>,
}

impl EventBus {
    /// Creates a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a new event bus with the specified capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to accessory events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AccessoryEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event to all subscribers.
    ///
    /// Without subscribers the event is discarded.
    pub fn publish(&self, event: AccessoryEvent) {
        // No subscribers is not an error
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl CharacteristicSink for EventBus {
    fn publish(&self, accessory_id: AccessoryId, updates: &[CharacteristicUpdate]) {
        tracing::trace!(%accessory_id, count = updates.len(), "Publishing characteristics");
        let _ = self.sender.send(AccessoryEvent::characteristics_updated(
            accessory_id,
            updates.to_vec(),
        ));
    }
}
