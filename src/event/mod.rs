// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host-facing event publishing.
//!
//! Accessories report characteristic values through the
//! [`CharacteristicSink`] trait. Publishing is fire-and-forget: the engine
//! never waits on, or learns about, the host's handling of an update.
//!
//! [`EventBus`] is the bundled sink. It wraps each publish in an
//! [`AccessoryEvent`] and broadcasts it over a tokio channel.
//!
//! # Examples
//!
//! ```
//! use hearth_sync::event::{AccessoryId, CharacteristicSink, EventBus};
//! use hearth_sync::state::{Characteristic, CharacteristicUpdate, CharacteristicValue};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! let update = CharacteristicUpdate::new(Characteristic::On, CharacteristicValue::Bool(true));
//! CharacteristicSink::publish(&bus, AccessoryId::new(), &[update]);
//!
//! let event = rx.try_recv().unwrap();
//! assert_eq!(event.updates().len(), 1);
//! ```

mod accessory_event;
mod accessory_id;
mod event_bus;

pub use accessory_event::AccessoryEvent;
pub use accessory_id::AccessoryId;
pub use event_bus::EventBus;

use crate::state::CharacteristicUpdate;

/// Receiver of characteristic updates destined for the host.
pub trait CharacteristicSink: Send + Sync {
    /// Publishes updates for one accessory.
    ///
    /// Implementations must not block; errors stay on the host side.
    fn publish(&self, accessory_id: AccessoryId, updates: &[CharacteristicUpdate]);
}
