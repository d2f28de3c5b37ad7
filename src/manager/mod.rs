// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Multi-accessory management.
//!
//! The [`AccessoryManager`] is the entry point for a host integration: it
//! builds accessories from [`PlatformConfig`](crate::config::PlatformConfig),
//! routes push notifications to them and broadcasts every characteristic
//! update on one event bus.
//!
//! # Examples
//!
//! ```no_run
//! use hearth_sync::config::DeviceConfig;
//! use hearth_sync::event::AccessoryEvent;
//! use hearth_sync::manager::AccessoryManager;
//! use hearth_sync::state::StateChange;
//!
//! # async fn example() -> hearth_sync::Result<()> {
//! let manager = AccessoryManager::new();
//! let mut events = manager.subscribe();
//!
//! let id = manager.add_accessory(DeviceConfig::local("C0FFEE000001"))?;
//! manager.set(id, StateChange::power_on())?;
//!
//! while let Ok(event) = events.recv().await {
//!     if let AccessoryEvent::CharacteristicsUpdated { updates, .. } = event {
//!         println!("{updates:?}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod accessory_manager;

pub use accessory_manager::AccessoryManager;
