// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Accessory state management types.
//!
//! [`AccessoryState`] holds the characteristic values of one accessory. The
//! engine keeps two copies: the canonical state (the in-memory source of
//! truth) and the cached-published state (the diff baseline). Ingestion
//! adapters produce [`StateChange`]s that are applied to the canonical copy,
//! and [`diff`] turns the difference between both copies into
//! [`CharacteristicUpdate`]s for the host.
//!
//! # Examples
//!
//! ```
//! use hearth_sync::state::{AccessoryState, StateChange, diff};
//! use hearth_sync::types::{Brightness, PowerState};
//!
//! let published = AccessoryState::new();
//! let mut canonical = published.clone();
//!
//! canonical.apply(&StateChange::Power(PowerState::On));
//! canonical.apply(&StateChange::Brightness(Brightness::new(30).unwrap()));
//!
//! assert_eq!(diff(&canonical, &published).len(), 2);
//! assert!(diff(&canonical, &canonical).is_empty());
//! ```

mod accessory_state;
mod characteristic;
mod state_change;

pub use accessory_state::{AccessoryState, diff};
pub use characteristic::{Characteristic, CharacteristicUpdate, CharacteristicValue};
pub use state_change::StateChange;
