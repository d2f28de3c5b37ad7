// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Accessory event types.

use crate::state::CharacteristicUpdate;

use super::AccessoryId;

/// Events delivered to the host.
///
/// # Examples
///
/// ```
/// use hearth_sync::event::{AccessoryEvent, AccessoryId};
/// use hearth_sync::state::{Characteristic, CharacteristicUpdate};
///
/// let id = AccessoryId::new();
/// let event = AccessoryEvent::characteristics_updated(
///     id,
///     vec![CharacteristicUpdate::error(Characteristic::On)],
/// );
/// assert_eq!(event.accessory_id(), id);
/// assert!(event.has_error());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessoryEvent {
    /// An accessory was added to the manager.
    AccessoryAdded {
        /// The ID of the added accessory.
        accessory_id: AccessoryId,
    },

    /// An accessory was removed from the manager.
    AccessoryRemoved {
        /// The ID of the removed accessory.
        accessory_id: AccessoryId,
    },

    /// Characteristic values to reflect on the host.
    CharacteristicsUpdated {
        /// The ID of the accessory.
        accessory_id: AccessoryId,
        /// Updates in publish order.
        updates: Vec<CharacteristicUpdate>,
    },
}

impl AccessoryEvent {
    /// Returns the accessory ID associated with this event.
    #[must_use]
    pub fn accessory_id(&self) -> AccessoryId {
        match self {
            Self::AccessoryAdded { accessory_id }
            | Self::AccessoryRemoved { accessory_id }
            | Self::CharacteristicsUpdated { accessory_id, .. } => *accessory_id,
        }
    }

    /// Returns `true` if this is a lifecycle event (added/removed).
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::AccessoryAdded { .. } | Self::AccessoryRemoved { .. }
        )
    }

    /// Returns the characteristic updates carried by the event.
    #[must_use]
    pub fn updates(&self) -> &[CharacteristicUpdate] {
        match self {
            Self::CharacteristicsUpdated { updates, .. } => updates,
            _ => &[],
        }
    }

    /// Returns `true` if any carried update is an error indicator.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.updates().iter().any(|u| u.value.is_error())
    }

    /// Creates an accessory added event.
    #[must_use]
    pub fn accessory_added(accessory_id: AccessoryId) -> Self {
        Self::AccessoryAdded { accessory_id }
    }

    /// Creates an accessory removed event.
    #[must_use]
    pub fn accessory_removed(accessory_id: AccessoryId) -> Self {
        Self::AccessoryRemoved { accessory_id }
    }

    /// Creates a characteristics updated event.
    #[must_use]
    pub fn characteristics_updated(
        accessory_id: AccessoryId,
        updates: Vec<CharacteristicUpdate>,
    ) -> Self {
        Self::CharacteristicsUpdated {
            accessory_id,
            updates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Characteristic, CharacteristicValue};

    #[test]
    fn lifecycle_events() {
        let id = AccessoryId::new();
        assert!(AccessoryEvent::accessory_added(id).is_lifecycle());
        assert!(AccessoryEvent::accessory_removed(id).is_lifecycle());
        assert!(AccessoryEvent::accessory_removed(id).updates().is_empty());
    }

    #[test]
    fn update_events() {
        let id = AccessoryId::new();
        let event = AccessoryEvent::characteristics_updated(
            id,
            vec![CharacteristicUpdate::new(
                Characteristic::On,
                CharacteristicValue::Bool(true),
            )],
        );
        assert!(!event.is_lifecycle());
        assert!(!event.has_error());
        assert_eq!(event.updates().len(), 1);
        assert_eq!(event.accessory_id(), id);
    }
}
