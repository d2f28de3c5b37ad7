// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State change representation.
//!
//! State changes are the unit of partial merge: an ingestion adapter emits
//! one change per field present in its payload, and fields the payload does
//! not mention produce no change at all.
//!
//! # Change Types
//!
//! - [`StateChange::Power`] - On/off changes
//! - [`StateChange::Brightness`] - Brightness level changes
//! - [`StateChange::Hue`] / [`StateChange::Saturation`] - Color changes
//! - [`StateChange::ColorTemperature`] - White color temperature changes
//! - [`StateChange::FirmwareVersion`] - Normalized firmware revision
//! - [`StateChange::Batch`] - Multiple changes grouped together

use super::Characteristic;
use crate::types::{Brightness, Hue, Mired, PowerState, Saturation};

/// Represents a change in accessory state.
///
/// # Examples
///
/// ```
/// use hearth_sync::state::{AccessoryState, StateChange};
///
/// let mut state = AccessoryState::new();
///
/// // Apply returns true if state actually changed
/// assert!(state.apply(&StateChange::power_on()));
///
/// // Applying same change again returns false
/// assert!(!state.apply(&StateChange::power_on()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    /// Power state changed.
    Power(PowerState),

    /// Brightness changed.
    Brightness(Brightness),

    /// Hue changed.
    Hue(Hue),

    /// Saturation changed.
    Saturation(Saturation),

    /// Color temperature changed.
    ColorTemperature(Mired),

    /// Firmware revision reported.
    FirmwareVersion(String),

    /// Multiple changes at once.
    Batch(Vec<StateChange>),
}

impl StateChange {
    /// Creates a power-on change.
    #[must_use]
    pub fn power_on() -> Self {
        Self::Power(PowerState::On)
    }

    /// Creates a power-off change.
    #[must_use]
    pub fn power_off() -> Self {
        Self::Power(PowerState::Off)
    }

    /// Creates a batch of changes.
    #[must_use]
    pub fn batch(changes: Vec<StateChange>) -> Self {
        Self::Batch(changes)
    }

    /// Returns `true` if this is a power state change.
    #[must_use]
    pub fn is_power(&self) -> bool {
        matches!(self, Self::Power(_))
    }

    /// Returns `true` if this is a color change (hue, saturation or color
    /// temperature).
    #[must_use]
    pub fn is_color(&self) -> bool {
        matches!(
            self,
            Self::Hue(_) | Self::Saturation(_) | Self::ColorTemperature(_)
        )
    }

    /// Returns the characteristic written by this change.
    ///
    /// Batches return `None`; use [`flatten`](Self::flatten) first.
    #[must_use]
    pub const fn characteristic(&self) -> Option<Characteristic> {
        match self {
            Self::Power(_) => Some(Characteristic::On),
            Self::Brightness(_) => Some(Characteristic::Brightness),
            Self::Hue(_) => Some(Characteristic::Hue),
            Self::Saturation(_) => Some(Characteristic::Saturation),
            Self::ColorTemperature(_) => Some(Characteristic::ColorTemperature),
            Self::FirmwareVersion(_) => Some(Characteristic::FirmwareRevision),
            Self::Batch(_) => None,
        }
    }

    /// Returns the individual changes, with batches expanded in order.
    #[must_use]
    pub fn flatten(&self) -> Vec<&Self> {
        match self {
            Self::Batch(changes) => changes.iter().flat_map(Self::flatten).collect(),
            _ => vec![self],
        }
    }

    /// Returns the number of individual changes.
    ///
    /// For batch changes, returns the total count of nested changes.
    #[must_use]
    pub fn change_count(&self) -> usize {
        match self {
            Self::Batch(changes) => changes.iter().map(Self::change_count).sum(),
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_change_constructors() {
        assert_eq!(StateChange::power_on(), StateChange::Power(PowerState::On));
        assert_eq!(
            StateChange::power_off(),
            StateChange::Power(PowerState::Off)
        );
        assert!(StateChange::power_on().is_power());
        assert!(!StateChange::Brightness(Brightness::MAX).is_power());
    }

    #[test]
    fn is_color() {
        assert!(StateChange::Hue(Hue::normalized(10)).is_color());
        assert!(StateChange::ColorTemperature(Mired::WARMEST).is_color());
        assert!(!StateChange::Brightness(Brightness::MAX).is_color());
    }

    #[test]
    fn change_count() {
        assert_eq!(StateChange::power_on().change_count(), 1);

        let batch = StateChange::batch(vec![
            StateChange::power_on(),
            StateChange::Brightness(Brightness::MAX),
        ]);
        assert_eq!(batch.change_count(), 2);

        let nested = StateChange::batch(vec![batch, StateChange::power_off()]);
        assert_eq!(nested.change_count(), 3);
    }

    #[test]
    fn flatten_expands_nested_batches() {
        let nested = StateChange::batch(vec![
            StateChange::batch(vec![
                StateChange::power_on(),
                StateChange::Brightness(Brightness::MAX),
            ]),
            StateChange::Hue(Hue::normalized(10)),
        ]);
        let characteristics: Vec<_> = nested
            .flatten()
            .into_iter()
            .filter_map(StateChange::characteristic)
            .collect();
        assert_eq!(
            characteristics,
            vec![
                Characteristic::On,
                Characteristic::Brightness,
                Characteristic::Hue
            ]
        );
        assert_eq!(nested.characteristic(), None);
    }
}
