// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Canonical and cached-published state of one accessory.

use crate::state::{
    AccessoryState, Characteristic, CharacteristicUpdate, StateChange, diff,
};
use crate::types::PowerState;

/// Keeps canonical state next to two baselines, and computes what the host
/// needs to hear about.
///
/// - the cached-published state is what the device is known to hold: device
///   reads and dispatched snapshots. Command batches are planned against it.
/// - the reported state is what the host has been shown. Host updates are
///   diffed against it.
///
/// The two differ while a host write waits for dispatch, and after a failed
/// dispatch, where the device baseline stays stale so the next cycle sends
/// the same delta.
///
/// Every method returning updates leaves the caller to forward them to the
/// host; the reconciler itself does no I/O.
///
/// After an error indicator, the next successful publish re-emits every
/// known characteristic so the host clears the indicator. A freshly created
/// reconciler starts in that state, so the first publish is complete.
///
/// # Examples
///
/// ```
/// use hearth_sync::engine::Reconciler;
/// use hearth_sync::state::{AccessoryState, StateChange};
///
/// let mut reconciler = Reconciler::new(AccessoryState::new());
///
/// // First publish is complete
/// let updates = reconciler.merge(&[StateChange::power_on()]);
/// assert_eq!(updates.len(), 1);
///
/// // Same payload again publishes nothing
/// assert!(reconciler.merge(&[StateChange::power_on()]).is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Reconciler {
    canonical: AccessoryState,
    published: AccessoryState,
    reported: AccessoryState,
    needs_full_publish: bool,
}

impl Reconciler {
    /// Creates a reconciler starting from `initial`.
    #[must_use]
    pub fn new(initial: AccessoryState) -> Self {
        Self {
            published: initial.clone(),
            reported: initial.clone(),
            canonical: initial,
            needs_full_publish: true,
        }
    }

    /// Returns the canonical state.
    #[must_use]
    pub fn canonical(&self) -> &AccessoryState {
        &self.canonical
    }

    /// Returns the canonical state for host writes.
    ///
    /// Follow a write with [`record_write`](Self::record_write).
    pub fn canonical_mut(&mut self) -> &mut AccessoryState {
        &mut self.canonical
    }

    /// Returns the cached-published state, the baseline for command batches.
    #[must_use]
    pub fn published(&self) -> &AccessoryState {
        &self.published
    }

    /// Returns the state last shown to the host.
    #[must_use]
    pub fn reported(&self) -> &AccessoryState {
        &self.reported
    }

    /// Returns `true` if the next publish re-emits every characteristic.
    #[must_use]
    pub const fn needs_full_publish(&self) -> bool {
        self.needs_full_publish
    }

    /// Merges device reads into canonical state and publishes.
    pub fn merge(&mut self, changes: &[StateChange]) -> Vec<CharacteristicUpdate> {
        self.merge_with(changes, |_| true)
    }

    /// Merges device reads, letting `accept` decide which of them reach the
    /// canonical state.
    ///
    /// Every read updates the cached-published state, since it describes the
    /// device. Rejected reads leave canonical state alone; a pending host
    /// write uses this to keep its values.
    pub fn merge_with(
        &mut self,
        changes: &[StateChange],
        mut accept: impl FnMut(&StateChange) -> bool,
    ) -> Vec<CharacteristicUpdate> {
        for change in changes.iter().flat_map(StateChange::flatten) {
            self.published.apply(change);
            if accept(change) {
                self.canonical.apply(change);
            }
        }
        self.publish()
    }

    /// Publishes canonical state.
    ///
    /// Returns the characteristics that differ from the reported state, or
    /// all of them after an error indicator.
    pub fn publish(&mut self) -> Vec<CharacteristicUpdate> {
        let updates = if self.needs_full_publish {
            self.needs_full_publish = false;
            self.canonical.updates()
        } else {
            diff(&self.canonical, &self.reported)
        };
        self.reported = self.canonical.clone();
        updates
    }

    /// Records a host write made through [`canonical_mut`](Self::canonical_mut).
    ///
    /// The host already shows what it wrote; only the `shadowed` values it
    /// could not know are returned.
    pub fn record_write(&mut self, shadowed: &[Characteristic]) -> Vec<CharacteristicUpdate> {
        let updates = self.current_values(shadowed);
        self.reported = self.canonical.clone();
        updates
    }

    /// Returns the current canonical values of `characteristics`.
    #[must_use]
    pub fn current_values(&self, characteristics: &[Characteristic]) -> Vec<CharacteristicUpdate> {
        characteristics
            .iter()
            .filter_map(|c| {
                self.canonical
                    .value_of(*c)
                    .map(|value| CharacteristicUpdate::new(*c, value))
            })
            .collect()
    }

    /// Records a successful dispatch.
    ///
    /// The cached-published state becomes the dispatched snapshot, and
    /// canonical state is published against what the host was shown.
    pub fn commit(&mut self, snapshot: AccessoryState) -> Vec<CharacteristicUpdate> {
        self.published = snapshot;
        self.publish()
    }

    /// Records a failed cycle and returns error indicators for
    /// `characteristics`.
    ///
    /// Canonical and cached-published state are left as they are, so the
    /// next cycle sees the same delta.
    pub fn fail(&mut self, characteristics: &[Characteristic]) -> Vec<CharacteristicUpdate> {
        self.needs_full_publish = true;
        characteristics
            .iter()
            .map(|c| CharacteristicUpdate::error(*c))
            .collect()
    }

    /// Forces the accessory off and publishes the result.
    ///
    /// Used for devices configured as offline with no usable transport.
    pub fn force_off(&mut self) -> Vec<CharacteristicUpdate> {
        self.canonical.set_power(PowerState::Off);
        self.published.set_power(PowerState::Off);
        self.publish()
    }
}
