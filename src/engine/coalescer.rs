// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coalescing of host writes into command batches.
//!
//! Host writes are applied to the canonical state as they arrive and the
//! resulting snapshot is staged in a single "latest wins" slot. When the
//! debounce window closes, [`plan_batch`] turns the delta between the
//! staged snapshot and the cached-published state into an ordered
//! [`CommandBatch`].
//!
//! While a snapshot is staged, the characteristics the host wrote are held:
//! a status read landing in that time cannot overwrite them, see
//! [`Coalescer::absorb`].
//!
//! On devices with both color and color temperature, the two controls
//! shadow each other:
//!
//! - a color temperature write derives hue and saturation from the
//!   black-body curve; the device only receives the temperature command
//! - a hue or saturation write forces the color temperature to its
//!   minimum; the device only receives the color command

use crate::Capabilities;
use crate::state::{AccessoryState, Characteristic, StateChange};
use crate::transport::DeviceCommand;
use crate::types::{Mired, PowerState, RgbColor, convert};

/// Color control last written by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorMode {
    /// White color temperature.
    Temperature,
    /// Hue and saturation.
    HueSaturation,
}

/// Outcome of applying one host write to the canonical state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserWrite {
    /// Color mode selected by the write, if it touched a color control.
    pub color_mode: Option<ColorMode>,
    /// Characteristics the host wrote.
    pub written: Vec<Characteristic>,
    /// Characteristics whose values were derived by shadowing and must be
    /// published to the host.
    pub shadowed: Vec<Characteristic>,
}

impl UserWrite {
    /// Returns every characteristic the write changed, derived ones
    /// included.
    pub fn touched(&self) -> impl Iterator<Item = Characteristic> + '_ {
        self.written.iter().chain(&self.shadowed).copied()
    }
}

/// Applies a host write to `state`, including color shadowing.
///
/// Writes to characteristics the device does not support are ignored and
/// return `None`. Values are clamped to the device ranges.
///
/// # Examples
///
/// ```
/// use hearth_sync::Capabilities;
/// use hearth_sync::engine::{ColorMode, apply_user_write};
/// use hearth_sync::state::{AccessoryState, Characteristic, StateChange};
/// use hearth_sync::types::Mired;
///
/// let caps = Capabilities::color_bulb();
/// let mut state = AccessoryState::new();
///
/// let write = apply_user_write(
///     &mut state,
///     &StateChange::ColorTemperature(Mired::new(300).unwrap()),
///     &caps,
/// )
/// .unwrap();
///
/// assert_eq!(write.color_mode, Some(ColorMode::Temperature));
/// assert_eq!(write.shadowed, vec![Characteristic::Hue, Characteristic::Saturation]);
/// assert!(state.hue().is_some());
/// ```
pub fn apply_user_write(
    state: &mut AccessoryState,
    change: &StateChange,
    caps: &Capabilities,
) -> Option<UserWrite> {
    let mut write = UserWrite::default();
    match change {
        StateChange::Power(power) => state.set_power(*power),
        StateChange::Brightness(value) if caps.brightness => state.set_brightness(*value),
        StateChange::ColorTemperature(ct) if caps.color_temperature => {
            let ct = caps.clamp_mired(i64::from(ct.value()));
            state.set_color_temperature(ct);
            write.color_mode = Some(ColorMode::Temperature);
            if caps.has_color_shadow() {
                let (hue, saturation) = convert::mired_to_hue_sat(u32::from(ct.value()));
                state.set_hue(hue);
                state.set_saturation(saturation);
                write.shadowed = vec![Characteristic::Hue, Characteristic::Saturation];
            }
        }
        StateChange::Hue(hue) if caps.color => {
            state.set_hue(*hue);
            select_hue_saturation(state, caps, &mut write);
        }
        StateChange::Saturation(saturation) if caps.color => {
            state.set_saturation(*saturation);
            select_hue_saturation(state, caps, &mut write);
        }
        StateChange::Batch(changes) => {
            let mut applied = false;
            for change in changes {
                if let Some(inner) = apply_user_write(state, change, caps) {
                    applied = true;
                    write.color_mode = inner.color_mode.or(write.color_mode);
                    for c in inner.written {
                        if !write.written.contains(&c) {
                            write.written.push(c);
                        }
                    }
                    for c in inner.shadowed {
                        if !write.shadowed.contains(&c) {
                            write.shadowed.push(c);
                        }
                    }
                }
            }
            return applied.then_some(write);
        }
        _ => return None,
    }
    write.written.extend(change.characteristic());
    Some(write)
}

fn select_hue_saturation(state: &mut AccessoryState, caps: &Capabilities, write: &mut UserWrite) {
    write.color_mode = Some(ColorMode::HueSaturation);
    if caps.has_color_shadow() {
        state.set_color_temperature(caps.clamp_mired(i64::from(Mired::MIN)));
        write.shadowed = vec![Characteristic::ColorTemperature];
    }
}

/// A snapshot awaiting dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingIntent {
    /// Desired canonical state.
    pub snapshot: AccessoryState,
    /// Color mode of the last color write.
    pub color_mode: Option<ColorMode>,
}

/// Single coalescing slot.
///
/// Staging replaces any snapshot already waiting. The color mode of the
/// last color write outlives the slot, so a batch that failed is planned
/// with the same mode on the next cycle.
#[derive(Debug, Clone, Default)]
pub struct Coalescer {
    pending: Option<AccessoryState>,
    held: Vec<Characteristic>,
    color_mode: Option<ColorMode>,
}

impl Coalescer {
    /// Creates an empty coalescer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages the snapshot produced by `write`, replacing any pending one.
    ///
    /// Returns `true` if the slot was empty before.
    pub fn stage(&mut self, snapshot: AccessoryState, write: &UserWrite) -> bool {
        if write.color_mode.is_some() {
            self.color_mode = write.color_mode;
        }
        for c in write.touched() {
            if !self.held.contains(&c) {
                self.held.push(c);
            }
        }
        self.pending.replace(snapshot).is_none()
    }

    /// Offers a device read to the pending snapshot.
    ///
    /// Returns `false` if the read concerns a characteristic held by the
    /// pending write; the read must then not reach the canonical state.
    /// Other reads are applied to the pending snapshot so the batch does
    /// not revert them.
    pub fn absorb(&mut self, change: &StateChange) -> bool {
        let Some(pending) = self.pending.as_mut() else {
            return true;
        };
        if change
            .characteristic()
            .is_some_and(|c| self.held.contains(&c))
        {
            return false;
        }
        pending.apply(change);
        true
    }

    /// Takes the pending snapshot, leaving the slot empty.
    pub fn take(&mut self) -> Option<PendingIntent> {
        self.held.clear();
        self.pending.take().map(|snapshot| PendingIntent {
            snapshot,
            color_mode: self.color_mode,
        })
    }

    /// Returns `true` if a snapshot is waiting.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns the color mode of the last color write.
    #[must_use]
    pub const fn color_mode(&self) -> Option<ColorMode> {
        self.color_mode
    }
}

/// Ordered commands for one dispatch cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBatch {
    commands: Vec<DeviceCommand>,
    snapshot: AccessoryState,
}

impl CommandBatch {
    /// Returns the commands in dispatch order.
    #[must_use]
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    /// Returns the snapshot the batch brings the device to.
    #[must_use]
    pub fn snapshot(&self) -> &AccessoryState {
        &self.snapshot
    }

    /// Consumes the batch, returning its snapshot.
    #[must_use]
    pub fn into_snapshot(self) -> AccessoryState {
        self.snapshot
    }

    /// Returns `true` if there is nothing to send.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Returns the number of commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns the characteristics the batch writes.
    #[must_use]
    pub fn characteristics(&self) -> Vec<Characteristic> {
        let mut out = Vec::new();
        for command in &self.commands {
            let touched: &[Characteristic] = match command {
                DeviceCommand::TurnOn | DeviceCommand::TurnOff => &[Characteristic::On],
                DeviceCommand::SetBrightness(_) => &[Characteristic::Brightness],
                DeviceCommand::SetColorTemperature(_) => &[Characteristic::ColorTemperature],
                DeviceCommand::SetColor(_) => &[Characteristic::Hue, Characteristic::Saturation],
            };
            out.extend_from_slice(touched);
        }
        out
    }
}

/// Plans the commands bringing the device from `published` to the pending
/// snapshot.
///
/// Order: power, brightness, color temperature, hue/saturation. Nothing
/// follows the power command when the target is off, and the batch snapshot
/// then keeps the levels of `published`. On devices with color shadowing
/// only the control matching the color mode is sent.
///
/// # Examples
///
/// ```
/// use hearth_sync::Capabilities;
/// use hearth_sync::engine::{PendingIntent, plan_batch};
/// use hearth_sync::state::AccessoryState;
/// use hearth_sync::transport::DeviceCommand;
/// use hearth_sync::types::{Brightness, PowerState};
///
/// let caps = Capabilities::dimmable_light();
/// let mut target = AccessoryState::new();
/// target.set_power(PowerState::On);
/// target.set_brightness(Brightness::new(30).unwrap());
///
/// let intent = PendingIntent { snapshot: target, color_mode: None };
/// let batch = plan_batch(&intent, &AccessoryState::new(), &caps);
/// assert_eq!(
///     batch.commands(),
///     &[DeviceCommand::TurnOn, DeviceCommand::SetBrightness(Brightness::new(30).unwrap())]
/// );
/// ```
#[must_use]
pub fn plan_batch(
    intent: &PendingIntent,
    published: &AccessoryState,
    caps: &Capabilities,
) -> CommandBatch {
    let target = &intent.snapshot;
    let mut commands = Vec::new();

    if target.power() != published.power() {
        commands.push(match target.power() {
            PowerState::On => DeviceCommand::TurnOn,
            PowerState::Off => DeviceCommand::TurnOff,
        });
    }

    if target.power().is_on() {
        if caps.brightness
            && let Some(brightness) = target.brightness()
            && published.brightness() != Some(brightness)
        {
            commands.push(DeviceCommand::SetBrightness(
                caps.round_brightness(brightness),
            ));
        }

        let send_temperature =
            !caps.has_color_shadow() || intent.color_mode == Some(ColorMode::Temperature);
        if caps.color_temperature
            && send_temperature
            && let Some(ct) = target.color_temperature()
            && published.color_temperature() != Some(ct)
        {
            commands.push(DeviceCommand::SetColorTemperature(caps.device_kelvin(ct)));
        }

        let send_color =
            !caps.has_color_shadow() || intent.color_mode == Some(ColorMode::HueSaturation);
        if caps.color
            && send_color
            && let (Some(hue), Some(saturation)) = (target.hue(), target.saturation())
            && (published.hue() != Some(hue) || published.saturation() != Some(saturation))
        {
            commands.push(DeviceCommand::SetColor(RgbColor::from_hue_sat(
                hue, saturation,
            )));
        }
    }

    let mut snapshot = published.clone();
    snapshot.set_power(target.power());
    if target.power().is_on() {
        if let Some(brightness) = target.brightness() {
            snapshot.set_brightness(brightness);
        }
        if let Some(ct) = target.color_temperature() {
            snapshot.set_color_temperature(ct);
        }
        if let Some(hue) = target.hue() {
            snapshot.set_hue(hue);
        }
        if let Some(saturation) = target.saturation() {
            snapshot.set_saturation(saturation);
        }
    }

    CommandBatch { commands, snapshot }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Brightness, Hue, Saturation};

    fn on_state() -> AccessoryState {
        let mut state = AccessoryState::new();
        state.set_power(PowerState::On);
        state
    }

    fn intent(snapshot: AccessoryState, color_mode: Option<ColorMode>) -> PendingIntent {
        PendingIntent {
            snapshot,
            color_mode,
        }
    }

    #[test]
    fn color_temperature_write_shadows_hue_saturation() {
        let caps = Capabilities::color_bulb();
        let mut state = on_state();
        let write = apply_user_write(
            &mut state,
            &StateChange::ColorTemperature(Mired::new(300).unwrap()),
            &caps,
        )
        .unwrap();

        let (hue, sat) = convert::mired_to_hue_sat(300);
        assert_eq!(write.color_mode, Some(ColorMode::Temperature));
        assert_eq!(state.hue(), Some(hue));
        assert_eq!(state.saturation(), Some(sat));
    }

    #[test]
    fn hue_write_forces_coolest_temperature() {
        let caps = Capabilities::color_bulb();
        let mut state = on_state();
        state.set_color_temperature(Mired::new(400).unwrap());

        let write =
            apply_user_write(&mut state, &StateChange::Hue(Hue::normalized(200)), &caps).unwrap();

        assert_eq!(write.color_mode, Some(ColorMode::HueSaturation));
        assert_eq!(write.shadowed, vec![Characteristic::ColorTemperature]);
        assert_eq!(state.color_temperature(), Some(Mired::COOLEST));
    }

    #[test]
    fn no_shadow_without_both_controls() {
        let caps = Capabilities::white_bulb();
        let mut state = on_state();
        let write = apply_user_write(
            &mut state,
            &StateChange::ColorTemperature(Mired::new(300).unwrap()),
            &caps,
        )
        .unwrap();
        assert!(write.shadowed.is_empty());
        assert!(state.hue().is_none());

        // White bulb has no color control
        assert!(
            apply_user_write(&mut state, &StateChange::Hue(Hue::normalized(10)), &caps).is_none()
        );
    }

    #[test]
    fn temperature_write_is_clamped_to_device_range() {
        let caps = Capabilities::white_bulb();
        let mut state = on_state();
        apply_user_write(
            &mut state,
            &StateChange::ColorTemperature(Mired::WARMEST),
            &caps,
        );
        let ct = state.color_temperature().unwrap();
        assert!(ct.value() <= caps.mired_range.max());
    }

    #[test]
    fn batch_write_uses_last_color_mode() {
        let caps = Capabilities::color_bulb();
        let mut state = on_state();
        let write = apply_user_write(
            &mut state,
            &StateChange::batch(vec![
                StateChange::Hue(Hue::normalized(30)),
                StateChange::ColorTemperature(Mired::new(250).unwrap()),
            ]),
            &caps,
        )
        .unwrap();
        assert_eq!(write.color_mode, Some(ColorMode::Temperature));
        assert_eq!(state.color_temperature(), Some(Mired::new(250).unwrap()));
        assert_eq!(write.shadowed.len(), 3);
    }

    #[test]
    fn stage_replaces_pending_snapshot() {
        let mut coalescer = Coalescer::new();
        let mut first = on_state();
        first.set_brightness(Brightness::new(10).unwrap());
        let mut second = on_state();
        second.set_brightness(Brightness::new(20).unwrap());

        let temperature = UserWrite {
            color_mode: Some(ColorMode::Temperature),
            ..UserWrite::default()
        };
        assert!(coalescer.stage(first, &UserWrite::default()));
        assert!(!coalescer.stage(second.clone(), &temperature));

        let intent = coalescer.take().unwrap();
        assert_eq!(intent.snapshot, second);
        assert!(!coalescer.is_pending());
        assert!(coalescer.take().is_none());

        // Color mode survives the slot
        assert_eq!(coalescer.color_mode(), Some(ColorMode::Temperature));
    }

    #[test]
    fn turn_on_and_dim() {
        let caps = Capabilities::dimmable_light();
        let mut published = AccessoryState::new();
        published.set_brightness(Brightness::new(100).unwrap());

        let mut target = on_state();
        target.set_brightness(Brightness::new(30).unwrap());

        let batch = plan_batch(&intent(target, None), &published, &caps);
        assert_eq!(
            batch.commands(),
            &[
                DeviceCommand::TurnOn,
                DeviceCommand::SetBrightness(Brightness::new(30).unwrap())
            ]
        );
        assert_eq!(
            batch.characteristics(),
            vec![Characteristic::On, Characteristic::Brightness]
        );
    }

    #[test]
    fn turn_off_skips_remaining_commands() {
        let caps = Capabilities::color_bulb();
        let published = on_state();
        let mut target = AccessoryState::new();
        target.set_brightness(Brightness::new(5).unwrap());
        target.set_hue(Hue::normalized(90));
        target.set_saturation(Saturation::MAX);

        let batch = plan_batch(
            &intent(target, Some(ColorMode::HueSaturation)),
            &published,
            &caps,
        );
        assert_eq!(batch.commands(), &[DeviceCommand::TurnOff]);
        // Levels that were not sent stay at the device baseline
        assert_eq!(batch.snapshot().brightness(), None);
        assert!(!batch.snapshot().power().is_on());
    }

    #[test]
    fn temperature_mode_sends_only_temperature() {
        let caps = Capabilities::color_bulb();
        let published = on_state();
        let mut target = on_state();
        apply_user_write(
            &mut target,
            &StateChange::ColorTemperature(Mired::new(300).unwrap()),
            &caps,
        );

        let batch = plan_batch(
            &intent(target, Some(ColorMode::Temperature)),
            &published,
            &caps,
        );
        assert_eq!(batch.commands(), &[DeviceCommand::SetColorTemperature(3333)]);
    }

    #[test]
    fn hue_saturation_mode_sends_only_color() {
        let caps = Capabilities::color_bulb();
        let mut published = on_state();
        published.set_color_temperature(Mired::new(300).unwrap());
        let mut target = published.clone();
        apply_user_write(&mut target, &StateChange::Hue(Hue::normalized(0)), &caps);
        apply_user_write(
            &mut target,
            &StateChange::Saturation(Saturation::MAX),
            &caps,
        );

        let batch = plan_batch(
            &intent(target, Some(ColorMode::HueSaturation)),
            &published,
            &caps,
        );
        assert_eq!(
            batch.commands(),
            &[DeviceCommand::SetColor(RgbColor::new(255, 0, 0))]
        );
    }

    #[test]
    fn brightness_is_rounded_to_step() {
        let caps = crate::CapabilitiesBuilder::new()
            .with_brightness()
            .with_brightness_step(10)
            .build();
        let mut target = on_state();
        target.set_brightness(Brightness::new(34).unwrap());

        let batch = plan_batch(&intent(target, None), &on_state(), &caps);
        assert_eq!(
            batch.commands(),
            &[DeviceCommand::SetBrightness(Brightness::new(30).unwrap())]
        );
    }

    #[test]
    fn unchanged_snapshot_plans_nothing() {
        let caps = Capabilities::color_bulb();
        let state = on_state();
        let batch = plan_batch(&intent(state.clone(), None), &state, &caps);
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
    }

    #[test]
    fn write_records_written_and_shadowed() {
        let caps = Capabilities::color_bulb();
        let mut state = on_state();
        let write = apply_user_write(
            &mut state,
            &StateChange::batch(vec![
                StateChange::Brightness(Brightness::new(30).unwrap()),
                StateChange::ColorTemperature(Mired::new(300).unwrap()),
            ]),
            &caps,
        )
        .unwrap();

        assert_eq!(
            write.written,
            vec![Characteristic::Brightness, Characteristic::ColorTemperature]
        );
        assert_eq!(write.touched().count(), 4);
    }

    #[test]
    fn held_characteristics_reject_reads() {
        let caps = Capabilities::dimmable_light();
        let mut coalescer = Coalescer::new();
        let mut snapshot = on_state();
        let write = apply_user_write(
            &mut snapshot,
            &StateChange::Brightness(Brightness::new(30).unwrap()),
            &caps,
        )
        .unwrap();
        coalescer.stage(snapshot, &write);

        assert!(!coalescer.absorb(&StateChange::Brightness(Brightness::MAX)));
        assert!(coalescer.absorb(&StateChange::power_off()));

        let intent = coalescer.take().unwrap();
        assert_eq!(intent.snapshot.brightness(), Some(Brightness::new(30).unwrap()));
        assert!(!intent.snapshot.power().is_on());

        // Nothing is held once the slot is empty
        assert!(coalescer.absorb(&StateChange::Brightness(Brightness::MAX)));
    }
}
