// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-accessory engine.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::config::{DeviceConfig, TransportDescriptor};
use crate::error::{Error, ParseError};
use crate::event::{AccessoryId, CharacteristicSink};
use crate::ingest::{StatusPayload, normalize_device_id};
use crate::state::{AccessoryState, Characteristic, CharacteristicUpdate, StateChange};
use crate::transport::{Transports, select_transport};
use crate::types::{Brightness, Hue, Mired, PowerState, Saturation};

use super::coalescer::{Coalescer, CommandBatch, apply_user_write, plan_batch};
use super::{Reconciler, RetryController, scheduler};

/// Delay between a completed dispatch and its confirming refresh.
const FOLLOW_UP_REFRESH_DELAY: Duration = Duration::from_secs(15);

/// Cycle gate: held for the whole of a refresh, an ingestion or a dispatch
/// (including its debounce window).
type CycleGate = tokio::sync::Mutex<()>;

struct EngineState {
    reconciler: Reconciler,
    coalescer: Coalescer,
}

/// Reconciliation and dispatch engine for one accessory.
///
/// An accessory owns three background tasks: the dispatch worker, which
/// debounces host writes and sends them as one batch, the refresh
/// scheduler, and the inbox worker ingesting delivered payloads in order.
/// All of them stop when the accessory is dropped.
///
/// None of the entry points return errors. Failures are logged and shown
/// to the host as error indicators on the affected characteristics.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use hearth_sync::Capabilities;
/// use hearth_sync::config::{CloudConfig, DeviceConfig};
/// use hearth_sync::engine::Accessory;
/// use hearth_sync::event::EventBus;
/// use hearth_sync::transport::{CloudClient, Transports};
/// use hearth_sync::types::Brightness;
///
/// # async fn example() -> hearth_sync::Result<()> {
/// let bus = EventBus::new();
/// let cloud = CloudClient::new(&CloudConfig::new("token"))?;
/// let config = DeviceConfig::remote("C0FFEE000001")
///     .with_capabilities(Capabilities::dimmable_light());
///
/// let lamp = Accessory::new(
///     config,
///     Transports::new().with_remote(Arc::new(cloud)),
///     Arc::new(bus.clone()),
/// );
/// lamp.refresh().await;
/// lamp.set_power(true);
/// lamp.set_brightness(Brightness::new(30)?);
/// # Ok(())
/// # }
/// ```
pub struct Accessory {
    id: AccessoryId,
    config: DeviceConfig,
    descriptor: TransportDescriptor,
    controller: RetryController,
    sink: Arc<dyn CharacteristicSink>,
    state: Mutex<EngineState>,
    update_in_progress: watch::Sender<bool>,
    inbox: mpsc::UnboundedSender<StatusPayload>,
    gate: Arc<CycleGate>,
    dispatch_signal: Arc<Notify>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Accessory {
    /// Creates an accessory and starts its background tasks.
    ///
    /// The canonical state starts from [`DeviceConfig::initial_state`]. No
    /// refresh is made until the first scheduler tick; call
    /// [`refresh`](Self::refresh) to load the device state right away.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn new(
        config: DeviceConfig,
        transports: Transports,
        sink: Arc<dyn CharacteristicSink>,
    ) -> Arc<Self> {
        Self::with_id(AccessoryId::new(), config, transports, sink)
    }

    /// Creates an accessory with a given identifier.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn with_id(
        id: AccessoryId,
        config: DeviceConfig,
        transports: Transports,
        sink: Arc<dyn CharacteristicSink>,
    ) -> Arc<Self> {
        let descriptor =
            config.descriptor(transports.remote.is_some(), transports.local.is_some());
        let state = EngineState {
            reconciler: Reconciler::new(config.initial_state()),
            coalescer: Coalescer::new(),
        };
        let (update_in_progress, _) = watch::channel(false);
        let (inbox, inbox_rx) = mpsc::unbounded_channel();

        let accessory = Arc::new(Self {
            id,
            descriptor,
            controller: RetryController::new(&config, transports),
            sink,
            state: Mutex::new(state),
            update_in_progress,
            inbox,
            gate: Arc::new(CycleGate::new(())),
            dispatch_signal: Arc::new(Notify::new()),
            tasks: Mutex::new(Vec::new()),
            config,
        });

        let worker = spawn_dispatch_worker(
            Arc::downgrade(&accessory),
            Arc::clone(&accessory.gate),
            Arc::clone(&accessory.dispatch_signal),
            accessory.config.push_rate,
        );
        let scheduler = scheduler::spawn_refresh_scheduler(
            Arc::downgrade(&accessory),
            accessory.config.refresh_rate,
        );
        let ingester = spawn_inbox_worker(Arc::downgrade(&accessory), inbox_rx);
        accessory.tasks.lock().extend([worker, scheduler, ingester]);

        tracing::debug!(
            accessory_id = %id,
            device = %accessory.config.id,
            mode = ?accessory.descriptor.mode,
            "Accessory started"
        );
        accessory
    }

    // ========== Accessors ==========

    /// Returns the accessory identifier.
    #[must_use]
    pub const fn id(&self) -> AccessoryId {
        self.id
    }

    /// Returns the device configuration.
    #[must_use]
    pub const fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.config.display_name()
    }

    /// Returns the normalized device identifier used for push routing.
    #[must_use]
    pub fn device_id(&self) -> String {
        normalize_device_id(&self.config.id)
    }

    /// Returns the transport descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &TransportDescriptor {
        &self.descriptor
    }

    /// Returns a snapshot of the canonical state.
    #[must_use]
    pub fn state(&self) -> AccessoryState {
        self.state.lock().reconciler.canonical().clone()
    }

    /// Returns a snapshot of the cached-published state.
    #[must_use]
    pub fn published_state(&self) -> AccessoryState {
        self.state.lock().reconciler.published().clone()
    }

    /// Returns `true` while a host write waits for, or is in, dispatch.
    #[must_use]
    pub fn is_update_in_progress(&self) -> bool {
        *self.update_in_progress.borrow()
    }

    // ========== Host Writes ==========

    /// Applies a host write and schedules its dispatch.
    ///
    /// The canonical state is updated right away, derived color values are
    /// published, and refreshes are held off until the write has been
    /// dispatched. Writes within one debounce window are sent as one batch.
    pub fn set(&self, change: StateChange) {
        let shadow_updates = {
            let mut state = self.state.lock();
            let EngineState {
                reconciler,
                coalescer,
            } = &mut *state;

            let Some(write) = apply_user_write(
                reconciler.canonical_mut(),
                &change,
                &self.config.capabilities,
            ) else {
                tracing::debug!(accessory_id = %self.id, ?change, "Ignoring unsupported write");
                return;
            };

            coalescer.stage(reconciler.canonical().clone(), &write);
            self.update_in_progress.send_replace(true);
            reconciler.record_write(&write.shadowed)
        };

        tracing::debug!(accessory_id = %self.id, ?change, "Write staged");
        self.publish(&shadow_updates);
        self.dispatch_signal.notify_one();
    }

    /// Switches the accessory on or off.
    pub fn set_power(&self, on: bool) {
        self.set(StateChange::Power(PowerState::from(on)));
    }

    /// Sets the brightness.
    pub fn set_brightness(&self, brightness: Brightness) {
        self.set(StateChange::Brightness(brightness));
    }

    /// Sets the hue.
    pub fn set_hue(&self, hue: Hue) {
        self.set(StateChange::Hue(hue));
    }

    /// Sets the saturation.
    pub fn set_saturation(&self, saturation: Saturation) {
        self.set(StateChange::Saturation(saturation));
    }

    /// Sets the color temperature.
    pub fn set_color_temperature(&self, color_temperature: Mired) {
        self.set(StateChange::ColorTemperature(color_temperature));
    }

    // ========== Status ==========

    /// Fetches the device status and publishes what changed.
    ///
    /// Waits for a running cycle to finish first. Skipped if a host write is
    /// still waiting for dispatch.
    pub async fn refresh(&self) {
        let _cycle = self.gate.lock().await;
        self.refresh_locked().await;
    }

    /// Refreshes unless a cycle is in progress.
    ///
    /// Returns `false` if the refresh was skipped.
    pub async fn try_refresh(&self) -> bool {
        if self.is_update_in_progress() {
            return false;
        }
        let Ok(_cycle) = self.gate.try_lock() else {
            return false;
        };
        self.refresh_locked().await
    }

    /// Merges a status payload that arrived on its own, such as a push
    /// notification or a broadcast advertisement.
    ///
    /// Waits until no host write is pending and no cycle is running;
    /// payloads are never dropped.
    pub async fn ingest(&self, payload: StatusPayload) {
        let mut writes = self.update_in_progress.subscribe();
        loop {
            if writes.wait_for(|pending| !pending).await.is_err() {
                return;
            }
            let _cycle = self.gate.lock().await;
            if !self.is_update_in_progress() {
                self.merge_payload(&payload);
                return;
            }
        }
    }

    /// Queues a status payload for [`ingest`](Self::ingest) without waiting.
    ///
    /// Queued payloads are merged one at a time, in delivery order.
    pub fn deliver(&self, payload: StatusPayload) {
        if self.inbox.send(payload).is_err() {
            tracing::debug!(accessory_id = %self.id, "Inbox closed, dropping payload");
        }
    }

    async fn refresh_locked(&self) -> bool {
        if self.is_update_in_progress() {
            tracing::debug!(accessory_id = %self.id, "Write pending, skipping refresh");
            return false;
        }

        let route = match select_transport(&self.descriptor) {
            Ok(route) => route,
            Err(e) => {
                self.report_failure(&e, None);
                return true;
            }
        };

        tracing::debug!(accessory_id = %self.id, ?route, "Refreshing status");
        match self.controller.fetch_status(route).await {
            Ok(payload) => self.merge_payload(&payload),
            Err(e) => self.report_failure(&e, None),
        }
        true
    }

    fn merge_payload(&self, payload: &StatusPayload) {
        match payload.to_state_changes(&self.config) {
            Ok(changes) => {
                let (updates, held) = {
                    let mut state = self.state.lock();
                    let EngineState {
                        reconciler,
                        coalescer,
                    } = &mut *state;
                    let mut held = 0_usize;
                    let updates = reconciler.merge_with(&changes, |change| {
                        let accepted = coalescer.absorb(change);
                        held += usize::from(!accepted);
                        accepted
                    });
                    (updates, held)
                };
                tracing::debug!(
                    accessory_id = %self.id,
                    channel = payload.channel(),
                    changes = changes.len(),
                    held,
                    updates = updates.len(),
                    "Status merged"
                );
                self.publish(&updates);
            }
            Err(ParseError::UnexpectedModel { expected, actual }) => {
                tracing::trace!(
                    accessory_id = %self.id,
                    %expected,
                    %actual,
                    "Ignoring advertisement for another device"
                );
            }
            Err(e) => self.report_failure(&Error::MalformedPayload(e), None),
        }
    }

    // ========== Dispatch ==========

    /// Sends the pending write. The caller holds the cycle gate.
    async fn dispatch_locked(&self) {
        let batch = {
            let mut state = self.state.lock();
            let EngineState {
                reconciler,
                coalescer,
                ..
            } = &mut *state;
            coalescer
                .take()
                .map(|intent| plan_batch(&intent, reconciler.published(), &self.config.capabilities))
        };

        if let Some(batch) = batch {
            self.send_batch(batch).await;
        }

        let state = self.state.lock();
        if !state.coalescer.is_pending() {
            self.update_in_progress.send_replace(false);
        }
    }

    async fn send_batch(&self, batch: CommandBatch) {
        if batch.is_empty() {
            let updates = self.state.lock().reconciler.commit(batch.into_snapshot());
            self.publish(&updates);
            return;
        }

        let route = match select_transport(&self.descriptor) {
            Ok(route) => route,
            Err(e) => {
                self.report_failure(&e, Some(&batch.characteristics()));
                return;
            }
        };

        tracing::debug!(
            accessory_id = %self.id,
            ?route,
            commands = batch.len(),
            "Dispatching batch"
        );
        if let Err(e) = self.controller.execute_batch(route, batch.commands()).await {
            self.report_failure(&e, Some(&batch.characteristics()));
            return;
        }

        let updates = self.state.lock().reconciler.commit(batch.into_snapshot());
        self.publish(&updates);
    }

    // ========== Publishing ==========

    /// Turns a failed cycle into host-visible state.
    ///
    /// `affected` defaults to every known characteristic.
    fn report_failure(&self, error: &Error, affected: Option<&[Characteristic]>) {
        let updates = {
            let mut state = self.state.lock();
            if matches!(error, Error::TransportUnavailable) && self.descriptor.offline {
                tracing::debug!(accessory_id = %self.id, "Device offline, reporting power off");
                state.reconciler.force_off()
            } else if !error.marks_not_responding() {
                tracing::info!(accessory_id = %self.id, %error, "Cycle skipped");
                return;
            } else {
                tracing::warn!(accessory_id = %self.id, %error, "Cycle failed");
                let affected = affected.map_or_else(
                    || state.reconciler.canonical().known_characteristics(),
                    <[Characteristic]>::to_vec,
                );
                state.reconciler.fail(&affected)
            }
        };
        self.publish(&updates);
    }

    fn publish(&self, updates: &[CharacteristicUpdate]) {
        if !updates.is_empty() {
            self.sink.publish(self.id, updates);
        }
    }
}

impl fmt::Debug for Accessory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessory")
            .field("id", &self.id)
            .field("device", &self.config.id)
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

impl Drop for Accessory {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}

/// Spawns the task that debounces host writes and dispatches them.
///
/// The worker takes the cycle gate as soon as a write arrives and keeps it
/// until the batch has been sent, so scheduled refreshes skip and ingestion
/// waits. The window restarts with every write. A refresh follows each
/// dispatch unless another write comes first.
fn spawn_dispatch_worker(
    accessory: Weak<Accessory>,
    gate: Arc<CycleGate>,
    signal: Arc<Notify>,
    push_rate: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut follow_up: Option<Instant> = None;

        loop {
            if let Some(deadline) = follow_up.take() {
                tokio::select! {
                    () = time::sleep_until(deadline) => {
                        let Some(accessory) = accessory.upgrade() else {
                            break;
                        };
                        accessory.try_refresh().await;
                        continue;
                    }
                    () = signal.notified() => {}
                }
            } else {
                signal.notified().await;
            }

            let cycle = gate.lock().await;
            loop {
                tokio::select! {
                    () = time::sleep(push_rate) => break,
                    () = signal.notified() => {}
                }
            }

            let Some(accessory) = accessory.upgrade() else {
                break;
            };
            accessory.dispatch_locked().await;
            drop(cycle);
            drop(accessory);

            follow_up = Some(Instant::now() + FOLLOW_UP_REFRESH_DELAY);
        }

        tracing::debug!("Dispatch worker stopped");
    })
}

/// Spawns the task merging delivered payloads one at a time.
fn spawn_inbox_worker(
    accessory: Weak<Accessory>,
    mut inbox: mpsc::UnboundedReceiver<StatusPayload>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(payload) = inbox.recv().await {
            let Some(accessory) = accessory.upgrade() else {
                break;
            };
            accessory.ingest(payload).await;
        }
        tracing::debug!("Inbox worker stopped");
    })
}
