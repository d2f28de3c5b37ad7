// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Periodic status refresh.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::Accessory;

/// Spawns the refresh timer of one accessory.
///
/// The first tick fires one `period` after spawning. Ticks that find a
/// cycle in progress are skipped, not queued, and ticks missed while a slow
/// refresh was running are dropped. The task ends once the accessory is
/// gone.
pub(crate) fn spawn_refresh_scheduler(
    accessory: Weak<Accessory>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if period.is_zero() {
            tracing::warn!("Refresh period is zero, scheduler disabled");
            return;
        }

        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            let Some(accessory) = accessory.upgrade() else {
                break;
            };
            if !accessory.try_refresh().await {
                tracing::trace!(accessory_id = %accessory.id(), "Refresh tick skipped");
            }
        }

        tracing::debug!("Refresh scheduler stopped");
    })
}
