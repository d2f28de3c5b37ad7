// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State reconciliation and command dispatch.
//!
//! Each [`Accessory`] keeps one canonical state fed from three directions:
//!
//! ```text
//!   refresh scheduler ──┐
//!   push / broadcast ───┼─► Reconciler ──► CharacteristicSink (host)
//!                       │        ▲
//!   host writes ─► Coalescer ────┘
//!                       │
//!                       └─► select_transport ─► RetryController ─► device
//! ```
//!
//! - [`Reconciler`] merges partial state, diffs canonical state against what
//!   was last published, and produces host updates
//! - [`Coalescer`] and [`plan_batch`] collapse debounced host writes into one
//!   ordered [`CommandBatch`]
//! - [`RetryController`] retries local operations and falls back to the
//!   cloud API once
//!
//! Refreshes, ingestion and dispatch are mutually exclusive per accessory.
//! A scheduled refresh that finds a cycle in progress is skipped; dispatch
//! waits for its turn, and ingestion also waits for a pending host write to
//! be sent. A read that still lands during a pending write, such as an
//! explicit refresh already in flight, cannot overwrite the characteristics
//! the host wrote.

mod accessory;
mod coalescer;
mod reconciler;
mod retry;
mod scheduler;

pub use accessory::Accessory;
pub use coalescer::{
    Coalescer, ColorMode, CommandBatch, PendingIntent, UserWrite, apply_user_write, plan_batch,
};
pub use reconciler::Reconciler;
pub use retry::RetryController;
