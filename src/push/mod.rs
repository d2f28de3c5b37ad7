// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Push notification delivery.
//!
//! [`PushRouter`] maps device identifiers to accessories. With the `mqtt`
//! feature, [`MqttPushListener`] relays payloads from a broker topic into a
//! router.

#[cfg(feature = "mqtt")]
mod mqtt;
mod router;

#[cfg(feature = "mqtt")]
pub use mqtt::MqttPushListener;
pub use router::PushRouter;
