// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hearth Sync - state reconciliation and command dispatch for smart-home
//! accessories.
//!
//! Each physical device is mirrored as a set of host characteristics (on,
//! brightness, hue, saturation, color temperature). The mirror is kept
//! consistent with the device across three status channels and two
//! transports:
//!
//! - **Status ingestion**: polled cloud queries, push notifications and
//!   local broadcast advertisements merge into one canonical state
//! - **Command coalescing**: rapid host writes collapse into one minimal
//!   command batch per debounce window, with at most one cycle in flight
//! - **Transport selection**: local link preferred, cloud API as a single
//!   fallback after local retries are exhausted
//! - **Unit conversion**: mired/Kelvin/hue-saturation mapping, including
//!   hue/saturation shadowing of color temperature for adaptive lighting
//!
//! # Quick Start
//!
//! ```no_run
//! use hearth_sync::config::PlatformConfig;
//! use hearth_sync::manager::AccessoryManager;
//! use hearth_sync::types::Brightness;
//!
//! #[tokio::main]
//! async fn main() -> hearth_sync::Result<()> {
//!     let config = PlatformConfig::from_json(r#"{
//!         "cloud": { "token": "t0k3n" },
//!         "devices": [
//!             { "id": "C0FFEE000001", "capabilities": { "brightness": true } }
//!         ]
//!     }"#)?;
//!
//!     let manager = AccessoryManager::from_config(&config)?;
//!     manager.refresh_all().await;
//!
//!     let lamp = manager
//!         .find_by_device_id("C0FFEE000001")
//!         .ok_or(hearth_sync::Error::AccessoryNotFound)?;
//!     lamp.set_power(true);
//!     lamp.set_brightness(Brightness::new(30)?);
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `http` (default): [`transport::CloudClient`] on `reqwest`
//! - `mqtt` (default): [`push::MqttPushListener`] on `rumqttc`

mod capabilities;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod ingest;
pub mod manager;
pub mod push;
pub mod state;
pub mod transport;
pub mod types;

pub use capabilities::{Capabilities, CapabilitiesBuilder};
pub use engine::Accessory;
pub use error::{ConfigError, Error, ParseError, ProtocolError, Result, ValueError};
pub use event::{AccessoryEvent, AccessoryId, CharacteristicSink, EventBus};
pub use manager::AccessoryManager;
pub use state::{AccessoryState, Characteristic, CharacteristicUpdate, CharacteristicValue, StateChange};
pub use types::{Brightness, Hue, Mired, PowerState, RgbColor, Saturation};
