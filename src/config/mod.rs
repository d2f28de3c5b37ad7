// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device and platform configuration.
//!
//! Configuration is immutable once an accessory is built. It can be created
//! in code with the `with_*` builders or loaded from JSON (camelCase keys,
//! durations in seconds):
//!
//! ```
//! use hearth_sync::config::{ConnectionMode, PlatformConfig};
//!
//! let config = PlatformConfig::from_json(r#"{
//!     "cloud": { "token": "abc" },
//!     "devices": [
//!         { "id": "C0FFEE000001", "connection": "dual", "pushRate": 0.1 }
//!     ]
//! }"#).unwrap();
//!
//! assert!(config.has_credentials());
//! assert_eq!(config.devices[0].connection, ConnectionMode::Dual);
//! ```

mod device_config;
mod platform_config;
mod retry_policy;

pub use device_config::{ConnectionMode, DeviceConfig, InitialState, TransportDescriptor};
pub use platform_config::{CloudConfig, PlatformConfig, PushRelayConfig};
pub use retry_policy::RetryPolicy;

/// Serde helper storing a [`Duration`](std::time::Duration) as fractional seconds.
pub(crate) mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
