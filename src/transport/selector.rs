// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-operation transport selection.

use crate::config::{ConnectionMode, TransportDescriptor};
use crate::error::Error;

/// Transport chosen for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Use the local link; `fallback` allows one remote attempt once local
    /// retries are exhausted.
    Local {
        /// Remote fallback is allowed.
        fallback: bool,
    },
    /// Use the cloud API.
    Remote,
}

impl Route {
    /// Returns `true` if remote fallback is allowed.
    #[must_use]
    pub const fn has_fallback(&self) -> bool {
        matches!(self, Self::Local { fallback: true })
    }
}

/// Decides which transport handles an operation.
///
/// Offline devices with no usable transport fail first. Otherwise the
/// preferred mode decides:
///
/// - `local`: the local link, if a handle was supplied
/// - `remote`: the cloud API, if enabled and credentials are present
/// - `dual`: the local link with remote fallback when the cloud is usable,
///   or the cloud API directly when no local handle was supplied
///
/// # Errors
///
/// - `TransportUnavailable` if no transport can serve the operation
/// - `CloudDisabled` for remote mode with the cloud service disabled
/// - `NoCredentials` for remote mode without credentials
///
/// # Examples
///
/// ```
/// use hearth_sync::config::DeviceConfig;
/// use hearth_sync::transport::{Route, select_transport};
///
/// let dual = DeviceConfig::dual("A1").descriptor(true, true);
/// assert_eq!(select_transport(&dual).unwrap(), Route::Local { fallback: true });
///
/// let no_local = DeviceConfig::dual("A1").descriptor(true, false);
/// assert_eq!(select_transport(&no_local).unwrap(), Route::Remote);
/// ```
pub fn select_transport(descriptor: &TransportDescriptor) -> Result<Route, Error> {
    let local_usable = descriptor.has_local_handle && descriptor.mode != ConnectionMode::Remote;
    let remote_usable = descriptor.remote_usable() && descriptor.mode != ConnectionMode::Local;

    if descriptor.offline && !local_usable && !remote_usable {
        return Err(Error::TransportUnavailable);
    }

    match descriptor.mode {
        ConnectionMode::Local if descriptor.has_local_handle => Ok(Route::Local { fallback: false }),
        ConnectionMode::Local => Err(Error::TransportUnavailable),
        ConnectionMode::Remote if !descriptor.cloud_enabled => Err(Error::CloudDisabled),
        ConnectionMode::Remote if !descriptor.has_credentials => Err(Error::NoCredentials),
        ConnectionMode::Remote => Ok(Route::Remote),
        ConnectionMode::Dual if descriptor.has_local_handle => Ok(Route::Local {
            fallback: remote_usable,
        }),
        ConnectionMode::Dual if remote_usable => Ok(Route::Remote),
        ConnectionMode::Dual => Err(Error::TransportUnavailable),
    }
}
