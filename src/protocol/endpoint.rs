// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! REST routes exposed by the server.

use std::fmt;

/// A REST route on the `OrionBLE` server.
///
/// Identifiers embedded in the path are percent-encoded when the path is
/// rendered, so addresses or UUIDs containing reserved characters cannot
/// escape their segment.
///
/// # Examples
///
/// ```
/// use orion_ble::protocol::Endpoint;
///
/// let endpoint = Endpoint::Notifications {
///     address: "B0B1139AF459".into(),
///     service: "180d".into(),
///     characteristic: "2a37".into(),
/// };
/// assert_eq!(
///     endpoint.path(),
///     "/devices/B0B1139AF459/service/180d/characteristic/2a37/notifications"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Server liveness probe.
    Root,
    /// Nearby device discovery.
    DiscoverDevices,
    /// Connection status of a single device.
    DeviceConnection {
        /// Device address.
        address: String,
    },
    /// GATT services of a device.
    Services {
        /// Device address.
        address: String,
    },
    /// GATT characteristics of a service.
    Characteristics {
        /// Device address.
        address: String,
        /// Service UUID.
        service: String,
    },
    /// Read a characteristic value.
    Read {
        /// Device address.
        address: String,
        /// Service UUID.
        service: String,
        /// Characteristic UUID.
        characteristic: String,
    },
    /// Write a characteristic value.
    Write {
        /// Device address.
        address: String,
        /// Service UUID.
        service: String,
        /// Characteristic UUID.
        characteristic: String,
    },
    /// Ask the server to start buffering notifications.
    RegisterNotify {
        /// Device address.
        address: String,
        /// Service UUID.
        service: String,
        /// Characteristic UUID.
        characteristic: String,
    },
    /// Ask the server to stop buffering notifications.
    UnregisterNotify {
        /// Device address.
        address: String,
        /// Service UUID.
        service: String,
        /// Characteristic UUID.
        characteristic: String,
    },
    /// Drain notifications buffered since the previous fetch.
    Notifications {
        /// Device address.
        address: String,
        /// Service UUID.
        service: String,
        /// Characteristic UUID.
        characteristic: String,
    },
}

impl Endpoint {
    /// Renders the request path, starting with `/`.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Root => "/".to_string(),
            Self::DiscoverDevices => "/devices/discover".to_string(),
            Self::DeviceConnection { address } => format!("/devices/{}", enc(address)),
            Self::Services { address } => format!("/devices/{}/services", enc(address)),
            Self::Characteristics { address, service } => {
                format!("/devices/{}/service/{}", enc(address), enc(service))
            }
            Self::Read {
                address,
                service,
                characteristic,
            } => characteristic_path(address, service, characteristic, "read"),
            Self::Write {
                address,
                service,
                characteristic,
            } => characteristic_path(address, service, characteristic, "write"),
            Self::RegisterNotify {
                address,
                service,
                characteristic,
            } => characteristic_path(address, service, characteristic, "register_notify"),
            Self::UnregisterNotify {
                address,
                service,
                characteristic,
            } => characteristic_path(address, service, characteristic, "unregister_notify"),
            Self::Notifications {
                address,
                service,
                characteristic,
            } => characteristic_path(address, service, characteristic, "notifications"),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

fn enc(segment: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(segment)
}

fn characteristic_path(address: &str, service: &str, characteristic: &str, action: &str) -> String {
    format!(
        "/devices/{}/service/{}/characteristic/{}/{action}",
        enc(address),
        enc(service),
        enc(characteristic)
    )
}
