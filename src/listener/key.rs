// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Listener identity.

use std::fmt;

use crate::types::{BleDevice, GattCharacteristic, GattService};

/// Identity of one monitored (device, service, characteristic) triple.
///
/// The three parts are kept separate, so `("AB", "C", ..)` and
/// `("A", "BC", ..)` never collide.
///
/// # Examples
///
/// ```
/// use orion_ble::listener::ListenerKey;
///
/// let key = ListenerKey::new("B0B1139AF459", "180d", "2a37");
/// assert_eq!(key.to_string(), "B0B1139AF459/180d/2a37");
/// assert_ne!(ListenerKey::new("AB", "C", "x"), ListenerKey::new("A", "BC", "x"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListenerKey {
    address: String,
    service_uuid: String,
    characteristic_uuid: String,
}

impl ListenerKey {
    /// Creates a key from raw identifiers.
    #[must_use]
    pub fn new(
        address: impl Into<String>,
        service_uuid: impl Into<String>,
        characteristic_uuid: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            service_uuid: service_uuid.into(),
            characteristic_uuid: characteristic_uuid.into(),
        }
    }

    /// Creates a key for a discovered characteristic.
    #[must_use]
    pub fn for_characteristic(
        device: &BleDevice,
        service: &GattService,
        characteristic: &GattCharacteristic,
    ) -> Self {
        Self::new(device.address(), service.uuid(), characteristic.uuid())
    }

    /// Returns the device address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the service UUID.
    #[must_use]
    pub fn service_uuid(&self) -> &str {
        &self.service_uuid
    }

    /// Returns the characteristic UUID.
    #[must_use]
    pub fn characteristic_uuid(&self) -> &str {
        &self.characteristic_uuid
    }
}

impl fmt::Display for ListenerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.address, self.service_uuid, self.characteristic_uuid
        )
    }
}
