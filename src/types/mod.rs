// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for BLE devices and the GATT hierarchy.
//!
//! All types are immutable values. They are usually obtained from discovery
//! calls, but can be constructed by hand when the identifiers are already
//! known, which skips the discovery round trips.
//!
//! # Types
//!
//! - [`BleDevice`] - A discovered device (name, address, paired flag)
//! - [`DeviceFilter`] - Name/prefix filter for discovery
//! - [`GattService`] - A service on a device
//! - [`GattCharacteristic`] - A characteristic with its [`CharacteristicProperty`] flags
//! - [`GattNotification`] - A value pushed by a characteristic

mod device;
mod gatt;

pub use device::{BleDevice, DeviceFilter, DeviceFilterBuilder};
pub use gatt::{CharacteristicProperty, GattCharacteristic, GattNotification, GattService};
