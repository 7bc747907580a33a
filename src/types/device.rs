// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! BLE device types.

use std::fmt;

/// A Bluetooth Low Energy device known to the server.
///
/// The address uniquely identifies a device within a discovery session and is
/// the only field the server needs to address it.
///
/// # Examples
///
/// ```
/// use orion_ble::types::BleDevice;
///
/// let device = BleDevice::new("Heart Rate Strap", "B0B1139AF459", false);
/// assert_eq!(device.to_string(), "Heart Rate Strap (B0B1139AF459) - Not Paired");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BleDevice {
    name: String,
    address: String,
    paired: bool,
}

impl BleDevice {
    /// Creates a device from known values.
    #[must_use]
    pub fn new(name: impl Into<String>, address: impl Into<String>, paired: bool) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            paired,
        }
    }

    /// Returns the advertised name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the hardware address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns whether the device is paired with the host.
    #[must_use]
    pub fn is_paired(&self) -> bool {
        self.paired
    }
}

impl fmt::Display for BleDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let paired = if self.paired { "Paired" } else { "Not Paired" };
        write!(f, "{} ({}) - {paired}", self.name, self.address)
    }
}

/// Filter applied by the server during device discovery.
///
/// # Examples
///
/// ```
/// use orion_ble::types::DeviceFilter;
///
/// let filter = DeviceFilter::builder().name_prefix("CODE").build();
/// assert_eq!(filter.to_query(), vec![("namePrefix", "CODE")]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    name: Option<String>,
    name_prefix: Option<String>,
}

impl DeviceFilter {
    /// Creates a filter directly.
    #[must_use]
    pub fn new(name: Option<String>, name_prefix: Option<String>) -> Self {
        Self { name, name_prefix }
    }

    /// Returns a builder for a filter.
    #[must_use]
    pub fn builder() -> DeviceFilterBuilder {
        DeviceFilterBuilder::default()
    }

    /// Returns the exact name to match.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the name prefix to match.
    #[must_use]
    pub fn name_prefix(&self) -> Option<&str> {
        self.name_prefix.as_deref()
    }

    /// Converts the filter into query parameters, omitting unset fields.
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, &str)> {
        let mut params = Vec::with_capacity(2);
        if let Some(name) = &self.name {
            params.push(("name", name.as_str()));
        }
        if let Some(prefix) = &self.name_prefix {
            params.push(("namePrefix", prefix.as_str()));
        }
        params
    }
}

/// Builder for [`DeviceFilter`].
#[derive(Debug, Default)]
pub struct DeviceFilterBuilder {
    name: Option<String>,
    name_prefix: Option<String>,
}

impl DeviceFilterBuilder {
    /// Matches devices with exactly this name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Matches devices whose name starts with this prefix.
    #[must_use]
    pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    /// Builds the filter.
    #[must_use]
    pub fn build(self) -> DeviceFilter {
        DeviceFilter {
            name: self.name,
            name_prefix: self.name_prefix,
        }
    }
}
