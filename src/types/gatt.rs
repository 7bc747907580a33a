// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GATT services, characteristics and notifications.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// A GATT service exposed by a device.
///
/// # Examples
///
/// ```
/// use orion_ble::types::GattService;
///
/// let service = GattService::new("14839ac4-7d7e-415c-9a42-167340cf2339", true);
/// assert_eq!(service.to_string(), "14839ac4-7d7e-415c-9a42-167340cf2339 - Primary");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GattService {
    uuid: String,
    is_primary: bool,
}

impl GattService {
    /// Creates a service from known values.
    #[must_use]
    pub fn new(uuid: impl Into<String>, is_primary: bool) -> Self {
        Self {
            uuid: uuid.into(),
            is_primary,
        }
    }

    /// Returns the service UUID.
    #[must_use]
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Returns whether this is a primary service.
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.is_primary
    }
}

impl fmt::Display for GattService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_primary { "Primary" } else { "Secondary" };
        write!(f, "{} - {kind}", self.uuid)
    }
}

/// Capability flag declared by a characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacteristicProperty {
    /// Value can be read.
    Read,
    /// Value can be written without acknowledgement.
    WriteWithoutResponse,
    /// Value can be written with acknowledgement.
    Write,
    /// Value changes are pushed as notifications.
    Notify,
    /// Value changes are pushed as acknowledged indications.
    Indicate,
}

impl CharacteristicProperty {
    /// Returns the spelling used by the server.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "Read",
            Self::WriteWithoutResponse => "WriteWithoutResponse",
            Self::Write => "Write",
            Self::Notify => "Notify",
            Self::Indicate => "Indicate",
        }
    }
}

impl fmt::Display for CharacteristicProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CharacteristicProperty {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Read" => Ok(Self::Read),
            "WriteWithoutResponse" => Ok(Self::WriteWithoutResponse),
            "Write" => Ok(Self::Write),
            "Notify" => Ok(Self::Notify),
            "Indicate" => Ok(Self::Indicate),
            other => Err(ParseError::InvalidValue {
                field: "Properties".to_string(),
                message: format!("unknown property {other}"),
            }),
        }
    }
}

/// A GATT characteristic within a service.
///
/// Properties keep the order in which the server listed them, without
/// duplicates.
///
/// # Examples
///
/// ```
/// use orion_ble::types::{CharacteristicProperty, GattCharacteristic};
///
/// let characteristic = GattCharacteristic::new(
///     "0734594a-a8e7-4b1a-a6b1-cd5243059a57",
///     "",
///     [CharacteristicProperty::Notify],
/// );
/// assert!(characteristic.supports(CharacteristicProperty::Notify));
/// assert!(!characteristic.supports(CharacteristicProperty::Write));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GattCharacteristic {
    uuid: String,
    description: String,
    properties: Vec<CharacteristicProperty>,
}

impl GattCharacteristic {
    /// Creates a characteristic from known values.
    #[must_use]
    pub fn new(
        uuid: impl Into<String>,
        description: impl Into<String>,
        properties: impl IntoIterator<Item = CharacteristicProperty>,
    ) -> Self {
        let mut unique = Vec::new();
        for property in properties {
            if !unique.contains(&property) {
                unique.push(property);
            }
        }
        Self {
            uuid: uuid.into(),
            description: description.into(),
            properties: unique,
        }
    }

    /// Returns the characteristic UUID.
    #[must_use]
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Returns the human-readable description, possibly empty.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the declared properties.
    #[must_use]
    pub fn properties(&self) -> &[CharacteristicProperty] {
        &self.properties
    }

    /// Returns true if the characteristic declares `property`.
    #[must_use]
    pub fn supports(&self, property: CharacteristicProperty) -> bool {
        self.properties.contains(&property)
    }
}

impl fmt::Display for GattCharacteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let properties: Vec<&str> = self.properties.iter().map(|p| p.as_str()).collect();
        write!(
            f,
            "{} - {} - [{}]",
            self.uuid,
            self.description,
            properties.join(", ")
        )
    }
}

/// A value pushed by a characteristic and buffered by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GattNotification {
    service_uuid: String,
    characteristic_uuid: String,
    value: String,
}

impl GattNotification {
    /// Creates a notification from known values.
    #[must_use]
    pub fn new(
        service_uuid: impl Into<String>,
        characteristic_uuid: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            service_uuid: service_uuid.into(),
            characteristic_uuid: characteristic_uuid.into(),
            value: value.into(),
        }
    }

    /// Returns the UUID of the originating service.
    #[must_use]
    pub fn service_uuid(&self) -> &str {
        &self.service_uuid
    }

    /// Returns the UUID of the originating characteristic.
    #[must_use]
    pub fn characteristic_uuid(&self) -> &str {
        &self.characteristic_uuid
    }

    /// Returns the opaque payload as sent by the server.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for GattNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Notification: {} - {} - {}",
            self.service_uuid, self.characteristic_uuid, self.value
        )
    }
}
