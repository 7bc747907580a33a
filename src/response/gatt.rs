// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GATT service, characteristic and notification decoding.

use serde::Deserialize;

use crate::error::ParseError;
use crate::types::{CharacteristicProperty, GattCharacteristic, GattNotification, GattService};

#[derive(Debug, Deserialize)]
struct ServiceRecord {
    #[serde(rename = "Uuid")]
    uuid: String,
    #[serde(rename = "IsPrimary", default, deserialize_with = "super::flexible_bool")]
    is_primary: bool,
}

#[derive(Debug, Deserialize)]
struct CharacteristicRecord {
    #[serde(rename = "Uuid")]
    uuid: String,
    #[serde(rename = "Description", default)]
    description: Option<String>,
    /// Comma-separated, e.g. `"Read, Notify"`.
    #[serde(rename = "Properties", default)]
    properties: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NotificationRecord {
    #[serde(rename = "Service", default)]
    service: Option<String>,
    #[serde(rename = "Characteristic", default)]
    characteristic: Option<String>,
    #[serde(rename = "Value", default)]
    value: serde_json::Value,
}

/// Decodes the GATT services response.
///
/// # Errors
///
/// Returns `ParseError` if the body is not an array of service objects.
pub fn parse_services(body: &str) -> Result<Vec<GattService>, ParseError> {
    let records: Vec<ServiceRecord> = serde_json::from_str(body)?;
    Ok(records
        .into_iter()
        .map(|r| GattService::new(r.uuid, r.is_primary))
        .collect())
}

/// Decodes the GATT characteristics response.
///
/// # Errors
///
/// Returns `ParseError` if the body is not an array of characteristic
/// objects, or if a property name is not recognized.
///
/// # Examples
///
/// ```
/// use orion_ble::response::parse_characteristics;
/// use orion_ble::types::CharacteristicProperty;
///
/// let json = r#"[{"Uuid": "2a37", "Description": "Heart Rate", "Properties": "Read, Notify"}]"#;
/// let characteristics = parse_characteristics(json).unwrap();
/// assert_eq!(
///     characteristics[0].properties(),
///     &[CharacteristicProperty::Read, CharacteristicProperty::Notify]
/// );
/// ```
pub fn parse_characteristics(body: &str) -> Result<Vec<GattCharacteristic>, ParseError> {
    let records: Vec<CharacteristicRecord> = serde_json::from_str(body)?;
    records
        .into_iter()
        .map(|r| {
            let properties = r
                .properties
                .as_deref()
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::parse::<CharacteristicProperty>)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(GattCharacteristic::new(
                r.uuid,
                r.description.unwrap_or_default(),
                properties,
            ))
        })
        .collect()
}

/// Decodes the notifications buffered since the previous fetch.
///
/// Malformed, empty or `null` bodies yield an empty list rather than an error;
/// the server answers that way when nothing is pending. Non-string values are
/// kept in their JSON text form.
///
/// # Examples
///
/// ```
/// use orion_ble::response::parse_notifications;
///
/// assert!(parse_notifications("").is_empty());
/// assert!(parse_notifications("oops").is_empty());
///
/// let json = r#"[{"Service": "180d", "Characteristic": "2a37", "Value": "0648"}]"#;
/// assert_eq!(parse_notifications(json)[0].value(), "0648");
/// ```
#[must_use]
pub fn parse_notifications(body: &str) -> Vec<GattNotification> {
    let records: Vec<NotificationRecord> = match serde_json::from_str(body) {
        Ok(records) => records,
        Err(e) => {
            if !body.trim().is_empty() {
                tracing::debug!(error = %e, "Discarding unreadable notification payload");
            }
            return Vec::new();
        }
    };

    records
        .into_iter()
        .map(|r| {
            let value = match r.value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            GattNotification::new(
                r.service.unwrap_or_default(),
                r.characteristic.unwrap_or_default(),
                value,
            )
        })
        .collect()
}
