// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device discovery and connection status decoding.

use serde::Deserialize;

use crate::error::ParseError;
use crate::types::BleDevice;

/// Wire format of one discovered device.
///
/// ```json
/// {"Name": "CODE V02034E45U", "Address": "B0B1139AF459", "Paired": false}
/// ```
#[derive(Debug, Deserialize)]
struct DeviceRecord {
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "Address")]
    address: String,
    #[serde(rename = "Paired", default, deserialize_with = "super::flexible_bool")]
    paired: bool,
}

/// Wire format of the connection status endpoint.
#[derive(Debug, Deserialize)]
struct ConnectionRecord {
    #[serde(rename = "Connected", default, deserialize_with = "super::flexible_bool")]
    connected: bool,
}

/// Decodes the device discovery response.
///
/// # Errors
///
/// Returns `ParseError` if the body is not an array of device objects.
///
/// # Examples
///
/// ```
/// use orion_ble::response::parse_devices;
///
/// let json = r#"[{"Name": "Strap", "Address": "AABB", "Paired": "True"}]"#;
/// let devices = parse_devices(json).unwrap();
/// assert_eq!(devices[0].address(), "AABB");
/// assert!(devices[0].is_paired());
/// ```
pub fn parse_devices(body: &str) -> Result<Vec<BleDevice>, ParseError> {
    let records: Vec<DeviceRecord> = serde_json::from_str(body)?;
    Ok(records
        .into_iter()
        .map(|r| BleDevice::new(r.name.unwrap_or_default(), r.address, r.paired))
        .collect())
}

/// Decodes the connection status response.
///
/// A malformed body reads as "not connected".
#[must_use]
pub fn parse_connection_status(body: &str) -> bool {
    match serde_json::from_str::<ConnectionRecord>(body) {
        Ok(record) => record.connected,
        Err(e) => {
            tracing::debug!(error = %e, "Unreadable connection status, assuming disconnected");
            false
        }
    }
}
