// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoding of `OrionBLE` server JSON responses.
//!
//! The server answers with arrays of `PascalCase` objects. Each decoder here
//! turns a raw body into the matching [`types`](crate::types) values.
//!
//! Discovery decoders are strict and report a [`ParseError`](crate::error::ParseError)
//! on malformed input. [`parse_notifications`] and [`parse_connection_status`]
//! are lenient: a poll that returns garbage simply yields nothing.

mod device;
mod gatt;

pub use device::{parse_connection_status, parse_devices};
pub use gatt::{parse_characteristics, parse_notifications, parse_services};

use serde::{Deserialize, Deserializer};

/// Accepts JSON booleans as well as `"true"`/`"false"` strings.
///
/// Any other value reads as `false`.
fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    })
}
