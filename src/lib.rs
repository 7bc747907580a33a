// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `OrionBLE` - A Rust client for Bluetooth Low Energy through the `OrionBLE` server.
//!
//! The library talks HTTP/JSON to a separately launched `OrionBLE` server,
//! which performs the actual Bluetooth work. It provides async APIs for:
//!
//! - **Discovery**: nearby devices (optionally filtered), GATT services and characteristics
//! - **Characteristic access**: read and write values
//! - **Notifications**: register interest, fetch buffered notifications, or run
//!   background listeners that push them to a callback
//!
//! # Quick Start
//!
//! ```no_run
//! use orion_ble::{OrionBle, ServerConfig};
//! use orion_ble::types::{CharacteristicProperty, DeviceFilter};
//!
//! #[tokio::main]
//! async fn main() -> orion_ble::Result<()> {
//!     let orion = OrionBle::new(ServerConfig::new().with_port(5249))?;
//!     orion.wait_for_connection(5).await?;
//!
//!     let filter = DeviceFilter::builder().name_prefix("CODE").build();
//!     for device in orion.discover_devices(Some(&filter)).await? {
//!         for service in orion.discover_services(&device).await? {
//!             for characteristic in orion.discover_characteristics(&device, &service).await? {
//!                 if characteristic.supports(CharacteristicProperty::Read) {
//!                     let value = orion
//!                         .read_characteristic(&device, &service, &characteristic)
//!                         .await?;
//!                     println!("{characteristic}: {value}");
//!                 }
//!             }
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Notification Listeners
//!
//! The server buffers notifications until they are fetched. A listener polls
//! for them at a fixed interval and calls a handler for each one; see
//! [`OrionBle::start_notification_listener`] and the [`listener`] module.
//!
//! # Logging
//!
//! The library emits [`tracing`] events and never installs a subscriber.

mod client;
pub mod error;
pub mod listener;
pub mod protocol;
pub mod response;
pub mod types;

pub use client::OrionBle;
pub use error::{Error, ListenerError, ParseError, ProtocolError, Result};
pub use listener::{ListenerKey, ListenerState, NotificationListenerManager};
pub use protocol::{Endpoint, HttpClient, ServerConfig};
pub use types::{
    BleDevice, CharacteristicProperty, DeviceFilter, GattCharacteristic, GattNotification,
    GattService,
};
