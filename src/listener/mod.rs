// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Notification listeners.
//!
//! The server buffers notifications per characteristic and hands them out on
//! request. This module turns that pull API into push-style callbacks: each
//! monitored characteristic gets its own background task that fetches,
//! delivers and sleeps at a fixed interval.
//!
//! # Overview
//!
//! - [`ListenerKey`] - Identity of a (device, service, characteristic) triple
//! - [`ListenerState`] - `Running`, `Paused` or `Stopped`
//! - [`NotificationListenerManager`] - Registry of active listeners with
//!   start/pause/resume/stop control
//!
//! # Lifecycle
//!
//! ```text
//! (unregistered) --start--> Running <--pause/resume--> Paused
//!                              |                          |
//!                              +-----------stop-----------+--> Stopped (removed)
//! ```
//!
//! A stopped key can be started again; the new listener is a fresh task.
//!
//! # Usage
//!
//! Most applications go through [`OrionBle`](crate::OrionBle), which builds
//! the fetch closure for them. The manager can also be driven directly:
//!
//! ```no_run
//! use std::time::Duration;
//! use orion_ble::listener::{ListenerKey, NotificationListenerManager};
//!
//! # async fn example() -> orion_ble::Result<()> {
//! let manager = NotificationListenerManager::new();
//! let key = ListenerKey::new("B0B1139AF459", "180d", "2a37");
//!
//! manager.start(
//!     key.clone(),
//!     || async { Ok(Vec::new()) },
//!     |notification| println!("{notification}"),
//!     Duration::from_millis(500),
//! )?;
//!
//! manager.pause(&key);
//! manager.resume(&key);
//! manager.stop(&key).await;
//! # Ok(())
//! # }
//! ```

mod key;
mod manager;

pub use key::ListenerKey;
pub use manager::{ListenerState, NotificationListenerManager};
