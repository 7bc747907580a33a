// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport for communicating with the `OrionBLE` server.
//!
//! The server exposes a small REST API. Every BLE operation maps to one
//! request against one [`Endpoint`]; responses are JSON bodies that the
//! [`response`](crate::response) module decodes.
//!
//! - [`ServerConfig`]: where the server lives and how patient to be with it
//! - [`HttpClient`]: issues GET/POST requests and returns response bodies
//! - [`Endpoint`]: the REST routes, with percent-encoded path segments

mod endpoint;
mod http;

pub use endpoint::Endpoint;
pub use http::{HttpClient, ServerConfig};
