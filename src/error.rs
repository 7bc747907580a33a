// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `OrionBLE` client.
//!
//! This module provides the error hierarchy for handling failures across the
//! library: HTTP communication with the server, JSON decoding, and
//! notification listener management.

use thiserror::Error;

use crate::listener::ListenerKey;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred while talking to the server.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while decoding a server response.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error occurred while managing a notification listener.
    #[error("listener error: {0}")]
    Listener(#[from] ListenerError),

    /// The server did not answer within the allowed number of attempts.
    #[error("server unavailable after {attempts} attempts")]
    ServerUnavailable {
        /// Number of connection attempts made.
        attempts: u32,
    },
}

/// Errors related to HTTP communication with the server.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {code} - {reason}")]
    Status {
        /// Numeric HTTP status code.
        code: u16,
        /// Canonical reason phrase.
        reason: String,
    },

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),
}

/// Errors related to decoding server responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to parse a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// Errors surfaced synchronously by the notification listener manager.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListenerError {
    /// A listener is already running or paused for this key.
    #[error("a listener is already active for {0}")]
    Duplicate(ListenerKey),

    /// The polling interval must be greater than zero.
    #[error("polling interval must be greater than zero")]
    InvalidInterval,

    /// `start` was called outside of a tokio runtime.
    #[error("no tokio runtime available to run the listener")]
    NoRuntime,
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
