// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `yandex_climate` library.
//!
//! Every failure surfaces as [`Error`]. Setup code that needs to show a
//! specific user-facing message per failure class can collapse an error to
//! its [`ErrorKind`].

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The OAuth token was empty after normalization.
    #[error("no API token provided")]
    MissingToken,

    /// The API rejected the token (HTTP 401). The user must re-authenticate.
    #[error("authentication failed (HTTP 401): {0}")]
    Auth(String),

    /// The token lacks the required scope (HTTP 403).
    #[error("permission denied (HTTP 403): {0}")]
    Permission(String),

    /// Any other HTTP error status. The body is truncated for display.
    #[error("HTTP {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// The response body was not valid JSON for the expected structure.
    #[error("bad JSON: {message}. Body: {body}")]
    Json {
        /// Description of the decode failure.
        message: String,
        /// Truncated raw response body.
        body: String,
    },

    /// The payload decoded but did not carry `status: "ok"`.
    #[error("unexpected response: {0}")]
    UnexpectedPayload(String),

    /// The HTTP transport failed (connect error, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The supplied configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A fetch task in the poll fan-out could not be joined.
    #[error("fetch task failed: {0}")]
    TaskFailed(String),
}

/// Coarse classification of an [`Error`], for user-facing setup messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No token was provided.
    MissingToken,
    /// Bad or expired credential (HTTP 401).
    Auth,
    /// Credential lacks the required scope (HTTP 403).
    Permission,
    /// Generic API failure, possibly transient.
    Api,
    /// Invalid configuration.
    Config,
}

impl Error {
    /// Returns the coarse classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingToken => ErrorKind::MissingToken,
            Self::Auth(_) => ErrorKind::Auth,
            Self::Permission(_) => ErrorKind::Permission,
            Self::Config(_) => ErrorKind::Config,
            Self::Status { .. }
            | Self::Json { .. }
            | Self::UnexpectedPayload(_)
            | Self::Http(_)
            | Self::TaskFailed(_) => ErrorKind::Api,
        }
    }
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
