// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for HDDS Micro RCL
//!
//! One flat status taxonomy shared by the client and every middleware
//! backend, so transport failures pass through uninterpreted.

use thiserror::Error;

/// Result type for HDDS Micro RCL operations
pub type Result<T> = core::result::Result<T, Error>;

/// Numeric status reported for a successful operation
pub const STATUS_OK: u16 = 0;

/// Error type for HDDS Micro RCL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Error {
    /// Unspecified failure (usually reported by the middleware)
    #[error("Generic error")]
    Generic,

    /// Operation timed out
    #[error("Operation timed out")]
    Timeout,

    /// Null handle passed where a live one was required
    #[error("Null pointer or handle")]
    NullPointer,

    /// Invalid parameter
    #[error("Invalid parameter")]
    InvalidParameter,

    /// Client used before `init`
    #[error("Client not initialized")]
    NotInitialized,

    /// Operation already happened (double init, destroy after destroy, stale handle)
    #[error("Already done")]
    AlreadyDone,

    /// Slot table exhausted
    #[error("Out of space")]
    OutOfSpace,

    /// Node still owns live publishers or subscriptions
    #[error("Resources still active")]
    ResourcesActive,
}

impl Error {
    /// Stable numeric status code
    pub const fn code(self) -> u16 {
        match self {
            Error::Generic => 1,
            Error::Timeout => 2,
            Error::NullPointer => 3,
            Error::InvalidParameter => 4,
            Error::NotInitialized => 5,
            Error::AlreadyDone => 6,
            Error::OutOfSpace => 7,
            Error::ResourcesActive => 8,
        }
    }

    /// Map a numeric status code back to an error
    ///
    /// Returns `None` for [`STATUS_OK`]. Unknown codes collapse to
    /// [`Error::Generic`].
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            STATUS_OK => None,
            2 => Some(Error::Timeout),
            3 => Some(Error::NullPointer),
            4 => Some(Error::InvalidParameter),
            5 => Some(Error::NotInitialized),
            6 => Some(Error::AlreadyDone),
            7 => Some(Error::OutOfSpace),
            8 => Some(Error::ResourcesActive),
            _ => Some(Error::Generic),
        }
    }

    /// Whether retrying (after freeing resources, or later) can succeed
    ///
    /// Null-pointer, parameter and initialization errors are programming
    /// errors and never are.
    pub const fn is_recoverable(self) -> bool {
        !matches!(
            self,
            Error::NullPointer | Error::InvalidParameter | Error::NotInitialized
        )
    }
}

/// Flatten a result into its numeric status code
pub fn status_code(result: &Result<()>) -> u16 {
    match result {
        Ok(()) => STATUS_OK,
        Err(e) => e.code(),
    }
}
