// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use thiserror::Error;

/// The crate-wide error type.
///
/// `InvalidArgument`, `NotFound`, and `PermissionDenied` are raised before
/// anything is written and are safe to retry after correcting the input.
/// `Internal` wraps failures from the backing store; a failed commit leaves
/// no partial state, so resubmitting the same request is safe.
#[derive(Debug, Error)]
pub enum ErrorReport {
    /// The caller passed a malformed or out-of-range value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The referenced record exists but is not owned by the caller.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// An unexpected failure in the backing store.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Fallible<T> = Result<T, ErrorReport>;

impl ErrorReport {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<rusqlite::Error> for ErrorReport {
    fn from(e: rusqlite::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<toml::de::Error> for ErrorReport {
    fn from(e: toml::de::Error) -> Self {
        Self::InvalidArgument(e.to_string())
    }
}

impl From<serde_json::Error> for ErrorReport {
    fn from(e: serde_json::Error) -> Self {
        Self::Internal(e.to_string())
    }
}
