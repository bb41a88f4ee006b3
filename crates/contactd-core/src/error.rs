// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the contactd directory.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// The primary error type used across stores, publishers and services.
#[derive(Debug, Error)]
pub enum ContactdError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller input failed a precondition. Checked before any I/O.
    #[error("validation error: {0}")]
    Validation(String),

    /// The request was well formed but the data it resolved to is inconsistent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A point operation targeted a row that does not exist in the tenant scope.
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Storage backend errors (connection, query failure, row decoding).
    #[error("storage error: {context}: {source}")]
    Storage {
        context: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The store mutation succeeded but the domain event could not be published.
    #[error("publish error on `{topic}`: {source}")]
    Publish {
        topic: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`ContactdError`], used by transport layers to
/// pick a wire status without inspecting messages.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Config,
    Validation,
    InvalidArgument,
    NotFound,
    Conflict,
    Infrastructure,
    Publish,
    Internal,
}

impl ContactdError {
    /// Builds a [`ContactdError::Storage`] wrapping `source` with operation context.
    pub fn storage(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Storage {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Builds a [`ContactdError::Publish`] for the given topic.
    pub fn publish(
        topic: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Publish {
            topic: topic.into(),
            source: source.into(),
        }
    }

    /// Returns the coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Validation(_) => ErrorKind::Validation,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Storage { .. } | Self::Timeout { .. } => ErrorKind::Infrastructure,
            Self::Publish { .. } => ErrorKind::Publish,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// True for errors raised by input checks, before any I/O happened.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
