// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directory entities shared across store, publisher and service boundaries.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ContactdError;

/// Tenant identifier. Every entity is partitioned by it.
pub type DomainId = i64;

/// Current wall-clock time as Unix epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Classification tag of a contact.
///
/// The well-known kinds are modelled explicitly; deployments that use their
/// own tags round-trip through [`ContactType::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContactType {
    Webitel,
    User,
    Bot,
    Custom(String),
}

impl ContactType {
    /// Returns the stored string form of this type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Webitel => "webitel",
            Self::User => "user",
            Self::Bot => "bot",
            Self::Custom(tag) => tag,
        }
    }

    /// Parses a stored value. Known kinds match case-insensitively.
    pub fn from_str_value(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "webitel" => Self::Webitel,
            "user" => Self::User,
            "bot" => Self::Bot,
            _ => Self::Custom(value.to_string()),
        }
    }

    /// An unset type is an empty custom tag.
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

impl Default for ContactType {
    fn default() -> Self {
        Self::Custom(String::new())
    }
}

impl fmt::Display for ContactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ContactType {
    fn from(value: String) -> Self {
        Self::from_str_value(&value)
    }
}

impl From<&str> for ContactType {
    fn from(value: &str) -> Self {
        Self::from_str_value(value)
    }
}

impl From<ContactType> for String {
    fn from(value: ContactType) -> Self {
        value.as_str().to_string()
    }
}

/// One addressable identity within a tenant.
///
/// `(domain_id, issuer_id, subject_id)` is the natural key. `id`, `created_at`
/// and `updated_at` are assigned by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub domain_id: DomainId,
    pub issuer_id: String,
    pub subject_id: String,
    pub application_id: String,
    #[serde(rename = "type")]
    pub contact_type: ContactType,
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Contact {
    /// Creates an unsaved contact with the required identity fields set.
    pub fn new(
        domain_id: DomainId,
        issuer_id: impl Into<String>,
        subject_id: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            domain_id,
            issuer_id: issuer_id.into(),
            subject_id: subject_id.into(),
            username: username.into(),
            ..Self::default()
        }
    }

    /// The `(domain_id, issuer_id, subject_id)` triple used for upsert reconciliation.
    pub fn natural_key(&self) -> (DomainId, &str, &str) {
        (self.domain_id, &self.issuer_id, &self.subject_id)
    }
}

/// A bot bound to a tenant's automation flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebitelBot {
    pub id: Uuid,
    pub domain_id: DomainId,
    pub flow_id: i64,
    pub display_name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl WebitelBot {
    /// Creates an unsaved bot for the given flow.
    pub fn new(domain_id: DomainId, flow_id: i64, display_name: impl Into<String>) -> Self {
        Self {
            domain_id,
            flow_id,
            display_name: display_name.into(),
            ..Self::default()
        }
    }
}

/// Result of a mutation that also emits a domain event.
///
/// The store write is the source of truth: when publishing fails the stored
/// value is still returned and the failure is reported in `publish_error`.
#[derive(Debug)]
#[must_use = "a failed event publish is only reported through this value"]
pub struct Outcome<T> {
    pub value: T,
    pub publish_error: Option<ContactdError>,
}

impl<T> Outcome<T> {
    pub fn published(value: T) -> Self {
        Self {
            value,
            publish_error: None,
        }
    }

    pub fn unpublished(value: T, error: ContactdError) -> Self {
        Self {
            value,
            publish_error: Some(error),
        }
    }

    /// True when the event for this mutation was handed to the publisher.
    pub fn is_published(&self) -> bool {
        self.publish_error.is_none()
    }

    pub fn into_parts(self) -> (T, Option<ContactdError>) {
        (self.value, self.publish_error)
    }

    /// Collapses the outcome, discarding the value when publishing failed.
    pub fn into_result(self) -> Result<T, ContactdError> {
        match self.publish_error {
            None => Ok(self.value),
            Some(err) => Err(err),
        }
    }
}
