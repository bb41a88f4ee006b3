// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain events emitted after successful contact mutations.
//!
//! Each variant owns its topic and timestamp, so a publisher can never pair
//! a payload with the wrong topic.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::types::Contact;

pub const CONTACT_CREATED_TOPIC: &str = "contact.created";
pub const CONTACT_UPDATED_TOPIC: &str = "contact.updated";
pub const CONTACT_DELETED_TOPIC: &str = "contact.deleted";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactCreated {
    pub contact_id: Uuid,
    pub name: String,
    pub username: String,
    #[serde(rename = "type")]
    pub contact_type: String,
    pub application_id: String,
    pub issuer_id: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactUpdated {
    pub contact_id: Uuid,
    pub name: String,
    pub username: String,
    #[serde(rename = "type")]
    pub contact_type: String,
    pub occurred_at: DateTime<Utc>,
}

/// Only the id survives a delete; the record's fields are gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactDeleted {
    pub contact_id: Uuid,
    pub occurred_at: DateTime<Utc>,
}

/// An immutable record of a contact state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DomainEvent {
    ContactCreated(ContactCreated),
    ContactUpdated(ContactUpdated),
    ContactDeleted(ContactDeleted),
}

fn millis_to_utc(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
}

impl DomainEvent {
    /// Event for a freshly inserted contact, stamped with its `created_at`.
    pub fn contact_created(contact: &Contact) -> Self {
        Self::ContactCreated(ContactCreated {
            contact_id: contact.id,
            name: contact.name.clone(),
            username: contact.username.clone(),
            contact_type: contact.contact_type.to_string(),
            application_id: contact.application_id.clone(),
            issuer_id: contact.issuer_id.clone(),
            occurred_at: millis_to_utc(contact.created_at),
        })
    }

    /// Event for a modified contact, stamped with its `updated_at`.
    pub fn contact_updated(contact: &Contact) -> Self {
        Self::ContactUpdated(ContactUpdated {
            contact_id: contact.id,
            name: contact.name.clone(),
            username: contact.username.clone(),
            contact_type: contact.contact_type.to_string(),
            occurred_at: millis_to_utc(contact.updated_at),
        })
    }

    /// Event for a removed contact, stamped now.
    pub fn contact_deleted(id: Uuid) -> Self {
        Self::ContactDeleted(ContactDeleted {
            contact_id: id,
            occurred_at: Utc::now(),
        })
    }

    pub fn topic(&self) -> &'static str {
        match self {
            Self::ContactCreated(_) => CONTACT_CREATED_TOPIC,
            Self::ContactUpdated(_) => CONTACT_UPDATED_TOPIC,
            Self::ContactDeleted(_) => CONTACT_DELETED_TOPIC,
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Self::ContactCreated(e) => e.occurred_at,
            Self::ContactUpdated(e) => e.occurred_at,
            Self::ContactDeleted(e) => e.occurred_at,
        }
    }

    /// Id of the entity the event describes.
    pub fn entity_id(&self) -> Uuid {
        match self {
            Self::ContactCreated(e) => e.contact_id,
            Self::ContactUpdated(e) => e.contact_id,
            Self::ContactDeleted(e) => e.contact_id,
        }
    }

    /// JSON body of the event as published on the wire.
    pub fn payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
