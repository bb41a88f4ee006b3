// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ready-made entities and messages for tests.

use std::collections::BTreeMap;

use contactd_bus::InboundMessage;
use contactd_core::{Contact, ContactType, DomainId, WebitelBot};

/// Issuer used by the fixture contacts.
pub const ISSUER: &str = "webitel.chat";

/// A valid, unsaved user contact. `name` is derived from `username`.
pub fn contact(domain_id: DomainId, subject_id: &str, username: &str) -> Contact {
    let mut contact = Contact::new(domain_id, ISSUER, subject_id, username);
    contact.contact_type = ContactType::User;
    contact.application_id = "portal".to_string();
    contact.name = format!("{username} (test)");
    contact
}

/// Like [`contact`], with one metadata entry.
pub fn contact_with_metadata(
    domain_id: DomainId,
    subject_id: &str,
    username: &str,
    key: &str,
    value: &str,
) -> Contact {
    let mut contact = contact(domain_id, subject_id, username);
    contact.metadata = BTreeMap::from([(key.to_string(), value.to_string())]);
    contact
}

pub fn bot(domain_id: DomainId, flow_id: i64) -> WebitelBot {
    WebitelBot::new(domain_id, flow_id, format!("flow {flow_id} bot"))
}

/// A "tenant deleted" integration message as the upstream broker sends it.
pub fn domain_deleted(domain_id: DomainId) -> InboundMessage {
    InboundMessage::new(
        format!("domains.delete.{domain_id}"),
        format!(r#"{{"domain_id":{domain_id},"timestamp":"2026-01-01T00:00:00Z"}}"#),
    )
}
