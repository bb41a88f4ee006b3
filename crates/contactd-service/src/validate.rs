// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Precondition checks shared by the services. All run before any I/O.

use contactd_core::{Contact, ContactdError, DomainId};
use uuid::Uuid;

pub(crate) fn require_domain(domain_id: DomainId) -> Result<(), ContactdError> {
    if domain_id <= 0 {
        return Err(ContactdError::Validation(format!(
            "domain_id must be positive, got {domain_id}"
        )));
    }
    Ok(())
}

pub(crate) fn require_id(what: &str, id: Uuid) -> Result<(), ContactdError> {
    if id.is_nil() {
        return Err(ContactdError::Validation(format!("{what} id is required")));
    }
    Ok(())
}

pub(crate) fn require_flow(flow_id: i64) -> Result<(), ContactdError> {
    if flow_id <= 0 {
        return Err(ContactdError::Validation(format!(
            "flow_id must be positive, got {flow_id}"
        )));
    }
    Ok(())
}

fn require_text(field: &str, value: &str) -> Result<(), ContactdError> {
    if value.is_empty() {
        return Err(ContactdError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Checks a contact about to be created or upserted.
pub(crate) fn new_contact(contact: &Contact) -> Result<(), ContactdError> {
    require_domain(contact.domain_id)?;
    require_text("username", &contact.username)?;
    require_text("issuer_id", &contact.issuer_id)?;
    require_text("type", contact.contact_type.as_str())
}
