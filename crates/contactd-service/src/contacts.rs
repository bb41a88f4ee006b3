// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact orchestration: validation, store calls and event emission.
//!
//! The store write is always committed before the event is built. A publish
//! failure never rolls the write back; it is returned next to the stored
//! value in an [`Outcome`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use contactd_config::BusConfig;
use contactd_core::{
    CanSendQuery, Contact, ContactSearchFilter, ContactStore, ContactdError,
    DeleteContactCommand, DomainDeletedHandler, DomainEvent, DomainId, EventPublisher, Outcome,
    Page, UpdateContactCommand, UpsertResult,
};

use crate::validate;

/// Publish deadline used when none is configured.
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Manages contacts and emits `contact.*` events.
pub struct ContactService {
    store: Arc<dyn ContactStore>,
    publisher: Arc<dyn EventPublisher>,
    publish_timeout: Duration,
}

impl ContactService {
    pub fn new(store: Arc<dyn ContactStore>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            store,
            publisher,
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
        }
    }

    /// Builds the service with the publish deadline from the bus configuration.
    pub fn from_config(
        config: &BusConfig,
        store: Arc<dyn ContactStore>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self::new(store, publisher).with_publish_timeout(config.publish_timeout())
    }

    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    /// Search contacts of one tenant and return one page.
    pub async fn search(&self, filter: &ContactSearchFilter) -> Result<Page<Contact>, ContactdError> {
        validate::require_domain(filter.domain_id)
            .inspect_err(|e| warn!(error = %e, "rejected contact search"))?;
        let rows = self.store.search(filter).await?;
        Ok(filter.window().split(rows))
    }

    /// Create a contact and emit `contact.created`.
    pub async fn create(&self, contact: &Contact) -> Result<Outcome<Contact>, ContactdError> {
        validate::new_contact(contact).inspect_err(|e| {
            warn!(domain_id = contact.domain_id, error = %e, "rejected contact create")
        })?;
        let created = self.store.create(contact).await?;
        let event = DomainEvent::contact_created(&created);
        Ok(self.emit(created, event).await)
    }

    /// Reconcile a contact by its natural key.
    ///
    /// Emits `contact.created` when a row was inserted and `contact.updated`
    /// when an existing row was changed; never both.
    pub async fn upsert(&self, contact: &Contact) -> Result<Outcome<UpsertResult>, ContactdError> {
        validate::new_contact(contact).inspect_err(|e| {
            warn!(domain_id = contact.domain_id, error = %e, "rejected contact upsert")
        })?;
        let result = self.store.upsert(contact).await?;
        let event = if result.inserted {
            DomainEvent::contact_created(&result.contact)
        } else {
            DomainEvent::contact_updated(&result.contact)
        };
        Ok(self.emit(result, event).await)
    }

    /// Apply a partial update and emit `contact.updated`.
    pub async fn update(
        &self,
        command: &UpdateContactCommand,
    ) -> Result<Outcome<Contact>, ContactdError> {
        validate::require_domain(command.domain_id)
            .and_then(|()| validate::require_id("contact", command.id))
            .and_then(|()| match command.username.as_deref() {
                Some("") => Err(ContactdError::Validation(
                    "username must not be empty".to_string(),
                )),
                _ => Ok(()),
            })
            .inspect_err(|e| {
                warn!(domain_id = command.domain_id, contact_id = %command.id, error = %e, "rejected contact update")
            })?;
        let updated = self.store.update(command).await?;
        let event = DomainEvent::contact_updated(&updated);
        Ok(self.emit(updated, event).await)
    }

    /// Delete a contact and emit `contact.deleted` with its id.
    pub async fn delete(&self, command: &DeleteContactCommand) -> Result<Outcome<()>, ContactdError> {
        validate::require_domain(command.domain_id)
            .and_then(|()| validate::require_id("contact", command.id))
            .inspect_err(|e| {
                warn!(domain_id = command.domain_id, contact_id = %command.id, error = %e, "rejected contact delete")
            })?;
        self.store.delete(command).await?;
        Ok(self.emit((), DomainEvent::contact_deleted(command.id)).await)
    }

    /// Succeeds when both peers exist in the tenant.
    ///
    /// A single match is only enough when `from` and `to` are the same
    /// contact. More than two matches for at most two ids means the store is
    /// inconsistent.
    pub async fn can_send(&self, query: &CanSendQuery) -> Result<(), ContactdError> {
        validate::require_domain(query.domain_id)
            .and_then(|()| validate::require_id("from", query.from))
            .and_then(|()| validate::require_id("to", query.to))
            .inspect_err(|e| warn!(domain_id = query.domain_id, error = %e, "rejected can-send check"))?;

        let mut filter = ContactSearchFilter::new(query.domain_id)
            .with_ids([query.from, query.to])
            .with_page(1, 2);
        filter.fields = vec!["id".to_string()];
        let found = self.store.search(&filter).await?;

        match found.len() {
            0 => Err(ContactdError::NotFound(format!(
                "contacts {} and {} in domain {}",
                query.from, query.to, query.domain_id
            ))),
            1 if query.from == query.to => Ok(()),
            1 => {
                let missing = if found[0].id == query.from {
                    query.to
                } else {
                    query.from
                };
                Err(ContactdError::NotFound(format!(
                    "contact {missing} in domain {}",
                    query.domain_id
                )))
            }
            2 => Ok(()),
            n => Err(ContactdError::InvalidArgument(format!(
                "{n} contacts matched two peer ids in domain {}",
                query.domain_id
            ))),
        }
    }

    /// Remove every contact of a deleted tenant. Emits nothing.
    pub async fn delete_by_domain(&self, domain_id: DomainId) -> Result<u64, ContactdError> {
        validate::require_domain(domain_id)
            .inspect_err(|e| warn!(error = %e, "rejected domain cleanup"))?;
        let removed = self.store.clear_by_domain(domain_id).await?;
        info!(domain_id, removed, "domain contacts cleared");
        Ok(removed)
    }

    async fn emit<T>(&self, value: T, event: DomainEvent) -> Outcome<T> {
        let topic = event.topic();
        let contact_id = event.entity_id();
        let error = match tokio::time::timeout(self.publish_timeout, self.publisher.publish(&event))
            .await
        {
            Ok(Ok(())) => {
                debug!(topic, %contact_id, "event published");
                return Outcome::published(value);
            }
            Ok(Err(err @ ContactdError::Publish { .. })) => err,
            Ok(Err(err)) => ContactdError::publish(topic, err),
            Err(_) => ContactdError::publish(
                topic,
                format!("no acknowledgement within {:?}", self.publish_timeout),
            ),
        };
        warn!(topic, %contact_id, error = %error, "event publish failed after commit");
        Outcome::unpublished(value, error)
    }
}

#[async_trait]
impl DomainDeletedHandler for ContactService {
    async fn delete_by_domain(&self, domain_id: DomainId) -> Result<(), ContactdError> {
        ContactService::delete_by_domain(self, domain_id).await.map(|_| ())
    }
}
