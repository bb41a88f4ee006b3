// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence traits for contacts and bots.

use async_trait::async_trait;

use crate::error::ContactdError;
use crate::filter::{
    BotSearchFilter, ContactSearchFilter, DeleteBotCommand, DeleteContactCommand,
    UpdateBotCommand, UpdateContactCommand,
};
use crate::types::{Contact, DomainId, WebitelBot};

/// Which branch an upsert took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertResult {
    pub contact: Contact,
    /// `true` when a new row was inserted, `false` when an existing row was updated.
    pub inserted: bool,
}

/// Contact persistence, scoped by tenant.
///
/// `search` returns up to `size + 1` rows; the caller splits the page.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Inserts a new contact. Fails with `Conflict` when the natural key exists
    /// and with `Validation` when `username` is empty.
    async fn create(&self, contact: &Contact) -> Result<Contact, ContactdError>;

    async fn search(&self, filter: &ContactSearchFilter) -> Result<Vec<Contact>, ContactdError>;

    /// Applies the present fields of `command`. Fails with `NotFound` when no
    /// row matches `(domain_id, id)`.
    async fn update(&self, command: &UpdateContactCommand) -> Result<Contact, ContactdError>;

    /// Deletes one contact. Deleting a missing id is not an error.
    async fn delete(&self, command: &DeleteContactCommand) -> Result<(), ContactdError>;

    /// Deletes every contact of a tenant and returns how many rows went away.
    async fn clear_by_domain(&self, domain_id: DomainId) -> Result<u64, ContactdError>;

    /// Inserts, or updates the row owning the same natural key.
    async fn upsert(&self, contact: &Contact) -> Result<UpsertResult, ContactdError>;
}

/// Bot persistence, scoped by tenant.
#[async_trait]
pub trait BotStore: Send + Sync {
    /// Inserts a new bot. Fails with `Conflict` when the tenant already has a
    /// bot for the flow.
    async fn create(&self, bot: &WebitelBot) -> Result<WebitelBot, ContactdError>;

    async fn search(&self, filter: &BotSearchFilter) -> Result<Vec<WebitelBot>, ContactdError>;

    async fn update(&self, command: &UpdateBotCommand) -> Result<WebitelBot, ContactdError>;

    /// Deletes by id and/or flow id. Fails with `NotFound` only when an id was
    /// given and nothing matched.
    async fn delete(&self, command: &DeleteBotCommand) -> Result<(), ContactdError>;
}
