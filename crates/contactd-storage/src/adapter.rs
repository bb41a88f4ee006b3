// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementations of the `ContactStore` and `BotStore` traits.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use contactd_core::{
    BotSearchFilter, BotStore, Contact, ContactSearchFilter, ContactStore, ContactdError,
    DeleteBotCommand, DeleteContactCommand, DomainId, UpdateBotCommand, UpdateContactCommand,
    UpsertResult, WebitelBot,
};

use crate::database::Database;
use crate::queries;

/// Logs infrastructure failures; caller errors pass through quietly.
fn log_failure<T>(operation: &str, result: Result<T, ContactdError>) -> Result<T, ContactdError> {
    if let Err(err) = &result
        && matches!(err, ContactdError::Storage { .. } | ContactdError::Timeout { .. })
    {
        error!(operation, error = %err, "store operation failed");
    }
    result
}

/// SQLite-backed contact store.
///
/// Wraps a shared [`Database`] handle and delegates to [`queries::contacts`].
#[derive(Debug, Clone)]
pub struct SqliteContactStore {
    db: Arc<Database>,
}

impl SqliteContactStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ContactStore for SqliteContactStore {
    async fn create(&self, contact: &Contact) -> Result<Contact, ContactdError> {
        let created = log_failure(
            "create contact",
            queries::contacts::create_contact(&self.db, contact).await,
        )?;
        debug!(domain_id = created.domain_id, contact_id = %created.id, "contact created");
        Ok(created)
    }

    async fn search(&self, filter: &ContactSearchFilter) -> Result<Vec<Contact>, ContactdError> {
        log_failure(
            "search contacts",
            queries::contacts::search_contacts(&self.db, filter).await,
        )
    }

    async fn update(&self, command: &UpdateContactCommand) -> Result<Contact, ContactdError> {
        log_failure(
            "update contact",
            queries::contacts::update_contact(&self.db, command).await,
        )
    }

    async fn delete(&self, command: &DeleteContactCommand) -> Result<(), ContactdError> {
        let removed = log_failure(
            "delete contact",
            queries::contacts::delete_contact(&self.db, command).await,
        )?;
        debug!(domain_id = command.domain_id, contact_id = %command.id, removed, "contact delete");
        Ok(())
    }

    async fn clear_by_domain(&self, domain_id: DomainId) -> Result<u64, ContactdError> {
        log_failure(
            "clear contacts by domain",
            queries::contacts::clear_domain(&self.db, domain_id).await,
        )
    }

    async fn upsert(&self, contact: &Contact) -> Result<UpsertResult, ContactdError> {
        log_failure(
            "upsert contact",
            queries::contacts::upsert_contact(&self.db, contact).await,
        )
    }
}

/// SQLite-backed bot store.
#[derive(Debug, Clone)]
pub struct SqliteBotStore {
    db: Arc<Database>,
}

impl SqliteBotStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BotStore for SqliteBotStore {
    async fn create(&self, bot: &WebitelBot) -> Result<WebitelBot, ContactdError> {
        let created = log_failure("create bot", queries::bots::create_bot(&self.db, bot).await)?;
        debug!(domain_id = created.domain_id, flow_id = created.flow_id, bot_id = %created.id, "bot created");
        Ok(created)
    }

    async fn search(&self, filter: &BotSearchFilter) -> Result<Vec<WebitelBot>, ContactdError> {
        log_failure("search bots", queries::bots::search_bots(&self.db, filter).await)
    }

    async fn update(&self, command: &UpdateBotCommand) -> Result<WebitelBot, ContactdError> {
        log_failure("update bot", queries::bots::update_bot(&self.db, command).await)
    }

    async fn delete(&self, command: &DeleteBotCommand) -> Result<(), ContactdError> {
        let removed = log_failure("delete bot", queries::bots::delete_bots(&self.db, command).await)?;
        debug!(domain_id = command.domain_id, removed, "bots deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn stores_share_one_database() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("adapter.db");
        let db = Arc::new(Database::open(db_path.to_str().unwrap()).await.unwrap());
        let contacts: Arc<dyn ContactStore> = Arc::new(SqliteContactStore::new(Arc::clone(&db)));
        let bots: Arc<dyn BotStore> = Arc::new(SqliteBotStore::new(Arc::clone(&db)));

        let contact = contacts
            .create(&Contact::new(3, "issuer", "subject", "jdoe"))
            .await
            .unwrap();
        bots.create(&WebitelBot::new(3, 42, "Helper")).await.unwrap();

        let found = contacts
            .search(&ContactSearchFilter::new(3).with_q("jdo"))
            .await
            .unwrap();
        assert_eq!(found, vec![contact.clone()]);
        assert_eq!(bots.search(&BotSearchFilter::new(3)).await.unwrap().len(), 1);

        contacts
            .delete(&DeleteContactCommand {
                id: contact.id,
                domain_id: 3,
            })
            .await
            .unwrap();
        assert!(contacts
            .search(&ContactSearchFilter::new(3))
            .await
            .unwrap()
            .is_empty());

        db.checkpoint().await.unwrap();
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reopen.db");
        let path = db_path.to_str().unwrap();

        let db = Arc::new(Database::open(path).await.unwrap());
        let store = SqliteContactStore::new(Arc::clone(&db));
        let created = store
            .upsert(&Contact::new(1, "iss", "sub", "persisted"))
            .await
            .unwrap();
        assert!(created.inserted);
        drop(store);
        Arc::try_unwrap(db).unwrap().close().await.unwrap();

        let db = Arc::new(Database::open(path).await.unwrap());
        let store = SqliteContactStore::new(db);
        let found = store.search(&ContactSearchFilter::new(1)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, created.contact.id);
    }
}
