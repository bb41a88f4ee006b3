// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact CRUD, search and natural-key upsert.

use std::collections::BTreeMap;

use contactd_core::query::validate_and_format_sort;
use contactd_core::types::now_millis;
use contactd_core::{
    Column, Contact, ContactColumn, ContactSearchFilter, ContactType, ContactdError,
    DeleteContactCommand, DomainId, Projection, UpdateContactCommand, UpsertResult,
};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, TransactionBehavior, params, params_from_iter};
use uuid::Uuid;

use super::{Predicate, uuid_column, uuid_value};
use crate::database::Database;

use ContactColumn as C;

fn contact_from_row(row: &rusqlite::Row<'_>, columns: &[ContactColumn]) -> rusqlite::Result<Contact> {
    let mut contact = Contact::default();
    for (idx, column) in columns.iter().enumerate() {
        match column {
            C::Id => contact.id = uuid_column(row, idx)?,
            C::DomainId => contact.domain_id = row.get(idx)?,
            C::IssuerId => contact.issuer_id = row.get(idx)?,
            C::SubjectId => contact.subject_id = row.get(idx)?,
            C::ApplicationId => contact.application_id = row.get(idx)?,
            C::Type => contact.contact_type = ContactType::from(row.get::<_, String>(idx)?),
            C::Name => contact.name = row.get(idx)?,
            C::Username => contact.username = row.get(idx)?,
            C::Metadata => {
                let text: String = row.get(idx)?;
                contact.metadata = serde_json::from_str(&text).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
                })?;
            }
            C::CreatedAt => contact.created_at = row.get(idx)?,
            C::UpdatedAt => contact.updated_at = row.get(idx)?,
        }
    }
    Ok(contact)
}

fn encode_metadata(metadata: &BTreeMap<String, String>) -> Result<String, ContactdError> {
    serde_json::to_string(metadata).map_err(|e| ContactdError::storage("encode metadata", e))
}

fn require_username(contact: &Contact) -> Result<(), ContactdError> {
    if contact.username.is_empty() {
        return Err(ContactdError::Validation(
            "contact username must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

/// Insert a new contact. The id and both timestamps are assigned here.
pub async fn create_contact(db: &Database, contact: &Contact) -> Result<Contact, ContactdError> {
    require_username(contact)?;

    let now = now_millis();
    let created = Contact {
        id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        ..contact.clone()
    };
    let metadata = encode_metadata(&created.metadata)?;
    let row = created.clone();

    db.call("create contact", move |conn| {
        conn.execute(
            "INSERT INTO contacts (id, domain_id, issuer_id, subject_id, application_id, type, \
             name, username, metadata, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                row.id.to_string(),
                row.domain_id,
                row.issuer_id,
                row.subject_id,
                row.application_id,
                row.contact_type.as_str(),
                row.name,
                row.username,
                metadata,
                row.created_at,
                row.updated_at,
            ],
        )?;
        Ok(())
    })
    .await?;

    Ok(created)
}

/// Search contacts of one tenant. Returns up to `size + 1` rows.
pub async fn search_contacts(
    db: &Database,
    filter: &ContactSearchFilter,
) -> Result<Vec<Contact>, ContactdError> {
    let projection = Projection::<ContactColumn>::from_requested(&filter.fields);
    let sort = validate_and_format_sort::<ContactColumn>(&filter.sort);

    let mut predicate = Predicate::default();
    predicate
        .eq(C::DomainId.as_sql(), filter.domain_id)
        .any_of(C::Id.as_sql(), filter.ids.iter().map(uuid_value))
        .any_of(C::ApplicationId.as_sql(), filter.apps.iter().cloned())
        .any_of(C::IssuerId.as_sql(), filter.issuers.iter().cloned())
        .any_of(C::SubjectId.as_sql(), filter.subjects.iter().cloned())
        .any_of(
            C::Type.as_sql(),
            filter
                .types
                .iter()
                .map(|t| ContactType::from_str_value(t).as_str().to_string()),
        );
    if let Some(q) = filter.text_query() {
        predicate.contains_text(&[C::Name.as_sql(), C::Username.as_sql()], q);
    }
    let page = predicate.page_sql(&filter.window());

    let sql = format!(
        "SELECT {} FROM contacts WHERE {} ORDER BY {sort}, rowid {} {page}",
        projection.to_sql(),
        predicate.where_sql(),
        sort.direction.as_sql(),
    );
    let columns = projection.columns().to_vec();
    let params = predicate.into_params();

    db.call("search contacts", move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params), |row| {
            contact_from_row(row, &columns)
        })?;
        rows.collect()
    })
    .await
}

/// Apply the present fields of `command`; empty strings count as absent.
pub async fn update_contact(
    db: &Database,
    command: &UpdateContactCommand,
) -> Result<Contact, ContactdError> {
    let metadata = command.metadata.as_ref().map(encode_metadata).transpose()?;
    let name = non_empty(&command.name);
    let username = non_empty(&command.username);
    let subject_id = non_empty(&command.subject_id);
    let (domain_id, id) = (command.domain_id, command.id);

    let sql = format!(
        "UPDATE contacts SET \
         name = coalesce(?3, name), \
         username = coalesce(?4, username), \
         subject_id = coalesce(?5, subject_id), \
         metadata = coalesce(?6, metadata), \
         updated_at = max(?7, updated_at + 1) \
         WHERE domain_id = ?1 AND id = ?2 RETURNING {}",
        Projection::<ContactColumn>::all().to_sql()
    );

    let updated = db
        .call("update contact", move |conn| {
            conn.query_row(
                &sql,
                params![
                    domain_id,
                    id.to_string(),
                    name,
                    username,
                    subject_id,
                    metadata,
                    now_millis()
                ],
                |row| contact_from_row(row, C::ALL),
            )
            .optional()
        })
        .await?;

    updated.ok_or_else(|| ContactdError::NotFound(format!("contact {id} in domain {domain_id}")))
}

/// Delete one contact. Returns whether a row was removed.
pub async fn delete_contact(
    db: &Database,
    command: &DeleteContactCommand,
) -> Result<bool, ContactdError> {
    let (domain_id, id) = (command.domain_id, command.id);
    let affected = db
        .call("delete contact", move |conn| {
            conn.execute(
                "DELETE FROM contacts WHERE domain_id = ?1 AND id = ?2",
                params![domain_id, id.to_string()],
            )
        })
        .await?;
    Ok(affected > 0)
}

/// Delete every contact of a tenant.
pub async fn clear_domain(db: &Database, domain_id: DomainId) -> Result<u64, ContactdError> {
    let affected = db
        .call("clear contacts by domain", move |conn| {
            conn.execute("DELETE FROM contacts WHERE domain_id = ?1", params![domain_id])
        })
        .await?;
    Ok(affected as u64)
}

/// Insert `contact`, or update the row owning its natural key.
///
/// Both branches run in one IMMEDIATE transaction on the single writer
/// connection, so exactly one of several racing callers takes the insert
/// branch for a given key.
pub async fn upsert_contact(db: &Database, contact: &Contact) -> Result<UpsertResult, ContactdError> {
    require_username(contact)?;

    let metadata = encode_metadata(&contact.metadata)?;
    let row = contact.clone();
    let returning = Projection::<ContactColumn>::all().to_sql();

    db.call("upsert contact", move |conn| {
        let now = now_millis();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let inserted = tx
            .query_row(
                &format!(
                    "INSERT INTO contacts (id, domain_id, issuer_id, subject_id, application_id, \
                     type, name, username, metadata, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10) \
                     ON CONFLICT (domain_id, issuer_id, subject_id) DO NOTHING \
                     RETURNING {returning}"
                ),
                params![
                    Uuid::new_v4().to_string(),
                    row.domain_id,
                    row.issuer_id,
                    row.subject_id,
                    row.application_id,
                    row.contact_type.as_str(),
                    row.name,
                    row.username,
                    metadata,
                    now,
                ],
                |r| contact_from_row(r, C::ALL),
            )
            .optional()?;

        let result = match inserted {
            Some(contact) => UpsertResult {
                contact,
                inserted: true,
            },
            None => {
                let contact = tx.query_row(
                    &format!(
                        "UPDATE contacts SET name = ?4, username = ?5, metadata = ?6, \
                         updated_at = max(?7, updated_at + 1) \
                         WHERE domain_id = ?1 AND issuer_id = ?2 AND subject_id = ?3 \
                         RETURNING {returning}"
                    ),
                    params![
                        row.domain_id,
                        row.issuer_id,
                        row.subject_id,
                        row.name,
                        row.username,
                        metadata,
                        now,
                    ],
                    |r| contact_from_row(r, C::ALL),
                )?;
                UpsertResult {
                    contact,
                    inserted: false,
                }
            }
        };

        tx.commit()?;
        Ok(result)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn make_contact(domain_id: DomainId, subject: &str, username: &str) -> Contact {
        let mut contact = Contact::new(domain_id, "webitel.chat", subject, username);
        contact.name = format!("{username} name");
        contact.application_id = "portal".to_string();
        contact.contact_type = ContactType::User;
        contact
    }

    #[tokio::test]
    async fn create_assigns_identity_and_timestamps() {
        let db = setup_db().await;
        let created = create_contact(&db, &make_contact(1, "s1", "alice")).await.unwrap();
        assert!(!created.id.is_nil());
        assert!(created.created_at > 0);
        assert_eq!(created.created_at, created.updated_at);

        let found = search_contacts(&db, &ContactSearchFilter::new(1).with_ids([created.id]))
            .await
            .unwrap();
        assert_eq!(found, vec![created]);
    }

    #[tokio::test]
    async fn create_duplicate_natural_key_conflicts() {
        let db = setup_db().await;
        create_contact(&db, &make_contact(1, "s1", "alice")).await.unwrap();
        let err = create_contact(&db, &make_contact(1, "s1", "alice2"))
            .await
            .unwrap_err();
        assert!(err.is_conflict(), "got {err}");

        // Same key in another tenant is a different contact.
        create_contact(&db, &make_contact(2, "s1", "alice")).await.unwrap();
    }

    #[tokio::test]
    async fn create_empty_username_is_rejected() {
        let db = setup_db().await;
        let err = create_contact(&db, &make_contact(1, "s1", "")).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn search_is_scoped_to_domain() {
        let db = setup_db().await;
        create_contact(&db, &make_contact(1, "s1", "alice")).await.unwrap();
        create_contact(&db, &make_contact(2, "s2", "bob")).await.unwrap();

        let rows = search_contacts(&db, &ContactSearchFilter::new(1)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].username, "alice");
    }

    #[tokio::test]
    async fn search_q_matches_name_or_username_case_insensitively() {
        let db = setup_db().await;
        create_contact(&db, &make_contact(1, "s1", "Angelina")).await.unwrap();
        let mut other = make_contact(1, "s2", "bob");
        other.name = "Mangold".to_string();
        create_contact(&db, &other).await.unwrap();
        create_contact(&db, &make_contact(1, "s3", "carol")).await.unwrap();

        let rows = search_contacts(&db, &ContactSearchFilter::new(1).with_q("ANG").with_sort("+username"))
            .await
            .unwrap();
        let usernames: Vec<&str> = rows.iter().map(|c| c.username.as_str()).collect();
        assert_eq!(usernames, vec!["Angelina", "bob"]);
    }

    #[tokio::test]
    async fn search_q_wildcards_are_literal() {
        let db = setup_db().await;
        create_contact(&db, &make_contact(1, "s1", "100%_real")).await.unwrap();
        create_contact(&db, &make_contact(1, "s2", "1000 real")).await.unwrap();

        let rows = search_contacts(&db, &ContactSearchFilter::new(1).with_q("0%_"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].username, "100%_real");
    }

    #[tokio::test]
    async fn search_q_folds_non_ascii_case() {
        let db = setup_db().await;
        create_contact(&db, &make_contact(1, "s1", "Ангелина")).await.unwrap();
        create_contact(&db, &make_contact(1, "s2", "Борис")).await.unwrap();

        let rows = search_contacts(&db, &ContactSearchFilter::new(1).with_q("АНГЕЛ"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].username, "Ангелина");

        let rows = search_contacts(&db, &ContactSearchFilter::new(1).with_q("борис"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn abandoned_search_leaves_the_connection_usable() {
        let db = setup_db().await;
        for i in 0..20 {
            create_contact(&db, &make_contact(1, &format!("s{i}"), &format!("user{i}")))
                .await
                .unwrap();
        }
        let filter = ContactSearchFilter::new(1).with_q("user").with_page(1, 50);

        for _ in 0..5 {
            let dropped =
                tokio::time::timeout(std::time::Duration::from_micros(1), search_contacts(&db, &filter));
            let _ = dropped.await;
        }

        let rows = search_contacts(&db, &filter).await.unwrap();
        assert_eq!(rows.len(), 20);
    }

    #[tokio::test]
    async fn search_over_fetches_one_row() {
        let db = setup_db().await;
        for i in 0..4 {
            create_contact(&db, &make_contact(1, &format!("s{i}"), &format!("user{i}")))
                .await
                .unwrap();
        }
        let filter = ContactSearchFilter::new(1).with_page(1, 3).with_sort("+username");
        let rows = search_contacts(&db, &filter).await.unwrap();
        assert_eq!(rows.len(), 4);

        let rows = search_contacts(&db, &filter.clone().with_page(2, 3)).await.unwrap();
        let usernames: Vec<&str> = rows.iter().map(|c| c.username.as_str()).collect();
        assert_eq!(usernames, vec!["user3"]);
    }

    #[tokio::test]
    async fn search_set_filters_combine_with_and() {
        let db = setup_db().await;
        let mut bot = make_contact(1, "s1", "helper");
        bot.contact_type = ContactType::Bot;
        bot.issuer_id = "flows".to_string();
        create_contact(&db, &bot).await.unwrap();
        create_contact(&db, &make_contact(1, "s2", "human")).await.unwrap();

        let mut filter = ContactSearchFilter::new(1);
        filter.types = vec!["BOT".to_string()];
        let rows = search_contacts(&db, &filter).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].username, "helper");

        filter.issuers = vec!["webitel.chat".to_string()];
        assert!(search_contacts(&db, &filter).await.unwrap().is_empty());

        let mut filter = ContactSearchFilter::new(1);
        filter.subjects = vec!["s2".to_string(), "missing".to_string()];
        filter.apps = vec!["portal".to_string()];
        let rows = search_contacts(&db, &filter).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].username, "human");
    }

    #[tokio::test]
    async fn search_projection_leaves_other_fields_default() {
        let db = setup_db().await;
        create_contact(&db, &make_contact(1, "s1", "alice")).await.unwrap();

        let mut filter = ContactSearchFilter::new(1);
        filter.fields = vec!["username".into(), "password".into(), "type".into()];
        let rows = search_contacts(&db, &filter).await.unwrap();
        assert_eq!(rows[0].username, "alice");
        assert_eq!(rows[0].contact_type, ContactType::User);
        assert!(rows[0].id.is_nil());
        assert!(rows[0].name.is_empty());
        assert_eq!(rows[0].created_at, 0);
    }

    #[tokio::test]
    async fn update_applies_only_present_fields() {
        let db = setup_db().await;
        let mut contact = make_contact(1, "s1", "alice");
        contact.metadata.insert("lang".into(), "en".into());
        let created = create_contact(&db, &contact).await.unwrap();

        let command = UpdateContactCommand::new(1, created.id)
            .with_name("Alice Cooper")
            .with_username("");
        let updated = update_contact(&db, &command).await.unwrap();
        assert_eq!(updated.name, "Alice Cooper");
        assert_eq!(updated.username, "alice");
        assert_eq!(updated.metadata.get("lang").map(String::as_str), Some("en"));
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);

        let mut metadata = BTreeMap::new();
        metadata.insert("lang".to_string(), "de".to_string());
        let again = update_contact(&db, &UpdateContactCommand::new(1, created.id).with_metadata(metadata))
            .await
            .unwrap();
        assert_eq!(again.metadata.get("lang").map(String::as_str), Some("de"));
        assert!(again.updated_at > updated.updated_at);
    }

    #[tokio::test]
    async fn update_in_wrong_domain_is_not_found() {
        let db = setup_db().await;
        let created = create_contact(&db, &make_contact(1, "s1", "alice")).await.unwrap();
        let err = update_contact(&db, &UpdateContactCommand::new(2, created.id).with_name("x"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let db = setup_db().await;
        let created = create_contact(&db, &make_contact(1, "s1", "alice")).await.unwrap();
        let command = DeleteContactCommand {
            id: created.id,
            domain_id: 1,
        };
        assert!(delete_contact(&db, &command).await.unwrap());
        assert!(!delete_contact(&db, &command).await.unwrap());
    }

    #[tokio::test]
    async fn clear_domain_removes_only_that_tenant() {
        let db = setup_db().await;
        create_contact(&db, &make_contact(1, "s1", "a")).await.unwrap();
        create_contact(&db, &make_contact(1, "s2", "b")).await.unwrap();
        create_contact(&db, &make_contact(2, "s1", "c")).await.unwrap();

        assert_eq!(clear_domain(&db, 1).await.unwrap(), 2);
        assert_eq!(clear_domain(&db, 1).await.unwrap(), 0);
        assert_eq!(search_contacts(&db, &ContactSearchFilter::new(2)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn upsert_inserts_then_updates_same_row() {
        let db = setup_db().await;
        let first = upsert_contact(&db, &make_contact(1, "s1", "alice")).await.unwrap();
        assert!(first.inserted);

        let mut changed = make_contact(1, "s1", "alice");
        changed.name = "Alice Renamed".to_string();
        let second = upsert_contact(&db, &changed).await.unwrap();
        assert!(!second.inserted);
        assert_eq!(second.contact.id, first.contact.id);
        assert_eq!(second.contact.created_at, first.contact.created_at);
        assert!(second.contact.updated_at > first.contact.updated_at);
        assert_eq!(second.contact.name, "Alice Renamed");
    }

    #[tokio::test]
    async fn concurrent_upserts_insert_exactly_once() {
        let db = Arc::new(setup_db().await);
        let mut handles = Vec::new();
        for i in 0..5 {
            let db = Arc::clone(&db);
            handles.push(tokio::spawn(async move {
                let mut contact = make_contact(1, "shared", "racer");
                contact.name = format!("racer {i}");
                upsert_contact(&db, &contact).await
            }));
        }

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap().unwrap());
        }
        assert_eq!(results.iter().filter(|r| r.inserted).count(), 1);
        let id = results[0].contact.id;
        assert!(results.iter().all(|r| r.contact.id == id));
        assert_eq!(search_contacts(&db, &ContactSearchFilter::new(1)).await.unwrap().len(), 1);
    }
}
