// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bot CRUD and search.

use contactd_core::query::validate_and_format_sort;
use contactd_core::types::now_millis;
use contactd_core::{
    BotColumn, BotSearchFilter, Column, ContactdError, DeleteBotCommand, Projection,
    UpdateBotCommand, WebitelBot,
};
use rusqlite::{OptionalExtension, params, params_from_iter};
use uuid::Uuid;

use super::{Predicate, uuid_column, uuid_value};
use crate::database::Database;

use BotColumn as B;

fn bot_from_row(row: &rusqlite::Row<'_>, columns: &[BotColumn]) -> rusqlite::Result<WebitelBot> {
    let mut bot = WebitelBot::default();
    for (idx, column) in columns.iter().enumerate() {
        match column {
            B::Id => bot.id = uuid_column(row, idx)?,
            B::DomainId => bot.domain_id = row.get(idx)?,
            B::FlowId => bot.flow_id = row.get(idx)?,
            B::DisplayName => bot.display_name = row.get(idx)?,
            B::CreatedAt => bot.created_at = row.get(idx)?,
            B::UpdatedAt => bot.updated_at = row.get(idx)?,
        }
    }
    Ok(bot)
}

/// Insert a new bot. Fails with `Conflict` if the flow already has a bot in the tenant.
pub async fn create_bot(db: &Database, bot: &WebitelBot) -> Result<WebitelBot, ContactdError> {
    let now = now_millis();
    let created = WebitelBot {
        id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        ..bot.clone()
    };
    let row = created.clone();

    db.call("create bot", move |conn| {
        conn.execute(
            "INSERT INTO bots (id, domain_id, flow_id, display_name, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                row.id.to_string(),
                row.domain_id,
                row.flow_id,
                row.display_name,
                row.created_at,
                row.updated_at,
            ],
        )?;
        Ok(())
    })
    .await?;

    Ok(created)
}

/// Search bots of one tenant. Returns up to `size + 1` rows.
pub async fn search_bots(
    db: &Database,
    filter: &BotSearchFilter,
) -> Result<Vec<WebitelBot>, ContactdError> {
    let projection = Projection::<BotColumn>::from_requested(&filter.fields);
    let sort = validate_and_format_sort::<BotColumn>(&filter.sort);

    let mut predicate = Predicate::default();
    predicate
        .eq(B::DomainId.as_sql(), filter.domain_id)
        .any_of(B::Id.as_sql(), filter.ids.iter().map(uuid_value))
        .any_of(B::FlowId.as_sql(), filter.flow_ids.iter().copied())
        .like_any(B::DisplayName.as_sql(), filter.display_names.iter().cloned());
    if let Some(q) = filter.text_query() {
        predicate.contains_text(&[B::DisplayName.as_sql()], q);
    }
    let page = predicate.page_sql(&filter.window());

    let sql = format!(
        "SELECT {} FROM bots WHERE {} ORDER BY {sort}, rowid {} {page}",
        projection.to_sql(),
        predicate.where_sql(),
        sort.direction.as_sql(),
    );
    let columns = projection.columns().to_vec();
    let params = predicate.into_params();

    db.call("search bots", move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params), |row| bot_from_row(row, &columns))?;
        rows.collect()
    })
    .await
}

/// Coalesce-style partial update keyed by `(domain_id, id)`.
pub async fn update_bot(
    db: &Database,
    command: &UpdateBotCommand,
) -> Result<WebitelBot, ContactdError> {
    let (id, domain_id, flow_id) = (command.id, command.domain_id, command.flow_id);
    let display_name = command.display_name.clone();

    let sql = format!(
        "UPDATE bots SET \
         flow_id = coalesce(?3, flow_id), \
         display_name = coalesce(?4, display_name), \
         updated_at = max(?5, updated_at + 1) \
         WHERE domain_id = ?1 AND id = ?2 RETURNING {}",
        Projection::<BotColumn>::all().to_sql()
    );

    let updated = db
        .call("update bot", move |conn| {
            conn.query_row(
                &sql,
                params![domain_id, id.to_string(), flow_id, display_name, now_millis()],
                |row| bot_from_row(row, B::ALL),
            )
            .optional()
        })
        .await?;

    updated.ok_or_else(|| ContactdError::NotFound(format!("bot {id} in domain {domain_id}")))
}

/// Delete bots by id, flow id, or both, within one tenant.
///
/// At least one of `id`/`flow_id` is required. Returns the number of rows removed;
/// fails with `NotFound` only when an id was given and nothing matched.
pub async fn delete_bots(db: &Database, command: &DeleteBotCommand) -> Result<u64, ContactdError> {
    let DeleteBotCommand {
        domain_id,
        id,
        flow_id,
    } = *command;
    if id.is_none() && flow_id.is_none() {
        return Err(ContactdError::Validation(
            "bot delete requires an id or a flow id".to_string(),
        ));
    }

    let affected = db
        .call("delete bot", move |conn| {
            conn.execute(
                "DELETE FROM bots WHERE domain_id = ?1 \
                 AND (?2 IS NULL OR id = ?2) AND (?3 IS NULL OR flow_id = ?3)",
                params![domain_id, id.map(|id| id.to_string()), flow_id],
            )
        })
        .await?;

    match id {
        Some(id) if affected == 0 => Err(ContactdError::NotFound(format!(
            "bot {id} in domain {domain_id}"
        ))),
        _ => Ok(affected as u64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn create_and_find_by_flow() {
        let db = setup_db().await;
        let created = create_bot(&db, &WebitelBot::new(1, 100, "Support")).await.unwrap();

        let rows = search_bots(&db, &BotSearchFilter::new(1).with_flow_ids([100]))
            .await
            .unwrap();
        assert_eq!(rows, vec![created]);
        assert!(search_bots(&db, &BotSearchFilter::new(2).with_flow_ids([100]))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn duplicate_flow_in_tenant_conflicts() {
        let db = setup_db().await;
        create_bot(&db, &WebitelBot::new(1, 100, "a")).await.unwrap();
        let err = create_bot(&db, &WebitelBot::new(1, 100, "b")).await.unwrap_err();
        assert!(err.is_conflict());
        create_bot(&db, &WebitelBot::new(2, 100, "a")).await.unwrap();
    }

    #[tokio::test]
    async fn non_positive_flow_is_rejected_by_schema() {
        let db = setup_db().await;
        let err = create_bot(&db, &WebitelBot::new(1, 0, "zero")).await.unwrap_err();
        assert!(err.is_validation(), "got {err}");
    }

    #[tokio::test]
    async fn display_name_patterns_and_q() {
        let db = setup_db().await;
        create_bot(&db, &WebitelBot::new(1, 1, "Sales Bot")).await.unwrap();
        create_bot(&db, &WebitelBot::new(1, 2, "support desk")).await.unwrap();
        create_bot(&db, &WebitelBot::new(1, 3, "Billing")).await.unwrap();

        let mut filter = BotSearchFilter::new(1);
        filter.display_names = vec!["s%".to_string()];
        filter.sort = "+flow_id".to_string();
        let flows: Vec<i64> = search_bots(&db, &filter)
            .await
            .unwrap()
            .iter()
            .map(|b| b.flow_id)
            .collect();
        assert_eq!(flows, vec![1, 2]);

        let mut filter = BotSearchFilter::new(1);
        filter.q = Some("BILL".to_string());
        let rows = search_bots(&db, &filter).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].flow_id, 3);
    }

    #[tokio::test]
    async fn update_coalesces_absent_fields() {
        let db = setup_db().await;
        let created = create_bot(&db, &WebitelBot::new(1, 10, "Old")).await.unwrap();

        let updated = update_bot(
            &db,
            &UpdateBotCommand::from_wire(created.id, 1, 0, "New".to_string()),
        )
        .await
        .unwrap();
        assert_eq!(updated.flow_id, 10);
        assert_eq!(updated.display_name, "New");
        assert!(updated.updated_at > created.updated_at);

        let err = update_bot(&db, &UpdateBotCommand::from_wire(created.id, 2, 11, String::new()))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn delete_requires_a_predicate() {
        let db = setup_db().await;
        let err = delete_bots(&db, &DeleteBotCommand {
            domain_id: 1,
            ..Default::default()
        })
        .await
        .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn delete_by_id_or_flow() {
        let db = setup_db().await;
        let a = create_bot(&db, &WebitelBot::new(1, 10, "a")).await.unwrap();
        create_bot(&db, &WebitelBot::new(1, 20, "b")).await.unwrap();

        let by_id = DeleteBotCommand {
            domain_id: 1,
            id: Some(a.id),
            flow_id: None,
        };
        assert_eq!(delete_bots(&db, &by_id).await.unwrap(), 1);
        assert!(delete_bots(&db, &by_id).await.unwrap_err().is_not_found());

        let by_flow = DeleteBotCommand {
            domain_id: 1,
            id: None,
            flow_id: Some(20),
        };
        assert_eq!(delete_bots(&db, &by_flow).await.unwrap(), 1);
        assert_eq!(delete_bots(&db, &by_flow).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_with_both_fields_requires_both_to_match() {
        let db = setup_db().await;
        let a = create_bot(&db, &WebitelBot::new(1, 10, "a")).await.unwrap();
        let mismatched = DeleteBotCommand {
            domain_id: 1,
            id: Some(a.id),
            flow_id: Some(99),
        };
        assert!(delete_bots(&db, &mismatched).await.unwrap_err().is_not_found());
        assert_eq!(search_bots(&db, &BotSearchFilter::new(1)).await.unwrap().len(), 1);
    }
}
