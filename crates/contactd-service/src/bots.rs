// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bot management and idempotent per-flow provisioning.

use std::sync::Arc;

use tracing::{debug, info, warn};

use contactd_core::{
    BotSearchFilter, BotStore, ContactdError, DeleteBotCommand, EnsureBotRequest, Page,
    UpdateBotCommand, WebitelBot,
};

use crate::validate;

/// Validates bot requests and delegates to a [`BotStore`].
pub struct BotManager {
    store: Arc<dyn BotStore>,
}

impl BotManager {
    pub fn new(store: Arc<dyn BotStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, bot: &WebitelBot) -> Result<WebitelBot, ContactdError> {
        validate::require_domain(bot.domain_id)
            .and_then(|()| validate::require_flow(bot.flow_id))
            .inspect_err(|e| warn!(domain_id = bot.domain_id, error = %e, "rejected bot create"))?;
        let created = self.store.create(bot).await?;
        info!(domain_id = created.domain_id, flow_id = created.flow_id, bot_id = %created.id, "bot created");
        Ok(created)
    }

    /// Search bots and split the over-fetched rows into one page.
    pub async fn search(&self, filter: &BotSearchFilter) -> Result<Page<WebitelBot>, ContactdError> {
        validate::require_domain(filter.domain_id)
            .inspect_err(|e| warn!(error = %e, "rejected bot search"))?;
        let rows = self.store.search(filter).await?;
        Ok(filter.window().split(rows))
    }

    pub async fn update(&self, command: &UpdateBotCommand) -> Result<WebitelBot, ContactdError> {
        validate::require_domain(command.domain_id)
            .and_then(|()| validate::require_id("bot", command.id))
            .and_then(|()| command.flow_id.map_or(Ok(()), validate::require_flow))
            .inspect_err(|e| {
                warn!(domain_id = command.domain_id, bot_id = %command.id, error = %e, "rejected bot update")
            })?;
        self.store.update(command).await
    }

    /// Delete by id and/or flow id. At least one is required.
    pub async fn delete(&self, command: &DeleteBotCommand) -> Result<(), ContactdError> {
        validate::require_domain(command.domain_id)
            .and_then(|()| match (command.id, command.flow_id) {
                (None, None) => Err(ContactdError::Validation(
                    "bot delete requires an id or a flow id".to_string(),
                )),
                (Some(id), _) => validate::require_id("bot", id),
                (None, Some(flow_id)) => validate::require_flow(flow_id),
            })
            .inspect_err(|e| warn!(domain_id = command.domain_id, error = %e, "rejected bot delete"))?;
        self.store.delete(command).await
    }

    /// Return the tenant's bot for a flow, creating it on first use.
    ///
    /// Two concurrent calls for the same key may both miss the lookup; the
    /// `(domain_id, flow_id)` unique index lets exactly one insert win, and
    /// the loser returns the winner's row.
    pub async fn ensure_bot(&self, request: &EnsureBotRequest) -> Result<WebitelBot, ContactdError> {
        validate::require_domain(request.domain_id)
            .and_then(|()| validate::require_flow(request.flow_id))
            .inspect_err(|e| warn!(domain_id = request.domain_id, error = %e, "rejected ensure bot"))?;

        if let Some(existing) = self.find_by_flow(request).await? {
            debug!(domain_id = request.domain_id, flow_id = request.flow_id, "bot already provisioned");
            return Ok(existing);
        }

        match self
            .create(&WebitelBot::new(request.domain_id, request.flow_id, ""))
            .await
        {
            Ok(created) => Ok(created),
            Err(ContactdError::Conflict(detail)) => {
                debug!(domain_id = request.domain_id, flow_id = request.flow_id, "lost bot provisioning race");
                self.find_by_flow(request)
                    .await?
                    .ok_or(ContactdError::Conflict(detail))
            }
            Err(err) => Err(err),
        }
    }

    async fn find_by_flow(
        &self,
        request: &EnsureBotRequest,
    ) -> Result<Option<WebitelBot>, ContactdError> {
        let filter = BotSearchFilter::new(request.domain_id)
            .with_flow_ids([request.flow_id])
            .with_page(1, 1);
        Ok(self.store.search(&filter).await?.into_iter().next())
    }
}
