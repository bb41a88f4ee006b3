// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request-scoped search filters and mutation commands.
//!
//! Empty collections mean "no filter on this attribute".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::paging::PagingWindow;
use crate::types::DomainId;

/// Search parameters for contacts within one tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactSearchFilter {
    pub domain_id: DomainId,
    pub page: i64,
    pub size: i64,
    /// Case-insensitive substring matched against `name` or `username`.
    pub q: Option<String>,
    /// `+column` or `-column`; anything else sorts by `created_at desc`.
    pub sort: String,
    /// Columns to select; unknown names are dropped.
    pub fields: Vec<String>,
    pub ids: Vec<Uuid>,
    pub apps: Vec<String>,
    pub issuers: Vec<String>,
    pub subjects: Vec<String>,
    pub types: Vec<String>,
}

impl ContactSearchFilter {
    /// First page of ten for the given tenant.
    pub fn new(domain_id: DomainId) -> Self {
        Self {
            domain_id,
            page: 1,
            size: 10,
            ..Self::default()
        }
    }

    pub fn with_page(mut self, page: i64, size: i64) -> Self {
        self.page = page;
        self.size = size;
        self
    }

    pub fn with_q(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }

    pub fn with_ids(mut self, ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.ids = ids.into_iter().collect();
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = sort.into();
        self
    }

    pub fn window(&self) -> PagingWindow {
        PagingWindow::new(self.page, self.size)
    }

    /// The text query, if one was supplied and is not blank.
    pub fn text_query(&self) -> Option<&str> {
        self.q.as_deref().filter(|q| !q.is_empty())
    }
}

/// Search parameters for bots within one tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSearchFilter {
    pub domain_id: DomainId,
    pub page: i64,
    pub size: i64,
    /// Case-insensitive substring matched against `display_name`.
    pub q: Option<String>,
    pub sort: String,
    pub fields: Vec<String>,
    pub ids: Vec<Uuid>,
    pub flow_ids: Vec<i64>,
    /// Case-insensitive `LIKE` patterns matched against `display_name`.
    pub display_names: Vec<String>,
}

impl BotSearchFilter {
    pub fn new(domain_id: DomainId) -> Self {
        Self {
            domain_id,
            page: 1,
            size: 10,
            ..Self::default()
        }
    }

    pub fn with_page(mut self, page: i64, size: i64) -> Self {
        self.page = page;
        self.size = size;
        self
    }

    pub fn with_flow_ids(mut self, flow_ids: impl IntoIterator<Item = i64>) -> Self {
        self.flow_ids = flow_ids.into_iter().collect();
        self
    }

    pub fn window(&self) -> PagingWindow {
        PagingWindow::new(self.page, self.size)
    }

    pub fn text_query(&self) -> Option<&str> {
        self.q.as_deref().filter(|q| !q.is_empty())
    }
}

/// Partial contact update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateContactCommand {
    pub id: Uuid,
    pub domain_id: DomainId,
    pub name: Option<String>,
    pub username: Option<String>,
    pub subject_id: Option<String>,
    pub metadata: Option<BTreeMap<String, String>>,
}

impl UpdateContactCommand {
    pub fn new(domain_id: DomainId, id: Uuid) -> Self {
        Self {
            id,
            domain_id,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteContactCommand {
    pub id: Uuid,
    pub domain_id: DomainId,
}

/// Checks that both peers of a conversation exist in the tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanSendQuery {
    pub domain_id: DomainId,
    pub from: Uuid,
    pub to: Uuid,
}

/// Partial bot update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBotCommand {
    pub id: Uuid,
    pub domain_id: DomainId,
    pub flow_id: Option<i64>,
    pub display_name: Option<String>,
}

impl UpdateBotCommand {
    /// Builds an update from wire values where `0` and `""` mean "unchanged".
    pub fn from_wire(id: Uuid, domain_id: DomainId, flow_id: i64, display_name: String) -> Self {
        Self {
            id,
            domain_id,
            flow_id: (flow_id > 0).then_some(flow_id),
            display_name: (!display_name.is_empty()).then_some(display_name),
        }
    }
}

/// Deletes bots by exact id, by flow id, or by both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteBotCommand {
    pub domain_id: DomainId,
    pub id: Option<Uuid>,
    pub flow_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnsureBotRequest {
    pub domain_id: DomainId,
    pub flow_id: i64,
}
