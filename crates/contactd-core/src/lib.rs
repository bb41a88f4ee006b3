// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the contactd directory.
//!
//! Holds the entities, filters and commands that cross every boundary, the
//! error taxonomy, the column allowlists that keep dynamic SQL safe, the
//! over-fetch pagination window, domain events, and the traits that stores
//! and publishers implement.

pub mod error;
pub mod events;
pub mod filter;
pub mod paging;
pub mod query;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{ContactdError, ErrorKind};
pub use events::DomainEvent;
pub use filter::{
    BotSearchFilter, CanSendQuery, ContactSearchFilter, DeleteBotCommand, DeleteContactCommand,
    EnsureBotRequest, UpdateBotCommand, UpdateContactCommand,
};
pub use paging::{Page, PagingWindow};
pub use query::{BotColumn, Column, ContactColumn, Projection, SortClause};
pub use traits::{BotStore, ContactStore, DomainDeletedHandler, EventPublisher, UpsertResult};
pub use types::{Contact, ContactType, DomainId, Outcome, WebitelBot};
