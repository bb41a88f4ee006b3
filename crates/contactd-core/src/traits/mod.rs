// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seams between the directory services and their external collaborators.
//!
//! All traits use `#[async_trait]` so implementations can be held as
//! `Arc<dyn Trait>` and swapped for mocks in tests.

pub mod publisher;
pub mod store;
pub mod subscriber;

pub use publisher::EventPublisher;
pub use store::{BotStore, ContactStore, UpsertResult};
pub use subscriber::DomainDeletedHandler;
