// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound domain event publishing.

use async_trait::async_trait;

use crate::error::ContactdError;
use crate::events::DomainEvent;

/// Hands a domain event to the message transport.
///
/// The event carries its own topic and timestamp. Retry and acknowledgement
/// belong to the transport; failures come back as [`ContactdError::Publish`].
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &DomainEvent) -> Result<(), ContactdError>;
}
