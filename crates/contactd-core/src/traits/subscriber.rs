// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound integration event handling.

use async_trait::async_trait;

use crate::error::ContactdError;
use crate::types::DomainId;

/// Reacts to an upstream "tenant deleted" integration event.
#[async_trait]
pub trait DomainDeletedHandler: Send + Sync {
    async fn delete_by_domain(&self, domain_id: DomainId) -> Result<(), ContactdError>;
}
