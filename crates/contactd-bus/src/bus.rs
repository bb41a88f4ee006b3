// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast publisher for contact domain events.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use contactd_core::{ContactdError, DomainEvent, EventPublisher};

/// A published event as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// Unique message id, assigned at publish time.
    pub id: Uuid,
    pub topic: &'static str,
    pub occurred_at: DateTime<Utc>,
    pub entity_id: Uuid,
    /// JSON body of the event.
    pub payload: serde_json::Value,
}

impl Envelope {
    pub fn from_event(event: &DomainEvent) -> Result<Self, ContactdError> {
        let payload = event
            .payload()
            .map_err(|e| ContactdError::publish(event.topic(), e))?;
        Ok(Self {
            id: Uuid::new_v4(),
            topic: event.topic(),
            occurred_at: event.occurred_at(),
            entity_id: event.entity_id(),
            payload,
        })
    }
}

/// In-process event bus backed by a broadcast channel.
///
/// Each subscriber sees every event published after it subscribed. A
/// subscriber that falls more than `capacity` events behind skips the
/// oldest ones and observes `RecvError::Lagged`.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Arc<Envelope>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Envelope>> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl EventPublisher for EventBus {
    /// Publishing with no live subscribers drops the event and succeeds.
    async fn publish(&self, event: &DomainEvent) -> Result<(), ContactdError> {
        let envelope = Arc::new(Envelope::from_event(event)?);
        let topic = envelope.topic;
        let entity_id = envelope.entity_id;
        match self.sender.send(envelope) {
            Ok(receivers) => debug!(topic, %entity_id, receivers, "event published"),
            Err(_) => debug!(topic, %entity_id, "event dropped, no subscribers"),
        }
        Ok(())
    }
}
