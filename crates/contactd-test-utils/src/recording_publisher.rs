// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock event publisher for deterministic testing.
//!
//! `RecordingPublisher` implements `EventPublisher`, keeps every event it
//! accepted, and can be switched into a failing or stalling mode to
//! exercise the publish-after-commit path.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use contactd_core::{ContactdError, DomainEvent, EventPublisher};

/// A publisher that records instead of sending.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<DomainEvent>>,
    failing: AtomicBool,
    stalling: AtomicBool,
    attempts: AtomicUsize,
}

/// How long a stalling publisher holds each call.
const STALL: Duration = Duration::from_secs(60);

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A publisher that rejects every event.
    pub fn failing() -> Self {
        let publisher = Self::default();
        publisher.set_failing(true);
        publisher
    }

    /// Toggle failure mode. Rejected events are not recorded.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Hold every publish call far past any sane deadline.
    pub fn set_stalling(&self, stalling: bool) {
        self.stalling.store(stalling, Ordering::SeqCst);
    }

    /// All events accepted so far, in publish order.
    pub async fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().await.clone()
    }

    /// Topics of the accepted events, in publish order.
    pub async fn topics(&self) -> Vec<&'static str> {
        self.events.lock().await.iter().map(DomainEvent::topic).collect()
    }

    /// Number of publish calls, accepted or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub async fn clear(&self) {
        self.events.lock().await.clear();
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<(), ContactdError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.stalling.load(Ordering::SeqCst) {
            tokio::time::sleep(STALL).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(ContactdError::publish(
                event.topic(),
                "recording publisher is in failing mode",
            ));
        }
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn records_until_switched_to_failing() {
        let publisher = RecordingPublisher::new();
        publisher
            .publish(&DomainEvent::contact_deleted(Uuid::new_v4()))
            .await
            .unwrap();

        publisher.set_failing(true);
        let err = publisher
            .publish(&DomainEvent::contact_deleted(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, ContactdError::Publish { .. }));

        assert_eq!(publisher.topics().await, vec!["contact.deleted"]);
        assert_eq!(publisher.attempts(), 2);
    }
}
