// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound integration-event routing.
//!
//! The transport delivers raw messages over an `mpsc` channel. The router
//! matches each message's routing key against the subscribed topic pattern,
//! decodes it, and hands it to the handler. A bad message is logged and
//! counted but never stops the loop.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use contactd_config::BusConfig;
use contactd_core::{DomainDeletedHandler, DomainId};

/// A raw message as delivered by the upstream transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Routing key the message was published with.
    pub topic: String,
    pub payload: Vec<u8>,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Upstream "tenant deleted" integration event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainDeleted {
    pub domain_id: DomainId,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// AMQP topic matching: `*` matches exactly one word, `#` zero or more.
pub fn topic_matches(pattern: &str, topic: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('.').collect();
    let topic: Vec<&str> = topic.split('.').collect();
    words_match(&pattern, &topic)
}

fn words_match(pattern: &[&str], topic: &[&str]) -> bool {
    match pattern.split_first() {
        None => topic.is_empty(),
        Some((&"#", rest)) => (0..=topic.len()).any(|skip| words_match(rest, &topic[skip..])),
        Some((&"*", rest)) => !topic.is_empty() && words_match(rest, &topic[1..]),
        Some((word, rest)) => topic.first() == Some(word) && words_match(rest, &topic[1..]),
    }
}

/// What happened to one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Handled,
    /// Payload could not be decoded or carried an invalid tenant id.
    Rejected,
    /// The handler returned an error.
    Failed,
    /// No subscription matched the topic.
    Ignored,
}

/// Counters accumulated over a router run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    pub received: u64,
    pub handled: u64,
    pub rejected: u64,
    pub failed: u64,
    pub ignored: u64,
}

impl RouterStats {
    fn record(&mut self, disposition: Disposition) {
        self.received += 1;
        match disposition {
            Disposition::Handled => self.handled += 1,
            Disposition::Rejected => self.rejected += 1,
            Disposition::Failed => self.failed += 1,
            Disposition::Ignored => self.ignored += 1,
        }
    }
}

/// Routes "tenant deleted" events to a [`DomainDeletedHandler`].
pub struct InboundRouter {
    topic: String,
    queue: String,
    handler: Arc<dyn DomainDeletedHandler>,
}

impl InboundRouter {
    pub fn new(
        topic: impl Into<String>,
        queue: impl Into<String>,
        handler: Arc<dyn DomainDeletedHandler>,
    ) -> Self {
        Self {
            topic: topic.into(),
            queue: queue.into(),
            handler,
        }
    }

    /// Subscribes with the topic and queue from the bus configuration.
    pub fn from_config(config: &BusConfig, handler: Arc<dyn DomainDeletedHandler>) -> Self {
        Self::new(
            config.domain_deleted_topic.clone(),
            config.domain_deleted_queue.clone(),
            handler,
        )
    }

    /// Decode and handle one message.
    pub async fn dispatch(&self, message: &InboundMessage) -> Disposition {
        if !topic_matches(&self.topic, &message.topic) {
            debug!(topic = %message.topic, "no subscription for topic");
            return Disposition::Ignored;
        }

        let event: DomainDeleted = match serde_json::from_slice(&message.payload) {
            Ok(event) => event,
            Err(err) => {
                warn!(topic = %message.topic, queue = %self.queue, error = %err, "malformed domain deleted payload");
                return Disposition::Rejected;
            }
        };
        if event.domain_id <= 0 {
            warn!(topic = %message.topic, domain_id = event.domain_id, "domain deleted event without a valid domain id");
            return Disposition::Rejected;
        }

        match self.handler.delete_by_domain(event.domain_id).await {
            Ok(()) => {
                info!(domain_id = event.domain_id, "domain deleted event handled");
                Disposition::Handled
            }
            Err(err) => {
                error!(domain_id = event.domain_id, error = %err, "domain deleted handler failed");
                Disposition::Failed
            }
        }
    }

    /// Consume messages until `cancel` fires or the channel closes.
    pub async fn run(
        self,
        mut messages: mpsc::Receiver<InboundMessage>,
        cancel: CancellationToken,
    ) -> RouterStats {
        info!(queue = %self.queue, topic = %self.topic, "inbound router started");
        let mut stats = RouterStats::default();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                message = messages.recv() => match message {
                    Some(message) => stats.record(self.dispatch(&message).await),
                    None => break,
                },
            }
        }

        info!(
            received = stats.received,
            handled = stats.handled,
            rejected = stats.rejected,
            failed = stats.failed,
            "inbound router stopped"
        );
        stats
    }
}
