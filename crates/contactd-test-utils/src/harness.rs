// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the full directory stack over a temp SQLite
//! database: stores, a recording publisher, `ContactService`, `BotManager`
//! and, on request, a running inbound router.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use contactd_bus::{InboundMessage, InboundRouter, RouterStats};
use contactd_config::{ContactdConfig, StorageConfig};
use contactd_core::ContactdError;
use contactd_service::{BotManager, ContactService};
use contactd_storage::{Database, SqliteBotStore, SqliteContactStore};

use crate::recording_publisher::RecordingPublisher;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    failing_publisher: bool,
    publish_timeout: Option<Duration>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            failing_publisher: false,
            publish_timeout: None,
        }
    }

    /// Start with a publisher that rejects every event.
    pub fn with_failing_publisher(mut self) -> Self {
        self.failing_publisher = true;
        self
    }

    /// Override `bus.publish_timeout_ms` for the contact service.
    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = Some(timeout);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, ContactdError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| ContactdError::storage("create temp dir", e))?;
        let db_path = temp_dir.path().join("contactd.db");

        let mut config = ContactdConfig {
            storage: StorageConfig::at(db_path.to_string_lossy()),
            ..ContactdConfig::default()
        };
        if let Some(timeout) = self.publish_timeout {
            config.bus.publish_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        }

        let db = Arc::new(Database::open_with(&config.storage).await?);

        let publisher = Arc::new(if self.failing_publisher {
            RecordingPublisher::failing()
        } else {
            RecordingPublisher::new()
        });

        let contacts = Arc::new(ContactService::from_config(
            &config.bus,
            Arc::new(SqliteContactStore::new(Arc::clone(&db))),
            publisher.clone(),
        ));
        let bots = Arc::new(BotManager::new(Arc::new(SqliteBotStore::new(Arc::clone(
            &db,
        )))));

        Ok(TestHarness {
            contacts,
            bots,
            publisher,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a recording publisher and temp storage.
///
/// The stores share one database handle; the temp file goes with the harness.
pub struct TestHarness {
    /// Contact service wired to the recording publisher.
    pub contacts: Arc<ContactService>,
    pub bots: Arc<BotManager>,
    /// Every event the contact service published.
    pub publisher: Arc<RecordingPublisher>,
    pub config: ContactdConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

/// Handle to an inbound router running on a background task.
pub struct RunningRouter {
    pub sender: mpsc::Sender<InboundMessage>,
    pub cancel: CancellationToken,
    task: JoinHandle<RouterStats>,
}

impl RunningRouter {
    /// Close the channel, wait for queued messages to drain, and return the counters.
    pub async fn finish(self) -> RouterStats {
        drop(self.sender);
        self.task.await.unwrap_or_default()
    }
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A harness with default settings.
    pub async fn new() -> Result<Self, ContactdError> {
        Self::builder().build().await
    }

    /// Spawn an inbound router that routes "tenant deleted" events to the contact service.
    pub fn spawn_router(&self) -> RunningRouter {
        let (sender, receiver) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        let router = InboundRouter::from_config(&self.config.bus, self.contacts.clone());
        let task = tokio::spawn(router.run(receiver, cancel.clone()));
        RunningRouter {
            sender,
            cancel,
            task,
        }
    }
}
