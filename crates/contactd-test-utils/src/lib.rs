// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for contactd integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic tests against a temporary SQLite database.
//!
//! # Components
//!
//! - [`RecordingPublisher`] - Captures published events, can be switched to fail
//! - [`TestHarness`] - Temp storage, stores and services wired together
//! - [`fixtures`] - Ready-made contacts, bots and inbound messages

pub mod fixtures;
pub mod harness;
pub mod recording_publisher;

pub use harness::{RunningRouter, TestHarness, TestHarnessBuilder};
pub use recording_publisher::RecordingPublisher;
