// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the contactd directory.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, cancellable calls, and the contact
//! and bot store adapters.

pub mod adapter;
pub mod database;
mod functions;
pub mod migrations;
pub mod queries;

pub use adapter::{SqliteBotStore, SqliteContactStore};
pub use database::Database;
