// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Orchestration services for the contactd directory.
//!
//! [`ContactService`] validates input, calls the contact store and emits one
//! domain event per successful mutation. [`BotManager`] does the same for
//! bots, without events, and adds idempotent get-or-create provisioning.

pub mod bots;
pub mod contacts;
mod validate;

pub use bots::BotManager;
pub use contacts::ContactService;
