// SPDX-FileCopyrightText: 2026 Contactd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Internal typed event bus for the contactd directory.
//!
//! [`EventBus`] fans published domain events out to in-process subscribers
//! over a `tokio::sync::broadcast` channel. [`InboundRouter`] consumes
//! integration events from an upstream transport and dispatches the
//! "tenant deleted" event to a [`contactd_core::DomainDeletedHandler`].

pub mod bus;
pub mod inbound;

pub use bus::{Envelope, EventBus};
pub use inbound::{
    Disposition, DomainDeleted, InboundMessage, InboundRouter, RouterStats, topic_matches,
};
