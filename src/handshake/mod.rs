// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Connection handshaking: SSL negotiation plus mechanism evaluation.
//!
//! The coordinator consults the interface binding once per connection
//! attempt, negotiates TLS with the bound realm's server identity, and
//! then evaluates the realm's mechanisms in order. Success yields an
//! [`AuthenticatedSession`]; every failure mode is terminal for that
//! connection only.

mod coordinator;
mod error;
mod session;

pub use coordinator::{HandshakeCoordinator, ManagementStream, DEFAULT_HANDSHAKE_TIMEOUT};
pub use error::HandshakeError;
pub use session::AuthenticatedSession;
