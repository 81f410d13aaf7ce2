// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Per-connection handshake error types.

/// Errors terminal for a single connection attempt.
///
/// These never reach administrative callers and never disturb the
/// interface binding or other connections.
#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    /// The interface has no active realm bound.
    #[error("no realm bound to the management interface")]
    NoBinding,

    /// Transport-level SSL negotiation failed.
    #[error("TLS negotiation failed: {0}")]
    Negotiation(String),

    /// The handshake did not complete within the configured deadline.
    #[error("handshake timed out")]
    Timeout,

    /// No authentication mechanism granted access.
    #[error("authentication rejected: {reason}")]
    AuthenticationRejected { reason: String },

    /// I/O error on the connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
