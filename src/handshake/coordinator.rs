// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Per-connection handshake driving: SSL negotiation, then mechanism
//! evaluation against the realm bound at accept time.

use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use rustls::pki_types::CertificateDer;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::server::TlsStream;
use tracing::{debug, warn};

use crate::audit::{AuditEvent, AuditLogger, RealmOperation};
use crate::binding::{ActiveRealm, InterfaceBinding};
use crate::realm::{AuthenticationMechanism, ClientCredentials, Verdict};

use super::error::HandshakeError;
use super::session::AuthenticatedSession;

/// Default deadline for the complete handshake, SSL negotiation and
/// credential exchange included.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on one credential line in the post-handshake exchange.
const MAX_CREDENTIAL_LINE: usize = 256;

/// A management connection, possibly wrapped in TLS.
pub enum ManagementStream {
    /// Plain TCP; the bound realm has no server identity.
    Plain(TcpStream),
    /// TLS-wrapped; the server presented the realm's certificate.
    Tls(Box<TlsStream<TcpStream>>),
}

impl ManagementStream {
    /// Whether the connection is TLS-protected.
    pub fn is_tls(&self) -> bool {
        matches!(self, ManagementStream::Tls(_))
    }

    /// The end-entity certificate the peer presented, if any.
    pub fn peer_certificate(&self) -> Option<&CertificateDer<'static>> {
        match self {
            ManagementStream::Plain(_) => None,
            ManagementStream::Tls(stream) => stream
                .get_ref()
                .1
                .peer_certificates()
                .and_then(|certs| certs.first()),
        }
    }
}

impl AsyncRead for ManagementStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            ManagementStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            ManagementStream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for ManagementStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            ManagementStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            ManagementStream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            ManagementStream::Plain(s) => Pin::new(s).poll_flush(cx),
            ManagementStream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            ManagementStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            ManagementStream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

impl std::fmt::Debug for ManagementStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManagementStream::Plain(_) => f.write_str("ManagementStream::Plain"),
            ManagementStream::Tls(_) => f.write_str("ManagementStream::Tls"),
        }
    }
}

/// Drives the handshake for each inbound connection on one interface.
///
/// Runs per-connection with no shared mutable per-handshake state. The
/// interface binding is consulted exactly once, at entry, so a
/// concurrent rebind affects only connections accepted afterwards.
pub struct HandshakeCoordinator {
    binding: Arc<InterfaceBinding>,
    timeout: Duration,
    audit: Option<Arc<AuditLogger>>,
}

impl HandshakeCoordinator {
    /// Creates a coordinator for the given interface binding.
    pub fn new(binding: Arc<InterfaceBinding>) -> Self {
        Self {
            binding,
            timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            audit: None,
        }
    }

    /// Sets the handshake deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the audit logger for authentication outcomes.
    pub fn with_audit(mut self, audit: Arc<AuditLogger>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Performs the handshake for one accepted connection.
    ///
    /// Order: SSL negotiation (one-way: only the server certificate is
    /// required), then mechanism evaluation in the realm's declared
    /// order. The whole sequence runs under the configured deadline;
    /// expiry aborts the connection with no partial state retained.
    pub async fn handshake(
        &self,
        stream: TcpStream,
    ) -> Result<(ManagementStream, AuthenticatedSession), HandshakeError> {
        let peer_addr = stream.peer_addr()?;
        let active = self.binding.snapshot().ok_or(HandshakeError::NoBinding)?;

        let result = match tokio::time::timeout(
            self.timeout,
            self.drive(stream, peer_addr, &active),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(HandshakeError::Timeout),
        };

        match &result {
            Ok((_, session)) => {
                debug!(
                    interface = %self.binding.name(),
                    realm = session.realm_name(),
                    principal = session.principal(),
                    peer = %peer_addr,
                    "connection authenticated"
                );
                if let Some(audit) = &self.audit {
                    audit.log(
                        AuditEvent::new(
                            RealmOperation::AuthenticationSuccess,
                            session.realm_name().to_string(),
                        )
                        .with_principal(session.principal())
                        .with_details(format!("peer={peer_addr}")),
                    );
                }
            }
            Err(err) => {
                warn!(
                    interface = %self.binding.name(),
                    peer = %peer_addr,
                    error = %err,
                    "connection rejected"
                );
                if let Some(audit) = &self.audit {
                    audit.log(
                        AuditEvent::new(
                            RealmOperation::AuthenticationRejected,
                            active.realm().name().to_string(),
                        )
                        .with_details(format!("peer={peer_addr}"))
                        .with_error(err.to_string()),
                    );
                }
            }
        }

        result
    }

    async fn drive(
        &self,
        stream: TcpStream,
        peer_addr: SocketAddr,
        active: &ActiveRealm,
    ) -> Result<(ManagementStream, AuthenticatedSession), HandshakeError> {
        let mut stream = match active.acceptor() {
            Some(acceptor) => {
                let tls = acceptor
                    .accept(stream)
                    .await
                    .map_err(|e| HandshakeError::Negotiation(e.to_string()))?;
                ManagementStream::Tls(Box::new(tls))
            }
            None => ManagementStream::Plain(stream),
        };

        let session = self.authenticate(active, &mut stream, peer_addr).await?;
        Ok((stream, session))
    }

    /// Evaluates the realm's mechanisms in order; first grant wins, an
    /// explicit denial ends evaluation, and a realm where nothing
    /// applies rejects the connection.
    async fn authenticate(
        &self,
        active: &ActiveRealm,
        stream: &mut ManagementStream,
        peer_addr: SocketAddr,
    ) -> Result<AuthenticatedSession, HandshakeError> {
        let mut denial: Option<String> = None;

        for mechanism in active.realm().mechanisms() {
            let verdict = match mechanism {
                AuthenticationMechanism::Local { .. } => {
                    mechanism.evaluate(peer_addr, &ClientCredentials::None)
                }
                AuthenticationMechanism::ClientCert { .. } => match stream.peer_certificate() {
                    Some(end_entity) => {
                        mechanism.evaluate(peer_addr, &ClientCredentials::Certificate { end_entity })
                    }
                    None => Verdict::NotApplicable,
                },
                AuthenticationMechanism::UsernamePassword { .. } => {
                    let username = read_line(stream, MAX_CREDENTIAL_LINE).await?;
                    let password = read_line(stream, MAX_CREDENTIAL_LINE).await?;
                    mechanism.evaluate(
                        peer_addr,
                        &ClientCredentials::Password {
                            username: &username,
                            password: &password,
                        },
                    )
                }
            };

            match verdict {
                Verdict::Granted {
                    principal,
                    groups_loaded,
                } => {
                    return Ok(AuthenticatedSession::new(
                        principal,
                        active.realm().name().to_string(),
                        peer_addr,
                        groups_loaded,
                    ));
                }
                Verdict::NotApplicable => continue,
                Verdict::Denied { reason } => {
                    denial = Some(reason);
                    break;
                }
            }
        }

        Err(HandshakeError::AuthenticationRejected {
            reason: denial.unwrap_or_else(|| "no mechanism granted access".into()),
        })
    }
}

/// Reads one bounded, newline-terminated credential line.
async fn read_line(stream: &mut ManagementStream, max: usize) -> Result<String, HandshakeError> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        if stream.read(&mut byte).await? == 0 {
            break;
        }
        match byte[0] {
            b'\n' => break,
            b'\r' => {}
            b => {
                if line.len() >= max {
                    return Err(HandshakeError::AuthenticationRejected {
                        reason: "credential line too long".into(),
                    });
                }
                line.push(b);
            }
        }
    }
    String::from_utf8(line).map_err(|_| HandshakeError::AuthenticationRejected {
        reason: "credential is not valid UTF-8".into(),
    })
}
