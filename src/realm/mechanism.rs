// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Authentication mechanisms evaluated after the transport handshake.
//!
//! Mechanisms are a closed set dispatched by pattern match, keeping the
//! per-connection path free of dynamic dispatch. Evaluation is a pure
//! function over the transport origin and whatever credentials the
//! coordinator collected for the connection.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use ring::digest;
use rustls::pki_types::CertificateDer;

/// The kind of an authentication mechanism.
///
/// A realm holds at most one mechanism of each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MechanismKind {
    /// Local-transport trust.
    Local,
    /// Username/password lookup against the realm's user table.
    UsernamePassword,
    /// Client certificate presented during the TLS handshake.
    ClientCert,
}

impl MechanismKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            MechanismKind::Local => "local",
            MechanismKind::UsernamePassword => "username-password",
            MechanismKind::ClientCert => "client-cert",
        }
    }
}

impl std::fmt::Display for MechanismKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pluggable check deciding whether a connecting principal may use the
/// management channel.
#[derive(Debug, Clone)]
pub enum AuthenticationMechanism {
    /// Trusts any caller arriving over a verified local-only transport.
    ///
    /// `skip_group_loading` grants access as `default_user` with no
    /// role resolution at all; local-transport trust is already a strong
    /// guarantee, so same-host administration stays low-friction.
    Local {
        default_user: String,
        skip_group_loading: bool,
    },
    /// Checks a username/password pair against the realm's user table.
    UsernamePassword { users: HashMap<String, String> },
    /// Accepts a peer that presented a certificate trusted by the
    /// mechanism's trust store during the TLS handshake.
    ClientCert { trust_store: PathBuf },
}

impl AuthenticationMechanism {
    /// Returns this mechanism's kind.
    pub fn kind(&self) -> MechanismKind {
        match self {
            AuthenticationMechanism::Local { .. } => MechanismKind::Local,
            AuthenticationMechanism::UsernamePassword { .. } => MechanismKind::UsernamePassword,
            AuthenticationMechanism::ClientCert { .. } => MechanismKind::ClientCert,
        }
    }

    /// Evaluates this mechanism for a single connection attempt.
    pub fn evaluate(&self, peer: SocketAddr, credentials: &ClientCredentials<'_>) -> Verdict {
        match self {
            AuthenticationMechanism::Local {
                default_user,
                skip_group_loading,
            } => {
                if !peer.ip().is_loopback() {
                    return Verdict::NotApplicable;
                }
                Verdict::Granted {
                    principal: default_user.clone(),
                    groups_loaded: !skip_group_loading,
                }
            }
            AuthenticationMechanism::UsernamePassword { users } => {
                let ClientCredentials::Password { username, password } = credentials else {
                    return Verdict::NotApplicable;
                };
                let granted = users.get(*username).is_some_and(|expected| {
                    password_matches(expected.as_bytes(), password.as_bytes())
                });
                if granted {
                    Verdict::Granted {
                        principal: (*username).to_string(),
                        groups_loaded: true,
                    }
                } else {
                    Verdict::Denied {
                        reason: "invalid username or password".into(),
                    }
                }
            }
            AuthenticationMechanism::ClientCert { .. } => {
                let ClientCredentials::Certificate { end_entity } = credentials else {
                    return Verdict::NotApplicable;
                };
                // Chain validation against the trust store already ran in
                // the TLS layer's client verifier.
                Verdict::Granted {
                    principal: certificate_fingerprint(end_entity),
                    groups_loaded: true,
                }
            }
        }
    }
}

/// Credentials the coordinator collected for one connection attempt.
#[derive(Debug)]
pub enum ClientCredentials<'a> {
    /// No in-band credentials.
    None,
    /// A username/password pair from the post-handshake exchange.
    Password { username: &'a str, password: &'a str },
    /// The end-entity certificate the peer presented during TLS.
    Certificate {
        end_entity: &'a CertificateDer<'static>,
    },
}

/// Outcome of evaluating one mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The mechanism authorizes the connection.
    Granted {
        principal: String,
        groups_loaded: bool,
    },
    /// The mechanism does not apply to this connection; later mechanisms
    /// may still grant access.
    NotApplicable,
    /// The mechanism examined credentials and rejected them.
    Denied { reason: String },
}

/// Compares a submitted password against the expected one by comparing
/// SHA-256 digests. The comparison runs over fixed-length digests, so
/// its timing does not depend on where or whether the passwords differ.
fn password_matches(expected: &[u8], submitted: &[u8]) -> bool {
    let expected = digest::digest(&digest::SHA256, expected);
    let submitted = digest::digest(&digest::SHA256, submitted);
    expected.as_ref() == submitted.as_ref()
}

/// Hex SHA-256 fingerprint of a DER-encoded certificate.
pub fn certificate_fingerprint(cert: &CertificateDer<'_>) -> String {
    let hash = digest::digest(&digest::SHA256, cert.as_ref());
    let mut out = String::with_capacity(64);
    for byte in hash.as_ref() {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_addr() -> SocketAddr {
        "127.0.0.1:9999".parse().unwrap()
    }

    fn remote_addr() -> SocketAddr {
        "192.0.2.10:9999".parse().unwrap()
    }

    fn local_mechanism() -> AuthenticationMechanism {
        AuthenticationMechanism::Local {
            default_user: "$local".into(),
            skip_group_loading: true,
        }
    }

    #[test]
    fn test_local_grants_loopback_peer() {
        let verdict = local_mechanism().evaluate(local_addr(), &ClientCredentials::None);
        assert_eq!(
            verdict,
            Verdict::Granted {
                principal: "$local".into(),
                groups_loaded: false,
            }
        );
    }

    #[test]
    fn test_local_skips_remote_peer() {
        let verdict = local_mechanism().evaluate(remote_addr(), &ClientCredentials::None);
        assert_eq!(verdict, Verdict::NotApplicable);
    }

    #[test]
    fn test_username_password_grant_and_deny() {
        let mechanism = AuthenticationMechanism::UsernamePassword {
            users: HashMap::from([("admin".to_string(), "secret".to_string())]),
        };

        let verdict = mechanism.evaluate(
            remote_addr(),
            &ClientCredentials::Password {
                username: "admin",
                password: "secret",
            },
        );
        assert!(matches!(verdict, Verdict::Granted { ref principal, .. } if principal == "admin"));

        let verdict = mechanism.evaluate(
            remote_addr(),
            &ClientCredentials::Password {
                username: "admin",
                password: "nope",
            },
        );
        assert!(matches!(verdict, Verdict::Denied { .. }));

        // Unknown user gets the same opaque reason as a bad password.
        let verdict = mechanism.evaluate(
            remote_addr(),
            &ClientCredentials::Password {
                username: "ghost",
                password: "secret",
            },
        );
        assert_eq!(
            verdict,
            Verdict::Denied {
                reason: "invalid username or password".into()
            }
        );
    }

    #[test]
    fn test_password_comparison() {
        assert!(password_matches(b"secret", b"secret"));
        assert!(!password_matches(b"secret", b"secre"));
        assert!(!password_matches(b"secret", b""));
    }

    #[test]
    fn test_username_password_needs_credentials() {
        let mechanism = AuthenticationMechanism::UsernamePassword {
            users: HashMap::new(),
        };
        let verdict = mechanism.evaluate(remote_addr(), &ClientCredentials::None);
        assert_eq!(verdict, Verdict::NotApplicable);
    }

    #[test]
    fn test_client_cert_principal_is_fingerprint() {
        let mechanism = AuthenticationMechanism::ClientCert {
            trust_store: "/trust.pem".into(),
        };
        let cert = CertificateDer::from(vec![0x30, 0x82, 0x01, 0x02]);

        let verdict = mechanism.evaluate(
            remote_addr(),
            &ClientCredentials::Certificate { end_entity: &cert },
        );
        let Verdict::Granted { principal, .. } = verdict else {
            panic!("expected grant");
        };
        assert_eq!(principal.len(), 64);
        assert_eq!(principal, certificate_fingerprint(&cert));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(MechanismKind::Local.as_str(), "local");
        assert_eq!(
            MechanismKind::UsernamePassword.as_str(),
            "username-password"
        );
        assert_eq!(MechanismKind::ClientCert.as_str(), "client-cert");
    }
}
