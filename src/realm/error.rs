// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Realm error types.

use std::path::PathBuf;

use super::mechanism::MechanismKind;

/// Errors raised by realm definition and activation.
///
/// Definition-time errors (`DuplicateRealm`, `ConflictingMechanism`) are
/// rejected before any state changes. Activation-time errors (keystore
/// and TLS failures) surface when a realm is bound to an interface and
/// leave the prior binding untouched.
#[derive(Debug, thiserror::Error)]
pub enum RealmError {
    /// A realm with this name already exists in the registry.
    #[error("realm already exists: {name}")]
    DuplicateRealm { name: String },

    /// The realm already carries a mechanism of this kind.
    #[error("realm already has a {kind} mechanism")]
    ConflictingMechanism { kind: MechanismKind },

    /// No realm with this name is registered.
    #[error("unknown realm: {name}")]
    UnknownRealm { name: String },

    /// No interface with this name is registered.
    #[error("unknown interface: {name}")]
    UnknownInterface { name: String },

    /// The realm is still referenced by one or more interface bindings.
    #[error("realm is still bound to an interface: {name}")]
    RealmInUse { name: String },

    /// There is no previous binding to revert to.
    #[error("no prior binding to revert to")]
    NoPriorBinding,

    /// The interface requires SSL but the realm has no server identity.
    #[error("realm {realm} has no server identity but the interface requires SSL")]
    MissingServerIdentity { realm: String },

    /// Keystore certificate loading failed.
    #[error("failed to load keystore from {path}: {reason}")]
    KeystoreLoad { path: PathBuf, reason: String },

    /// Private key loading failed.
    #[error("failed to load private key from {path}: {reason}")]
    PrivateKeyLoad { path: PathBuf, reason: String },

    /// The private key is encrypted and the supplied password does not open it.
    #[error("wrong password for private key in {path}")]
    BadKeyPassword { path: PathBuf },

    /// TLS configuration error.
    #[error("TLS configuration error: {0}")]
    TlsConfig(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rustls::Error> for RealmError {
    fn from(err: rustls::Error) -> Self {
        RealmError::TlsConfig(err.to_string())
    }
}
