// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Server identity: the cryptographic material a realm presents during SSL.

use std::path::PathBuf;
use std::sync::Arc;

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::keystore::RealmKeystore;

/// A password or other secret string.
///
/// Zeroized on drop and redacted from Debug output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    /// Creates a new secret.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret value.
    ///
    /// # Security
    ///
    /// The returned slice references material that is zeroized when this
    /// secret is dropped. Do not store copies.
    #[inline]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

/// Immutable description of a process's SSL server identity.
///
/// Construction never touches the filesystem: the keystore is resolved
/// lazily, the first time the owning realm is bound to a live interface.
/// Clones share the resolved key material, so binding the same identity
/// to several interfaces loads the keystore exactly once.
#[derive(Debug, Clone)]
pub struct ServerIdentity {
    keystore_path: PathBuf,
    keystore_password: Secret,
    key_password: Option<Secret>,
    keystore: Arc<RealmKeystore>,
}

impl ServerIdentity {
    /// Creates a new server identity for the given keystore.
    ///
    /// The keystore is a PEM bundle holding the server certificate chain
    /// and the private key. The key may be stored as an encrypted PKCS#8
    /// block, opened with the key password (or the keystore password when
    /// no separate key password is set).
    pub fn new(keystore_path: impl Into<PathBuf>, keystore_password: impl Into<Secret>) -> Self {
        Self {
            keystore_path: keystore_path.into(),
            keystore_password: keystore_password.into(),
            key_password: None,
            keystore: Arc::new(RealmKeystore::new()),
        }
    }

    /// Sets a separate password for the private key entry.
    pub fn with_key_password(mut self, password: impl Into<Secret>) -> Self {
        self.key_password = Some(password.into());
        self
    }

    /// Returns the keystore path.
    #[inline]
    pub fn keystore_path(&self) -> &std::path::Path {
        &self.keystore_path
    }

    /// Returns the password that opens the private key entry.
    pub(crate) fn effective_key_password(&self) -> &Secret {
        self.key_password.as_ref().unwrap_or(&self.keystore_password)
    }

    /// Returns the shared keystore loader for this identity.
    #[inline]
    pub fn keystore(&self) -> &Arc<RealmKeystore> {
        &self.keystore
    }
}
