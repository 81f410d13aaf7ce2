// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Security realm model: server identity, keystore, and mechanisms.
//!
//! A realm is a named, composable bundle of authentication mechanisms
//! plus an optional X.509 server identity. Realms are plain values until
//! bound to a management interface; all filesystem and TLS work is
//! deferred to activation.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    SecurityRealm                     │
//! ├──────────────────────────┬───────────────────────────┤
//! │      ServerIdentity      │  AuthenticationMechanism  │
//! │  (keystore + passwords)  │  Local │ Password │ Cert  │
//! └────────────┬─────────────┴───────────────────────────┘
//!              │
//!       ┌──────┴───────┐
//!       │ RealmKeystore │  lazy, cached PEM resolution
//!       └──────────────┘
//! ```

mod error;
mod identity;
mod keystore;
mod mechanism;
#[allow(clippy::module_inception)]
mod realm;

pub use error::RealmError;
pub use identity::{Secret, ServerIdentity};
pub use keystore::{KeyMaterial, RealmKeystore};
pub use mechanism::{
    certificate_fingerprint, AuthenticationMechanism, ClientCredentials, MechanismKind, Verdict,
};
pub use realm::SecurityRealm;

pub(crate) use keystore::load_certs;
