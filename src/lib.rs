// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Realmgate: a security realm subsystem for management interfaces.
//!
//! A security realm is a named bundle of authentication mechanisms plus
//! an optional X.509 server identity. Realms are bound to live,
//! SSL-secured management interfaces and can be swapped at runtime and
//! reverted, without restarting the process or disturbing connections
//! that already authenticated.
//!
//! # Architecture
//!
//! ```text
//! RealmProvisioningService ──▶ RealmRegistry ──▶ SecurityRealm
//!          │                                        │
//!          ▼                                        ▼
//!   InterfaceBinding ◀── snapshot per ──── HandshakeCoordinator
//!   (swap / revert)       connection       (SSL + mechanisms)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use realmgate::provision::RealmProvisioningService;
//! use realmgate::realm::{AuthenticationMechanism, SecurityRealm, ServerIdentity};
//!
//! let service = RealmProvisioningService::new();
//! service.register_interface("native", "127.0.0.1:9999".parse().unwrap(), true);
//!
//! let realm = SecurityRealm::new("ManagementRealm")
//!     .with_server_identity(ServerIdentity::new("server.keystore", "secret"))
//!     .with_mechanism(AuthenticationMechanism::Local {
//!         default_user: "$local".into(),
//!         skip_group_loading: true,
//!     })
//!     .expect("fresh realm has no conflicting mechanism");
//!
//! service.add_realm(realm).expect("name is unique");
//! service
//!     .bind_interface("native", "ManagementRealm")
//!     .expect("keystore resolves");
//! ```

pub mod audit;
pub mod binding;
pub mod handshake;
pub mod provision;
pub mod realm;

#[cfg(test)]
pub(crate) mod testutil;

pub use audit::{AuditEvent, AuditLogger, AuditSeverity, RealmOperation};
pub use binding::{ActiveRealm, BindingDescription, InterfaceBinding, RealmRegistry};
pub use handshake::{
    AuthenticatedSession, HandshakeCoordinator, HandshakeError, ManagementStream,
};
pub use provision::RealmProvisioningService;
pub use realm::{
    AuthenticationMechanism, MechanismKind, RealmError, RealmKeystore, Secret, SecurityRealm,
    ServerIdentity,
};
