// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! The live, swappable association between a listener and a realm.

use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::RwLock;
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info};

use crate::realm::{load_certs, AuthenticationMechanism, RealmError, SecurityRealm};

use super::registry::RealmRegistry;

/// A realm that has been activated for serving: its keystore resolved
/// and, when an identity is present, a TLS acceptor built from it.
pub struct ActiveRealm {
    realm: Arc<SecurityRealm>,
    acceptor: Option<TlsAcceptor>,
}

impl ActiveRealm {
    /// Activates a realm, surfacing keystore and TLS errors.
    ///
    /// This is where a syntactically valid realm can still fail: missing
    /// keystore file, wrong key password, unusable certificates.
    fn activate(realm: Arc<SecurityRealm>, require_ssl: bool) -> Result<Self, RealmError> {
        let acceptor = match realm.server_identity() {
            Some(identity) => {
                let material = identity
                    .keystore()
                    .resolve(identity.keystore_path(), identity.effective_key_password())?;

                let certs = material.certs().to_vec();
                let key = material.clone_key();

                // A ClientCert mechanism means the acceptor should request
                // (but not require) a client certificate; the mechanism
                // decides post-handshake, so other mechanisms still apply.
                let client_cert = realm
                    .mechanisms()
                    .iter()
                    .find_map(|m| match m {
                        AuthenticationMechanism::ClientCert { trust_store } => Some(trust_store),
                        _ => None,
                    });

                let config = if let Some(trust_store) = client_cert {
                    let mut roots = RootCertStore::empty();
                    for cert in load_certs(trust_store)? {
                        roots.add(cert).map_err(|e| RealmError::KeystoreLoad {
                            path: trust_store.clone(),
                            reason: e.to_string(),
                        })?;
                    }
                    let verifier = WebPkiClientVerifier::builder(Arc::new(roots))
                        .allow_unauthenticated()
                        .build()
                        .map_err(|e| RealmError::TlsConfig(e.to_string()))?;
                    ServerConfig::builder()
                        .with_client_cert_verifier(verifier)
                        .with_single_cert(certs, key)?
                } else {
                    ServerConfig::builder()
                        .with_no_client_auth()
                        .with_single_cert(certs, key)?
                };

                Some(TlsAcceptor::from(Arc::new(config)))
            }
            None if require_ssl => {
                return Err(RealmError::MissingServerIdentity {
                    realm: realm.name().to_string(),
                })
            }
            None => None,
        };

        Ok(Self { realm, acceptor })
    }

    /// Returns the activated realm.
    #[inline]
    pub fn realm(&self) -> &SecurityRealm {
        &self.realm
    }

    /// Returns the TLS acceptor, if the realm carries a server identity.
    #[inline]
    pub fn acceptor(&self) -> Option<&TlsAcceptor> {
        self.acceptor.as_ref()
    }
}

impl std::fmt::Debug for ActiveRealm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveRealm")
            .field("realm", &self.realm.name())
            .field("ssl", &self.acceptor.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
struct BindingState {
    active: Option<Arc<ActiveRealm>>,
    previous: Option<Arc<ActiveRealm>>,
}

/// Answer to the `describe` query on an interface binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingDescription {
    /// Name of the active realm, or None while unbound.
    pub realm_name: Option<String>,
    /// Whether the active realm presents a server certificate.
    pub server_identity_present: bool,
}

/// A management interface and the realm currently governing it.
///
/// The active realm is the one piece of state written from the
/// administrative path while read from concurrent handshakes. Writers
/// swap a fully-activated `Arc<ActiveRealm>` under the lock; readers
/// snapshot it once per connection attempt, so a rebind can never be
/// observed as a torn mix of old and new realm fields and never affects
/// connections already past their snapshot.
#[derive(Debug)]
pub struct InterfaceBinding {
    name: String,
    address: SocketAddr,
    require_ssl: bool,
    state: RwLock<BindingState>,
}

impl InterfaceBinding {
    /// Creates an unbound interface.
    pub fn new(name: impl Into<String>, address: SocketAddr, require_ssl: bool) -> Self {
        Self {
            name: name.into(),
            address,
            require_ssl,
            state: RwLock::new(BindingState::default()),
        }
    }

    /// Returns the interface name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the listener address.
    #[inline]
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Binds this interface to a named realm.
    ///
    /// Activation (keystore resolution, acceptor construction) runs
    /// before the binding's state is touched, so a failed bind leaves
    /// the current binding exactly as it was. On success the displaced realm is
    /// retained as the revert target; any older revert target is
    /// discarded. In-flight sessions authenticated under the old realm
    /// keep their prior trust decision.
    pub fn bind(&self, registry: &RealmRegistry, realm_name: &str) -> Result<(), RealmError> {
        // Lookup and reference count move together: the realm is
        // reserved before activation starts keystore I/O, so a
        // concurrent remove cannot unregister it mid-bind.
        let realm = registry
            .retain_realm(realm_name)
            .ok_or_else(|| RealmError::UnknownRealm {
                name: realm_name.to_string(),
            })?;
        let activated = match ActiveRealm::activate(realm, self.require_ssl) {
            Ok(activated) => Arc::new(activated),
            Err(e) => {
                registry.release(realm_name);
                return Err(e);
            }
        };

        let displaced = {
            let mut state = self.state.write();
            let displaced = state.previous.take();
            state.previous = state.active.take();
            state.active = Some(activated);
            displaced
        };
        if let Some(old) = displaced {
            registry.release(old.realm().name());
        }

        info!(
            interface = %self.name,
            realm = realm_name,
            "management interface rebound"
        );
        Ok(())
    }

    /// Restores the previous binding, single-level.
    ///
    /// The revert target was activated when it was first bound, so this
    /// never re-reads the keystore and cannot fail with an activation
    /// error; only the absence of a prior binding is an error.
    pub fn revert_to_original(&self, registry: &RealmRegistry) -> Result<(), RealmError> {
        let displaced = {
            let mut state = self.state.write();
            let previous = state.previous.take().ok_or(RealmError::NoPriorBinding)?;
            state.active.replace(previous)
        };
        if let Some(old) = &displaced {
            registry.release(old.realm().name());
        }

        info!(interface = %self.name, "management interface reverted to prior realm");
        Ok(())
    }

    /// Drops the retained revert target, if any.
    pub fn discard_previous(&self, registry: &RealmRegistry) {
        let discarded = self.state.write().previous.take();
        if let Some(old) = discarded {
            debug!(interface = %self.name, realm = old.realm().name(), "revert target discarded");
            registry.release(old.realm().name());
        }
    }

    /// Snapshots the active realm for one connection attempt.
    pub fn snapshot(&self) -> Option<Arc<ActiveRealm>> {
        self.state.read().active.clone()
    }

    /// Describes the current binding for setup/verification callers.
    pub fn describe(&self) -> BindingDescription {
        let state = self.state.read();
        BindingDescription {
            realm_name: state.active.as_ref().map(|a| a.realm().name().to_string()),
            server_identity_present: state
                .active
                .as_ref()
                .is_some_and(|a| a.realm().server_identity().is_some()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realm::{Secret, ServerIdentity};
    use crate::testutil::{init_crypto_provider, write_keystore, TEST_KEYSTORE_PASSWORD};
    use tempfile::TempDir;

    fn addr() -> SocketAddr {
        "127.0.0.1:9990".parse().unwrap()
    }

    fn registry_with(realms: &[SecurityRealm]) -> RealmRegistry {
        let registry = RealmRegistry::new();
        for realm in realms {
            registry.add(realm.clone()).unwrap();
        }
        registry
    }

    #[test]
    fn test_unbound_describe() {
        let binding = InterfaceBinding::new("native", addr(), false);
        assert_eq!(
            binding.describe(),
            BindingDescription {
                realm_name: None,
                server_identity_present: false,
            }
        );
        assert!(binding.snapshot().is_none());
    }

    #[test]
    fn test_bind_without_identity() {
        let registry = registry_with(&[SecurityRealm::new("PlainRealm")]);
        let binding = InterfaceBinding::new("native", addr(), false);

        binding.bind(&registry, "PlainRealm").unwrap();
        let description = binding.describe();
        assert_eq!(description.realm_name.as_deref(), Some("PlainRealm"));
        assert!(!description.server_identity_present);
    }

    #[test]
    fn test_bind_with_identity() {
        init_crypto_provider();
        let dir = TempDir::new().unwrap();
        let keystore = write_keystore(&dir);

        let realm = SecurityRealm::new("ManagementRealm").with_server_identity(
            ServerIdentity::new(&keystore, TEST_KEYSTORE_PASSWORD),
        );
        let registry = registry_with(&[realm]);
        let binding = InterfaceBinding::new("native", addr(), true);

        binding.bind(&registry, "ManagementRealm").unwrap();
        let description = binding.describe();
        assert_eq!(description.realm_name.as_deref(), Some("ManagementRealm"));
        assert!(description.server_identity_present);
        assert!(binding.snapshot().unwrap().acceptor().is_some());
    }

    #[test]
    fn test_bind_unknown_realm_leaves_state_unchanged() {
        let registry = registry_with(&[SecurityRealm::new("PlainRealm")]);
        let binding = InterfaceBinding::new("native", addr(), false);
        binding.bind(&registry, "PlainRealm").unwrap();

        let result = binding.bind(&registry, "Unknown");
        assert!(matches!(result, Err(RealmError::UnknownRealm { .. })));
        assert_eq!(binding.describe().realm_name.as_deref(), Some("PlainRealm"));

        // The failed bind did not record a revert target either.
        assert!(matches!(
            binding.revert_to_original(&registry),
            Err(RealmError::NoPriorBinding)
        ));
    }

    #[test]
    fn test_realm_cannot_be_removed_during_bind() {
        // The bind path reserves the realm at lookup time; a remove
        // issued in the window before activation completes is rejected
        // instead of leaving the interface bound to an unregistered
        // realm.
        let registry = registry_with(&[SecurityRealm::new("Racy")]);

        let reserved = registry.retain_realm("Racy").unwrap();
        assert!(matches!(
            registry.remove("Racy"),
            Err(RealmError::RealmInUse { .. })
        ));
        drop(reserved);
        registry.release("Racy");

        // Once actually bound, the realm stays both registered and
        // removable only after the binding lets go of it.
        let binding = InterfaceBinding::new("native", addr(), false);
        binding.bind(&registry, "Racy").unwrap();
        assert!(registry.get("Racy").is_some());
        assert!(matches!(
            registry.remove("Racy"),
            Err(RealmError::RealmInUse { .. })
        ));
    }

    #[test]
    fn test_activation_failure_releases_registry_reference() {
        init_crypto_provider();
        let broken = SecurityRealm::new("Broken").with_server_identity(ServerIdentity::new(
            "/nonexistent/server.keystore",
            "secret",
        ));
        let registry = registry_with(&[broken]);
        let binding = InterfaceBinding::new("native", addr(), false);

        assert!(binding.bind(&registry, "Broken").is_err());
        // The reservation taken at lookup was returned on failure.
        registry.remove("Broken").unwrap();
    }

    #[test]
    fn test_activation_failure_leaves_state_unchanged() {
        init_crypto_provider();
        let broken = SecurityRealm::new("Broken").with_server_identity(ServerIdentity::new(
            "/nonexistent/server.keystore",
            "secret",
        ));
        let registry = registry_with(&[SecurityRealm::new("PlainRealm"), broken]);
        let binding = InterfaceBinding::new("native", addr(), false);
        binding.bind(&registry, "PlainRealm").unwrap();

        let result = binding.bind(&registry, "Broken");
        assert!(matches!(result, Err(RealmError::KeystoreLoad { .. })));
        assert_eq!(binding.describe().realm_name.as_deref(), Some("PlainRealm"));
    }

    #[test]
    fn test_ssl_interface_requires_identity() {
        let registry = registry_with(&[SecurityRealm::new("PlainRealm")]);
        let binding = InterfaceBinding::new("native", addr(), true);

        let result = binding.bind(&registry, "PlainRealm");
        assert!(matches!(
            result,
            Err(RealmError::MissingServerIdentity { .. })
        ));
        assert!(binding.snapshot().is_none());
    }

    #[test]
    fn test_rebind_and_revert_restores_first_realm() {
        let registry = registry_with(&[SecurityRealm::new("First"), SecurityRealm::new("Second")]);
        let binding = InterfaceBinding::new("native", addr(), false);

        binding.bind(&registry, "First").unwrap();
        binding.bind(&registry, "Second").unwrap();
        assert_eq!(binding.describe().realm_name.as_deref(), Some("Second"));

        binding.revert_to_original(&registry).unwrap();
        assert_eq!(binding.describe().realm_name.as_deref(), Some("First"));

        // Single-level undo: a second revert has nothing to restore.
        assert!(matches!(
            binding.revert_to_original(&registry),
            Err(RealmError::NoPriorBinding)
        ));
    }

    #[test]
    fn test_bound_realm_cannot_be_removed() {
        let registry = registry_with(&[SecurityRealm::new("First"), SecurityRealm::new("Second")]);
        let binding = InterfaceBinding::new("native", addr(), false);

        binding.bind(&registry, "First").unwrap();
        assert!(matches!(
            registry.remove("First"),
            Err(RealmError::RealmInUse { .. })
        ));

        // Displaced to the revert slot, it is still referenced.
        binding.bind(&registry, "Second").unwrap();
        assert!(matches!(
            registry.remove("First"),
            Err(RealmError::RealmInUse { .. })
        ));

        binding.discard_previous(&registry);
        registry.remove("First").unwrap();
    }

    #[test]
    fn test_snapshot_survives_rebind() {
        let registry = registry_with(&[SecurityRealm::new("First"), SecurityRealm::new("Second")]);
        let binding = InterfaceBinding::new("native", addr(), false);

        binding.bind(&registry, "First").unwrap();
        let snapshot = binding.snapshot().unwrap();

        binding.bind(&registry, "Second").unwrap();
        // A connection that snapshotted before the rebind keeps its realm.
        assert_eq!(snapshot.realm().name(), "First");
        assert_eq!(binding.snapshot().unwrap().realm().name(), "Second");
    }

    #[test]
    fn test_shared_identity_loads_keystore_once() {
        init_crypto_provider();
        let dir = TempDir::new().unwrap();
        let keystore = write_keystore(&dir);
        let identity = ServerIdentity::new(&keystore, Secret::new(TEST_KEYSTORE_PASSWORD));

        let realm_a =
            SecurityRealm::new("RealmA").with_server_identity(identity.clone());
        let realm_b =
            SecurityRealm::new("RealmB").with_server_identity(identity.clone());
        let registry = registry_with(&[realm_a, realm_b]);

        let native = Arc::new(InterfaceBinding::new("native", addr(), true));
        let http = Arc::new(InterfaceBinding::new(
            "http",
            "127.0.0.1:9993".parse().unwrap(),
            true,
        ));

        let registry = Arc::new(registry);
        let handles = [
            ("native", Arc::clone(&native), "RealmA"),
            ("http", Arc::clone(&http), "RealmB"),
        ]
        .map(|(_, binding, realm)| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || binding.bind(&registry, realm).unwrap())
        });
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(identity.keystore().load_count(), 1);
    }
}
