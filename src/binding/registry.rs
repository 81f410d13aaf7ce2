// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Process-wide registry of named security realms.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::realm::{AuthenticationMechanism, RealmError, SecurityRealm};

#[derive(Debug)]
struct RealmEntry {
    realm: Arc<SecurityRealm>,
    /// Number of binding slots (active or previous) referencing this realm.
    refs: usize,
}

/// Registry of security realms keyed by name.
///
/// Owned by the provisioning service and shared by reference with every
/// interface binding; realm names form a single process-wide namespace.
/// A realm that is still referenced by a binding cannot be removed.
#[derive(Debug, Default)]
pub struct RealmRegistry {
    realms: RwLock<HashMap<String, RealmEntry>>,
}

impl RealmRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a realm under its name.
    pub fn add(&self, realm: SecurityRealm) -> Result<(), RealmError> {
        let mut realms = self.realms.write();
        if realms.contains_key(realm.name()) {
            return Err(RealmError::DuplicateRealm {
                name: realm.name().to_string(),
            });
        }
        realms.insert(
            realm.name().to_string(),
            RealmEntry {
                realm: Arc::new(realm),
                refs: 0,
            },
        );
        Ok(())
    }

    /// Looks up a realm by name.
    pub fn get(&self, name: &str) -> Option<Arc<SecurityRealm>> {
        self.realms.read().get(name).map(|e| Arc::clone(&e.realm))
    }

    /// Removes a realm.
    ///
    /// Fails with `RealmInUse` while any interface binding still
    /// references the realm, as active or as revert target.
    pub fn remove(&self, name: &str) -> Result<(), RealmError> {
        let mut realms = self.realms.write();
        let entry = realms.get(name).ok_or_else(|| RealmError::UnknownRealm {
            name: name.to_string(),
        })?;
        if entry.refs > 0 {
            return Err(RealmError::RealmInUse {
                name: name.to_string(),
            });
        }
        realms.remove(name);
        Ok(())
    }

    /// Adds a mechanism to a registered realm.
    ///
    /// Bindings that already activated the realm keep their snapshot;
    /// the updated mechanism set applies from the next bind.
    pub fn add_mechanism(
        &self,
        name: &str,
        mechanism: AuthenticationMechanism,
    ) -> Result<(), RealmError> {
        let mut realms = self.realms.write();
        let entry = realms
            .get_mut(name)
            .ok_or_else(|| RealmError::UnknownRealm {
                name: name.to_string(),
            })?;
        let mut updated = (*entry.realm).clone();
        updated.add_mechanism(mechanism)?;
        entry.realm = Arc::new(updated);
        Ok(())
    }

    /// Returns the number of registered realms.
    pub fn count(&self) -> usize {
        self.realms.read().len()
    }

    /// Looks up a realm and records a binding reference to it, under one
    /// lock acquisition.
    ///
    /// The reference is taken before the caller starts activation, so a
    /// concurrent `remove` cannot succeed in the window while keystore
    /// I/O is still running. Callers release the reference on activation
    /// failure.
    pub(crate) fn retain_realm(&self, name: &str) -> Option<Arc<SecurityRealm>> {
        let mut realms = self.realms.write();
        let entry = realms.get_mut(name)?;
        entry.refs += 1;
        Some(Arc::clone(&entry.realm))
    }

    /// Drops a binding reference to a realm.
    pub(crate) fn release(&self, name: &str) {
        if let Some(entry) = self.realms.write().get_mut(name) {
            entry.refs = entry.refs.saturating_sub(1);
        }
    }
}
