// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Applying realm definitions and interface bindings as discrete,
//! reversible administrative operations.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::instrument;

use crate::audit::{AuditLogger, RealmOperation};
use crate::binding::{BindingDescription, InterfaceBinding, RealmRegistry};
use crate::realm::{AuthenticationMechanism, RealmError, SecurityRealm};

/// Applies and retracts realm definitions and interface bindings.
///
/// Every operation is a discrete step with a compensating counterpart;
/// there is no implicit multi-step transaction. If "add realm" succeeds
/// and the following "bind interface" fails, the realm stays present and
/// unbound, and the caller issues the compensating removal. This mirrors
/// the explicit setup/teardown pairing of administrative workflows.
pub struct RealmProvisioningService {
    registry: Arc<RealmRegistry>,
    interfaces: RwLock<HashMap<String, Arc<InterfaceBinding>>>,
    audit: Option<Arc<AuditLogger>>,
}

impl RealmProvisioningService {
    /// Creates a service with an empty realm registry.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(RealmRegistry::new()),
            interfaces: RwLock::new(HashMap::new()),
            audit: None,
        }
    }

    /// Sets the audit logger for administrative operations.
    pub fn with_audit(mut self, audit: Arc<AuditLogger>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Returns the shared realm registry.
    ///
    /// Handshake coordinators receive this by reference at construction
    /// instead of reaching for ambient global state.
    pub fn registry(&self) -> Arc<RealmRegistry> {
        Arc::clone(&self.registry)
    }

    /// Adds a realm definition.
    #[instrument(skip(self, realm), fields(realm = realm.name()))]
    pub fn add_realm(&self, realm: SecurityRealm) -> Result<(), RealmError> {
        let name = realm.name().to_string();
        self.audited(RealmOperation::RealmAdd, &name, self.registry.add(realm))
    }

    /// Removes a realm; fails while any binding still references it.
    #[instrument(skip(self))]
    pub fn remove_realm(&self, name: &str) -> Result<(), RealmError> {
        self.audited(RealmOperation::RealmRemove, name, self.registry.remove(name))
    }

    /// Adds an authentication mechanism to an existing realm.
    #[instrument(skip(self, mechanism), fields(kind = %mechanism.kind()))]
    pub fn add_mechanism(
        &self,
        realm: &str,
        mechanism: AuthenticationMechanism,
    ) -> Result<(), RealmError> {
        self.audited(
            RealmOperation::MechanismAdd,
            realm,
            self.registry.add_mechanism(realm, mechanism),
        )
    }

    /// Registers a management interface, initially unbound.
    ///
    /// Registering an already-known name returns the existing binding.
    pub fn register_interface(
        &self,
        name: &str,
        address: SocketAddr,
        require_ssl: bool,
    ) -> Arc<InterfaceBinding> {
        let mut interfaces = self.interfaces.write();
        let binding = interfaces
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(InterfaceBinding::new(name, address, require_ssl)))
            .clone();
        drop(interfaces);

        if let Some(audit) = &self.audit {
            audit.log_operation(RealmOperation::InterfaceRegister, name);
        }
        binding
    }

    /// Looks up a registered interface binding.
    pub fn interface(&self, name: &str) -> Option<Arc<InterfaceBinding>> {
        self.interfaces.read().get(name).cloned()
    }

    /// Binds an interface to a named realm.
    #[instrument(skip(self))]
    pub fn bind_interface(&self, interface: &str, realm: &str) -> Result<(), RealmError> {
        let binding = self.lookup(interface)?;
        let result = binding.bind(&self.registry, realm);
        match &result {
            Ok(()) => {
                if let Some(audit) = &self.audit {
                    audit.log(
                        crate::audit::AuditEvent::new(
                            RealmOperation::InterfaceBind,
                            interface.to_string(),
                        )
                        .with_details(format!("realm={realm}")),
                    );
                }
            }
            Err(e) => {
                if let Some(audit) = &self.audit {
                    audit.log_failure(RealmOperation::InterfaceBind, interface, e.to_string());
                }
            }
        }
        result
    }

    /// Restores an interface's previous realm, single-level.
    #[instrument(skip(self))]
    pub fn revert_interface(&self, interface: &str) -> Result<(), RealmError> {
        let binding = self.lookup(interface)?;
        self.audited(
            RealmOperation::InterfaceRevert,
            interface,
            binding.revert_to_original(&self.registry),
        )
    }

    /// Discards an interface's retained revert target.
    pub fn discard_previous(&self, interface: &str) -> Result<(), RealmError> {
        let binding = self.lookup(interface)?;
        binding.discard_previous(&self.registry);
        Ok(())
    }

    /// Describes an interface's current security configuration.
    pub fn describe_binding(&self, interface: &str) -> Result<BindingDescription, RealmError> {
        Ok(self.lookup(interface)?.describe())
    }

    fn lookup(&self, interface: &str) -> Result<Arc<InterfaceBinding>, RealmError> {
        self.interfaces
            .read()
            .get(interface)
            .cloned()
            .ok_or_else(|| RealmError::UnknownInterface {
                name: interface.to_string(),
            })
    }

    fn audited(
        &self,
        operation: RealmOperation,
        subject: &str,
        result: Result<(), RealmError>,
    ) -> Result<(), RealmError> {
        if let Some(audit) = &self.audit {
            match &result {
                Ok(()) => audit.log_operation(operation, subject),
                Err(e) => audit.log_failure(operation, subject, e.to_string()),
            }
        }
        result
    }
}

impl Default for RealmProvisioningService {
    fn default() -> Self {
        Self::new()
    }
}
