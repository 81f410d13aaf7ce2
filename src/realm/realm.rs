// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! The security realm aggregate.

use super::error::RealmError;
use super::identity::ServerIdentity;
use super::mechanism::AuthenticationMechanism;

/// A named bundle of zero-or-one server identity plus a set of
/// authentication mechanisms; the unit that gets bound to a management
/// interface.
///
/// Construction is purely in-memory. A syntactically valid realm may
/// still fail to activate: keystore I/O and password errors surface at
/// bind time, not here.
#[derive(Debug, Clone)]
pub struct SecurityRealm {
    name: String,
    server_identity: Option<ServerIdentity>,
    mechanisms: Vec<AuthenticationMechanism>,
}

impl SecurityRealm {
    /// Creates an empty realm with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            server_identity: None,
            mechanisms: Vec::new(),
        }
    }

    /// Sets the server identity presented during SSL handshakes.
    pub fn with_server_identity(mut self, identity: ServerIdentity) -> Self {
        self.server_identity = Some(identity);
        self
    }

    /// Adds a mechanism, builder-style.
    pub fn with_mechanism(mut self, mechanism: AuthenticationMechanism) -> Result<Self, RealmError> {
        self.add_mechanism(mechanism)?;
        Ok(self)
    }

    /// Adds an authentication mechanism to the realm.
    ///
    /// At most one mechanism of each kind may exist; a second mechanism
    /// of the same kind would claim authority over the same channel with
    /// no precedence order, so it is rejected.
    pub fn add_mechanism(&mut self, mechanism: AuthenticationMechanism) -> Result<(), RealmError> {
        let kind = mechanism.kind();
        if self.mechanisms.iter().any(|m| m.kind() == kind) {
            return Err(RealmError::ConflictingMechanism { kind });
        }
        self.mechanisms.push(mechanism);
        Ok(())
    }

    /// Returns the realm name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the server identity, if one is configured.
    #[inline]
    pub fn server_identity(&self) -> Option<&ServerIdentity> {
        self.server_identity.as_ref()
    }

    /// Returns the mechanisms in evaluation order.
    #[inline]
    pub fn mechanisms(&self) -> &[AuthenticationMechanism] {
        &self.mechanisms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realm::MechanismKind;

    fn local(default_user: &str) -> AuthenticationMechanism {
        AuthenticationMechanism::Local {
            default_user: default_user.into(),
            skip_group_loading: true,
        }
    }

    #[test]
    fn test_empty_realm() {
        let realm = SecurityRealm::new("ManagementRealm");
        assert_eq!(realm.name(), "ManagementRealm");
        assert!(realm.server_identity().is_none());
        assert!(realm.mechanisms().is_empty());
    }

    #[test]
    fn test_add_mechanism() {
        let mut realm = SecurityRealm::new("ManagementRealm");
        realm.add_mechanism(local("$local")).unwrap();
        assert_eq!(realm.mechanisms().len(), 1);
    }

    #[test]
    fn test_second_local_mechanism_conflicts() {
        let realm = SecurityRealm::new("ManagementRealm")
            .with_mechanism(local("$local"))
            .unwrap();
        let result = realm.with_mechanism(local("$other"));
        assert!(matches!(
            result,
            Err(RealmError::ConflictingMechanism {
                kind: MechanismKind::Local
            })
        ));
    }

    #[test]
    fn test_different_kinds_coexist() {
        let realm = SecurityRealm::new("ManagementRealm")
            .with_mechanism(local("$local"))
            .unwrap()
            .with_mechanism(AuthenticationMechanism::UsernamePassword {
                users: Default::default(),
            })
            .unwrap();
        assert_eq!(realm.mechanisms().len(), 2);
    }
}
