// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Authenticated session tokens.

use std::net::SocketAddr;
use std::time::SystemTime;

use uuid::Uuid;

/// Token for a connection that passed the handshake and mechanism
/// evaluation.
///
/// The trust decision is made once, against the realm bound at the
/// moment the connection was accepted; a later rebind does not revoke
/// the session.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    id: Uuid,
    principal: String,
    realm_name: String,
    peer_addr: SocketAddr,
    groups_loaded: bool,
    established_at: SystemTime,
}

impl AuthenticatedSession {
    pub(crate) fn new(
        principal: String,
        realm_name: String,
        peer_addr: SocketAddr,
        groups_loaded: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            principal,
            realm_name,
            peer_addr,
            groups_loaded,
            established_at: SystemTime::now(),
        }
    }

    /// Returns the unique session id.
    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the authenticated principal.
    #[inline]
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Returns the name of the realm that authenticated the session.
    #[inline]
    pub fn realm_name(&self) -> &str {
        &self.realm_name
    }

    /// Returns the remote endpoint.
    #[inline]
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Whether group resolution ran for this session.
    ///
    /// False when a Local mechanism granted access with
    /// `skip_group_loading` set.
    #[inline]
    pub fn groups_loaded(&self) -> bool {
        self.groups_loaded
    }

    /// Returns when the session was established.
    #[inline]
    pub fn established_at(&self) -> SystemTime {
        self.established_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_unique() {
        let addr: SocketAddr = "127.0.0.1:9990".parse().unwrap();
        let a = AuthenticatedSession::new("$local".into(), "ManagementRealm".into(), addr, false);
        let b = AuthenticatedSession::new("$local".into(), "ManagementRealm".into(), addr, false);

        assert_ne!(a.id(), b.id());
        assert_eq!(a.principal(), "$local");
        assert_eq!(a.realm_name(), "ManagementRealm");
        assert!(!a.groups_loaded());
    }
}
