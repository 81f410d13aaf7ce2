// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Audit logging for realm and authentication events.
//!
//! Provides structured audit events for every administrative realm
//! operation and for per-connection authentication outcomes. Events are
//! emitted through `tracing` and a bounded window of recent events is
//! retained for verification by setup/teardown code.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use parking_lot::RwLock;
use tracing::{info, warn};

/// Realm operations that are audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealmOperation {
    /// A realm was added to the registry.
    RealmAdd,
    /// A realm was removed from the registry.
    RealmRemove,
    /// A mechanism was added to a realm.
    MechanismAdd,
    /// A management interface was registered.
    InterfaceRegister,
    /// An interface was bound to a realm.
    InterfaceBind,
    /// An interface was reverted to its prior realm.
    InterfaceRevert,
    /// A connection authenticated successfully.
    AuthenticationSuccess,
    /// A connection was rejected by mechanism evaluation.
    AuthenticationRejected,
}

impl RealmOperation {
    /// Returns the operation name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            RealmOperation::RealmAdd => "realm_add",
            RealmOperation::RealmRemove => "realm_remove",
            RealmOperation::MechanismAdd => "mechanism_add",
            RealmOperation::InterfaceRegister => "interface_register",
            RealmOperation::InterfaceBind => "interface_bind",
            RealmOperation::InterfaceRevert => "interface_revert",
            RealmOperation::AuthenticationSuccess => "authentication_success",
            RealmOperation::AuthenticationRejected => "authentication_rejected",
        }
    }

    /// Returns the severity level for this operation.
    pub fn severity(&self) -> AuditSeverity {
        match self {
            RealmOperation::RealmAdd => AuditSeverity::Info,
            RealmOperation::RealmRemove => AuditSeverity::Warning,
            RealmOperation::MechanismAdd => AuditSeverity::Info,
            RealmOperation::InterfaceRegister => AuditSeverity::Info,
            RealmOperation::InterfaceBind => AuditSeverity::Warning,
            RealmOperation::InterfaceRevert => AuditSeverity::Warning,
            RealmOperation::AuthenticationSuccess => AuditSeverity::Info,
            RealmOperation::AuthenticationRejected => AuditSeverity::Critical,
        }
    }
}

/// Severity levels for audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AuditSeverity {
    /// Informational event.
    Info,
    /// Warning event - a security configuration changed.
    Warning,
    /// Error event - operation failed.
    Error,
    /// Critical event - access denied.
    Critical,
}

impl AuditSeverity {
    /// Returns the severity as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditSeverity::Info => "INFO",
            AuditSeverity::Warning => "WARN",
            AuditSeverity::Error => "ERROR",
            AuditSeverity::Critical => "CRITICAL",
        }
    }
}

/// An audit event for a realm operation.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: u64,
    /// Timestamp of the event.
    pub timestamp: SystemTime,
    /// The operation that occurred.
    pub operation: RealmOperation,
    /// The realm or interface the operation applies to.
    pub subject: String,
    /// Optional additional details.
    pub details: Option<String>,
    /// Optional authenticated principal.
    pub principal: Option<String>,
    /// Optional error message if the operation failed.
    pub error: Option<String>,
}

impl AuditEvent {
    /// Creates a new audit event.
    pub fn new(operation: RealmOperation, subject: String) -> Self {
        static EVENT_COUNTER: AtomicU64 = AtomicU64::new(0);

        Self {
            event_id: EVENT_COUNTER.fetch_add(1, Ordering::SeqCst),
            timestamp: SystemTime::now(),
            operation,
            subject,
            details: None,
            principal: None,
            error: None,
        }
    }

    /// Adds details to the event.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Adds the authenticated principal to the event.
    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }

    /// Adds an error message to the event.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Returns the severity of this event.
    pub fn severity(&self) -> AuditSeverity {
        if self.error.is_some() {
            self.operation.severity().max(AuditSeverity::Error)
        } else {
            self.operation.severity()
        }
    }
}

/// Number of recent events retained in memory.
const RETAINED_EVENTS: usize = 256;

/// Audit logger for realm operations.
///
/// Thread-safe logger that emits structured audit events using tracing
/// and keeps a bounded window of recent events for assertions.
pub struct AuditLogger {
    /// Service name for log attribution.
    service_name: String,
    /// Minimum severity to log.
    min_severity: AuditSeverity,
    /// Recent events, oldest first.
    retained: RwLock<VecDeque<AuditEvent>>,
}

impl AuditLogger {
    /// Creates a new audit logger.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            min_severity: AuditSeverity::Info,
            retained: RwLock::new(VecDeque::new()),
        }
    }

    /// Sets the minimum severity level to log.
    pub fn with_min_severity(mut self, severity: AuditSeverity) -> Self {
        self.min_severity = severity;
        self
    }

    /// Logs an audit event.
    pub fn log(&self, event: AuditEvent) {
        if event.severity() < self.min_severity {
            return;
        }

        match event.severity() {
            AuditSeverity::Info => {
                info!(
                    target: "audit",
                    event_id = event.event_id,
                    service = %self.service_name,
                    operation = event.operation.as_str(),
                    subject = %event.subject,
                    details = ?event.details,
                    principal = ?event.principal,
                    "realm operation completed"
                );
            }
            AuditSeverity::Warning => {
                warn!(
                    target: "audit",
                    event_id = event.event_id,
                    service = %self.service_name,
                    operation = event.operation.as_str(),
                    subject = %event.subject,
                    details = ?event.details,
                    principal = ?event.principal,
                    "security configuration changed"
                );
            }
            AuditSeverity::Error | AuditSeverity::Critical => {
                tracing::error!(
                    target: "audit",
                    event_id = event.event_id,
                    service = %self.service_name,
                    operation = event.operation.as_str(),
                    subject = %event.subject,
                    details = ?event.details,
                    principal = ?event.principal,
                    error = ?event.error,
                    severity = event.severity().as_str(),
                    "realm operation failed or denied"
                );
            }
        }

        let mut retained = self.retained.write();
        if retained.len() == RETAINED_EVENTS {
            retained.pop_front();
        }
        retained.push_back(event);
    }

    /// Creates an event and logs it immediately.
    pub fn log_operation(&self, operation: RealmOperation, subject: impl Into<String>) {
        self.log(AuditEvent::new(operation, subject.into()));
    }

    /// Logs a failed operation with an error.
    pub fn log_failure(
        &self,
        operation: RealmOperation,
        subject: impl Into<String>,
        error: impl Into<String>,
    ) {
        self.log(AuditEvent::new(operation, subject.into()).with_error(error));
    }

    /// Returns the retained recent events, oldest first.
    pub fn recent(&self) -> Vec<AuditEvent> {
        self.retained.read().iter().cloned().collect()
    }
}
