// testdeck-api/src/audit.rs
// ============================================================================
// Module: Request Audit
// Description: Structured audit events for authorization decisions.
// Purpose: Record every allow/deny decision with subject and reason labels.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Authorization decisions are audited as JSON lines through an
//! [`AuditSink`]. The event payload carries the decision, the route, the
//! resolved subject when one exists, and a short reason label for denials.
//! Credential material never appears in events.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

// ============================================================================
// SECTION: Audit Events
// ============================================================================

/// Request authorization audit event payload.
#[derive(Debug, Serialize)]
pub struct RequestAuditEvent {
    /// Event identifier.
    event: &'static str,
    /// Decision outcome.
    decision: &'static str,
    /// HTTP method.
    method: String,
    /// Request path.
    path: String,
    /// Resolved subject (email), when identified.
    subject: Option<String>,
    /// Resolved role label, when identified.
    role: Option<&'static str>,
    /// Response status for denials.
    status: Option<u16>,
    /// Reason label (for deny events).
    reason: Option<String>,
}

impl RequestAuditEvent {
    /// Builds an allow event.
    #[must_use]
    pub fn allowed(
        method: &str,
        path: &str,
        subject: Option<String>,
        role: Option<&'static str>,
    ) -> Self {
        Self {
            event: "request_authz",
            decision: "allow",
            method: method.to_string(),
            path: path.to_string(),
            subject,
            role,
            status: None,
            reason: None,
        }
    }

    /// Builds a deny event.
    #[must_use]
    pub fn denied(
        method: &str,
        path: &str,
        subject: Option<String>,
        status: u16,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            event: "request_authz",
            decision: "deny",
            method: method.to_string(),
            path: path.to_string(),
            subject,
            role: None,
            status: Some(status),
            reason: Some(reason.into()),
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for authorization decisions.
pub trait AuditSink: Send + Sync {
    /// Records an audit event.
    fn record(&self, event: &RequestAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    #[allow(clippy::print_stderr, reason = "The stderr sink exists to write JSON lines there.")]
    fn record(&self, event: &RequestAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            eprintln!("{payload}");
        }
    }
}

/// No-op audit sink for tests.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &RequestAuditEvent) {}
}
