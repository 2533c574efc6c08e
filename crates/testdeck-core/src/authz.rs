// testdeck-core/src/authz.rs
// ============================================================================
// Module: Testdeck Access Decisions
// Description: Pure request-authorization decision logic.
// Purpose: Classify routes and map methods to acceptable access levels.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! This module holds the side-effect-free pieces of the per-request
//! authorization state machine: bearer-credential extraction, route
//! classification against prefix lists, the method-to-level mapping, and the
//! ACL verdict. The enforcement layer drives these against its stores; the
//! functions here never perform I/O, so every precedence rule is unit
//! testable in isolation.
//!
//! Decision precedence is fixed: ACL evaluation happens first, and only then
//! may a computed forbidden verdict be suppressed by the exempt-prefix list.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::access::AccessLevel;
use crate::core::access::AclEntry;

// ============================================================================
// SECTION: Credential Extraction
// ============================================================================

/// Extracts the raw bearer credential from an `Authorization` header value.
///
/// A leading `Bearer ` or `bearer ` prefix is stripped when present
/// (case-sensitive on those two forms); otherwise the whole header value is
/// treated as the credential. Empty values yield `None`.
#[must_use]
pub fn extract_credential(header: Option<&str>) -> Option<&str> {
    let raw = header?;
    let token = raw
        .strip_prefix("Bearer ")
        .or_else(|| raw.strip_prefix("bearer "))
        .unwrap_or(raw);
    if token.is_empty() { None } else { Some(token) }
}

// ============================================================================
// SECTION: Route Classification
// ============================================================================

/// Route classification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Matches the public prefix allow-list; proceeds with or without an
    /// identity, and credential errors never surface.
    Public,
    /// Requires a resolved identity.
    Private,
}

/// Returns true when the path starts with any of the prefixes.
#[must_use]
pub fn matches_prefix(path: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
}

/// Classifies a request path against the public prefix allow-list.
#[must_use]
pub fn classify_route(path: &str, public_prefixes: &[String]) -> RouteClass {
    if matches_prefix(path, public_prefixes) {
        RouteClass::Public
    } else {
        RouteClass::Private
    }
}

// ============================================================================
// SECTION: Method Mapping
// ============================================================================

/// Request methods relevant to ACL evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    /// Read access.
    Get,
    /// Update access.
    Put,
    /// Delete access.
    Delete,
    /// Any other method; no ACL evaluation applies at this layer.
    Other,
}

impl RequestMethod {
    /// Maps an HTTP method name to its ACL-relevant classification.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "GET" => Self::Get,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            _ => Self::Other,
        }
    }
}

/// Returns the acceptable levels for a method, or `None` when the method is
/// not subject to ACL evaluation.
///
/// Levels are not ordered; each method names its acceptable set explicitly.
#[must_use]
pub const fn acceptable_levels(method: RequestMethod) -> Option<&'static [AccessLevel]> {
    match method {
        RequestMethod::Get => {
            Some(&[AccessLevel::Read, AccessLevel::Modify, AccessLevel::Owner])
        }
        RequestMethod::Put => Some(&[AccessLevel::Modify, AccessLevel::Owner]),
        RequestMethod::Delete => Some(&[AccessLevel::Owner]),
        RequestMethod::Other => None,
    }
}

// ============================================================================
// SECTION: Access Verdict
// ============================================================================

/// Outcome of ACL evaluation for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessVerdict {
    /// The request may proceed to its handler.
    Allowed,
    /// The holder's level (or absence of any entry) does not satisfy the
    /// method. Callers cannot distinguish a missing object from a missing
    /// permission through this verdict.
    Forbidden,
}

/// Evaluates the looked-up ACL entry against the request method.
///
/// A missing entry is forbidden, not "object does not exist". Methods outside
/// the ACL-evaluated set are allowed here; object-level ownership for those
/// is established later by the handler.
#[must_use]
pub fn evaluate_access(method: RequestMethod, entry: Option<&AclEntry>) -> AccessVerdict {
    let Some(levels) = acceptable_levels(method) else {
        return AccessVerdict::Allowed;
    };
    match entry {
        Some(entry) if levels.contains(&entry.access) => AccessVerdict::Allowed,
        _ => AccessVerdict::Forbidden,
    }
}

/// Applies the exempt-prefix override to a computed verdict.
///
/// The override only ever suppresses a forbidden verdict; it is applied after
/// ACL evaluation, never instead of it.
#[must_use]
pub fn apply_exemption(
    verdict: AccessVerdict,
    path: &str,
    exempt_prefixes: &[String],
) -> AccessVerdict {
    match verdict {
        AccessVerdict::Forbidden if matches_prefix(path, exempt_prefixes) => AccessVerdict::Allowed,
        other => other,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
