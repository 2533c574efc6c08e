// testdeck-api/src/mailer.rs
// ============================================================================
// Module: Mailer Seam
// Description: Narrow outbound-mail interface for the identity pipeline.
// Purpose: Decouple the welcome message from any delivery mechanism.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Outbound email delivery is an external collaborator. The identity
//! pipeline only needs a fire-and-forget seam for the first-login welcome
//! message, and deliberately ignores its result: mail failures must never
//! block credential resolution.

// ============================================================================
// SECTION: Mailer
// ============================================================================

/// Outbound mail interface.
pub trait Mailer: Send + Sync {
    /// Sends a message to the recipients. Best effort.
    fn send(&self, recipients: &[String], subject: &str, body: &str);
}

/// Mailer that drops every message.
pub struct NoopMailer;

impl Mailer for NoopMailer {
    fn send(&self, _recipients: &[String], _subject: &str, _body: &str) {}
}
