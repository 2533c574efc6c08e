// testdeck-config/src/examples.rs
// ============================================================================
// Module: Testdeck Config Examples
// Description: Deterministic example configuration document.
// Purpose: Provide a canonical testdeck.toml the test suite parses.
// Dependencies: none
// ============================================================================

//! ## Overview
//! The example document doubles as documentation and as a fixture: the
//! config tests parse it and assert that it validates with the documented
//! defaults intact.

/// Returns the canonical example `testdeck.toml` document.
#[must_use]
pub const fn config_toml_example() -> &'static str {
    r#"# Testdeck service configuration.

[server]
bind_addr = "127.0.0.1:8080"

[database]
path = "testdeck.db"
busy_timeout_ms = 5000
journal_mode = "wal"
sync_mode = "full"

[identity]
verify_url = "https://identity.example.com/v1/verify"
timeout_ms = 5000
provider_label = "google"

[features]
content_creation_limiter = false

[routes]
public_prefixes = ["/healthz", "/api/invite"]
acl_exempt_prefixes = ["/api/invite"]
"#
}
