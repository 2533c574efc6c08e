// testdeck-config/tests/config_validation.rs
// ============================================================================
// Module: Config Validation Tests
// Description: Fail-closed validation checks for testdeck.toml parsing.
// Purpose: Pin defaults and rejection of invalid configuration.
// Dependencies: testdeck-config
// ============================================================================

//! Config parsing and validation tests.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions use unwrap for clarity."
)]

use std::io::Write;

use testdeck_config::TestdeckConfig;
use testdeck_config::config_toml_example;

#[test]
fn load_reads_a_toml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(config_toml_example().as_bytes()).unwrap();
    let config = TestdeckConfig::load(file.path()).unwrap();
    assert_eq!(config.identity.verify_url, "https://identity.example.com/v1/verify");
}

#[test]
fn example_document_parses_and_validates() {
    let config = TestdeckConfig::from_toml(config_toml_example()).unwrap();
    assert_eq!(config.server.bind_addr, "127.0.0.1:8080");
    assert_eq!(config.identity.timeout_ms, 5_000);
    assert_eq!(config.identity.provider_label, "google");
    assert!(!config.features.content_creation_limiter);
}

#[test]
fn minimal_document_applies_defaults() {
    let config = TestdeckConfig::from_toml(
        r#"
[identity]
verify_url = "https://identity.example.com/v1/verify"
"#,
    )
    .unwrap();
    assert_eq!(config.server.bind_addr, "127.0.0.1:8080");
    assert_eq!(
        config.routes.public_prefixes,
        vec!["/healthz".to_string(), "/api/invite".to_string()]
    );
    assert_eq!(config.routes.acl_exempt_prefixes, vec!["/api/invite".to_string()]);
    assert!(!config.features.content_creation_limiter);
}

#[test]
fn missing_identity_section_is_rejected() {
    assert!(TestdeckConfig::from_toml("[server]\nbind_addr = \"127.0.0.1:8080\"\n").is_err());
}

#[test]
fn invalid_bind_addr_is_rejected() {
    let result = TestdeckConfig::from_toml(
        r#"
[server]
bind_addr = "not-a-socket-addr"

[identity]
verify_url = "https://identity.example.com/v1/verify"
"#,
    );
    assert!(result.is_err());
}

#[test]
fn non_http_verify_url_is_rejected() {
    let result = TestdeckConfig::from_toml(
        r#"
[identity]
verify_url = "ftp://identity.example.com/v1/verify"
"#,
    );
    assert!(result.is_err());
}

#[test]
fn zero_verify_timeout_is_rejected() {
    let result = TestdeckConfig::from_toml(
        r#"
[identity]
verify_url = "https://identity.example.com/v1/verify"
timeout_ms = 0
"#,
    );
    assert!(result.is_err());
}

#[test]
fn route_prefixes_must_be_absolute() {
    let result = TestdeckConfig::from_toml(
        r#"
[identity]
verify_url = "https://identity.example.com/v1/verify"

[routes]
public_prefixes = ["healthz"]
"#,
    );
    assert!(result.is_err());
}

#[test]
fn root_path_exemption_is_rejected() {
    // A "/" entry would suppress every forbidden verdict in the service.
    let result = TestdeckConfig::from_toml(
        r#"
[identity]
verify_url = "https://identity.example.com/v1/verify"

[routes]
acl_exempt_prefixes = ["/"]
"#,
    );
    assert!(result.is_err());
}
