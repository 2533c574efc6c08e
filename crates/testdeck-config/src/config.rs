// testdeck-config/src/config.rs
// ============================================================================
// Module: Testdeck Configuration
// Description: Configuration loading and validation for the Testdeck service.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: testdeck-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file. Missing sections fall back to
//! documented defaults; invalid values fail closed before the service binds
//! a socket. The route-classification prefix lists live here so that the
//! public allow-list and the ACL-exempt list are explicit, reviewable
//! configuration rather than scattered constants.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;
use testdeck_store_sqlite::SqliteStoreConfig;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted config file size in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 256 * 1024;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Testdeck service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TestdeckConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Datastore configuration.
    #[serde(default)]
    pub database: SqliteStoreConfig,
    /// Identity-provider configuration.
    pub identity: IdentityProviderConfig,
    /// Feature gates consumed as booleans.
    #[serde(default)]
    pub features: FeatureConfig,
    /// Route-classification prefix lists.
    #[serde(default)]
    pub routes: RouteConfig,
}

impl TestdeckConfig {
    /// Loads configuration from the given TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when reading, parsing, or validation fails.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.identity.validate()?;
        self.routes.validate()?;
        Ok(())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address the server binds.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

impl ServerConfig {
    /// Validates the server section.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid(format!("invalid bind_addr: {}", self.bind_addr)))?;
        Ok(())
    }
}

/// Identity-provider configuration.
///
/// # Invariants
/// - `verify_url` must be an absolute http(s) URL.
/// - `timeout_ms` bounds every provider call so a slow provider cannot stall
///   a request worker indefinitely.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityProviderConfig {
    /// Verification endpoint receiving the raw credential.
    pub verify_url: String,
    /// Per-call timeout in milliseconds.
    #[serde(default = "default_verify_timeout_ms")]
    pub timeout_ms: u64,
    /// Provider label recorded on cached credentials.
    #[serde(default = "default_provider_label")]
    pub provider_label: String,
}

impl IdentityProviderConfig {
    /// Validates the identity section.
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.verify_url.starts_with("http://") && !self.verify_url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "identity verify_url must be http(s): {}",
                self.verify_url
            )));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "identity timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.provider_label.is_empty() {
            return Err(ConfigError::Invalid(
                "identity provider_label must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Feature gates consumed as plain booleans.
///
/// Flag evaluation itself belongs to an external collaborator; only the
/// resolved boolean is configuration here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureConfig {
    /// Gates creation endpoints behind subscription-tier quotas.
    #[serde(default)]
    pub content_creation_limiter: bool,
}

/// Route-classification prefix lists.
///
/// # Invariants
/// - Every prefix is non-empty and starts with `/`.
/// - `acl_exempt_prefixes` only ever suppresses a forbidden verdict after
///   ACL evaluation; it is scoped to the invitation routes by default and
///   must not contain `/`, which would disable enforcement everywhere.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    /// Prefixes classified as public (no identity required).
    #[serde(default = "default_public_prefixes")]
    pub public_prefixes: Vec<String>,
    /// Prefixes where a forbidden ACL verdict is suppressed.
    #[serde(default = "default_acl_exempt_prefixes")]
    pub acl_exempt_prefixes: Vec<String>,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            public_prefixes: default_public_prefixes(),
            acl_exempt_prefixes: default_acl_exempt_prefixes(),
        }
    }
}

impl RouteConfig {
    /// Validates the route section.
    fn validate(&self) -> Result<(), ConfigError> {
        for prefix in self.public_prefixes.iter().chain(&self.acl_exempt_prefixes) {
            if !prefix.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "route prefix must start with '/': {prefix}"
                )));
            }
        }
        if self.acl_exempt_prefixes.iter().any(|prefix| prefix == "/") {
            return Err(ConfigError::Invalid(
                "acl_exempt_prefixes must not contain the root path".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Returns the default bind address.
fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

/// Returns the default identity-provider timeout.
const fn default_verify_timeout_ms() -> u64 {
    5_000
}

/// Returns the default provider label.
fn default_provider_label() -> String {
    "google".to_string()
}

/// Returns the default public prefix allow-list.
fn default_public_prefixes() -> Vec<String> {
    vec!["/healthz".to_string(), "/api/invite".to_string()]
}

/// Returns the default ACL-exempt prefix list.
fn default_acl_exempt_prefixes() -> Vec<String> {
    vec!["/api/invite".to_string()]
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}
