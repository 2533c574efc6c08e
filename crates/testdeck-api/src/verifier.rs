// testdeck-api/src/verifier.rs
// ============================================================================
// Module: HTTP Identity Verifier
// Description: Identity-provider verification over HTTP.
// Purpose: Validate bearer credentials and extract the verified email.
// Dependencies: testdeck-core, reqwest, serde
// ============================================================================

//! ## Overview
//! The production verifier posts the raw credential to the configured
//! provider endpoint. Provider-side rejections (4xx) classify as invalid
//! credentials; transport failures, timeouts, and provider 5xx responses
//! classify as the provider being unavailable. The configured timeout bounds
//! every call so a slow provider cannot stall a request worker.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use testdeck_config::IdentityProviderConfig;
use testdeck_core::VerifiedIdentity;
use testdeck_core::interfaces::IdentityVerifier;
use testdeck_core::interfaces::VerifyError;

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Verification request body.
#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    /// Raw bearer credential under verification.
    credential: &'a str,
}

/// Verification response body.
#[derive(Debug, Deserialize)]
struct VerifyResponse {
    /// Verified email address asserted by the provider.
    #[serde(default)]
    email: String,
}

// ============================================================================
// SECTION: Verifier
// ============================================================================

/// Identity verifier backed by an HTTP provider endpoint.
pub struct HttpIdentityVerifier {
    /// Shared HTTP client with the configured timeout.
    client: reqwest::Client,
    /// Verification endpoint.
    verify_url: String,
}

impl HttpIdentityVerifier {
    /// Builds a verifier from provider configuration.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::Unavailable`] when the HTTP client cannot be
    /// constructed.
    pub fn from_config(config: &IdentityProviderConfig) -> Result<Self, VerifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| VerifyError::Unavailable(err.to_string()))?;
        Ok(Self {
            client,
            verify_url: config.verify_url.clone(),
        })
    }
}

#[async_trait]
impl IdentityVerifier for HttpIdentityVerifier {
    async fn verify(&self, raw_credential: &str) -> Result<VerifiedIdentity, VerifyError> {
        let response = self
            .client
            .post(&self.verify_url)
            .json(&VerifyRequest {
                credential: raw_credential,
            })
            .send()
            .await
            .map_err(|err| VerifyError::Unavailable(err.to_string()))?;
        let status = response.status();
        if status.is_client_error() {
            return Err(VerifyError::InvalidCredential(format!(
                "provider rejected credential: {status}"
            )));
        }
        if !status.is_success() {
            return Err(VerifyError::Unavailable(format!("provider returned {status}")));
        }
        let body: VerifyResponse = response
            .json()
            .await
            .map_err(|err| VerifyError::Unavailable(err.to_string()))?;
        if body.email.is_empty() {
            return Err(VerifyError::InvalidCredential(
                "provider asserted no email".to_string(),
            ));
        }
        Ok(VerifiedIdentity {
            email_address: body.email,
        })
    }
}
