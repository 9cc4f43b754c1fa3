//! # Razorpay Configuration
//!
//! Configuration management for the Razorpay integration.
//! Secrets are loaded from environment variables and may be absent: the
//! server still starts, and payment operations report
//! `PaymentSystemUnavailable` until they are set.

use shop_core::SignatureVerifier;
use std::env;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_API_BASE_URL: &str = "https://api.razorpay.com";

/// Razorpay API configuration
#[derive(Clone)]
pub struct RazorpayConfig {
    /// Public key id (rzp_test_... or rzp_live_...)
    pub key_id: Option<String>,

    /// Account secret; also the callback signing key
    pub key_secret: Option<String>,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// Per-request HTTP timeout
    pub timeout: Duration,
}

impl RazorpayConfig {
    /// Load configuration from environment variables.
    ///
    /// Read env vars:
    /// - `RAZORPAY_KEY_ID`
    /// - `RAZORPAY_KEY_SECRET`
    /// - `RAZORPAY_API_BASE_URL` (optional)
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let key_id = non_empty("RAZORPAY_KEY_ID");
        let key_secret = non_empty("RAZORPAY_KEY_SECRET");

        if key_id.is_none() || key_secret.is_none() {
            warn!("Razorpay credentials not set; payment operations will be unavailable");
        } else if let Some(id) = &key_id {
            if !id.starts_with("rzp_test_") && !id.starts_with("rzp_live_") {
                warn!("RAZORPAY_KEY_ID does not look like a Razorpay key id");
            }
        }

        Self {
            key_id,
            key_secret,
            api_base_url: non_empty("RAZORPAY_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            timeout: shop_core::DEFAULT_GATEWAY_TIMEOUT,
        }
    }

    /// Create config with explicit values (for testing)
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Self {
        Self {
            key_id: Some(key_id.into()),
            key_secret: Some(key_secret.into()),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: shop_core::DEFAULT_GATEWAY_TIMEOUT,
        }
    }

    /// Both halves of the credential pair are present
    pub fn is_configured(&self) -> bool {
        self.key_id.is_some() && self.key_secret.is_some()
    }

    /// Check if using test keys
    pub fn is_test_mode(&self) -> bool {
        self.key_id
            .as_deref()
            .is_some_and(|id| id.starts_with("rzp_test_"))
    }

    /// Verifier for callback signatures, if the secret is known
    pub fn signature_verifier(&self) -> Option<SignatureVerifier> {
        self.key_secret.as_deref().map(SignatureVerifier::new)
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Builder: set the HTTP timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for RazorpayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RazorpayConfig")
            .field("key_id", &self.key_id)
            .field("key_secret", &self.key_secret.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_from_lookup_with_credentials() {
        let config = RazorpayConfig::from_lookup(lookup(&[
            ("RAZORPAY_KEY_ID", "rzp_test_abc123"),
            ("RAZORPAY_KEY_SECRET", "secret"),
        ]));

        assert!(config.is_configured());
        assert!(config.is_test_mode());
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert!(config.signature_verifier().is_some());
    }

    #[test]
    fn test_missing_credentials() {
        let config = RazorpayConfig::from_lookup(lookup(&[("RAZORPAY_KEY_ID", "  ")]));

        assert!(!config.is_configured());
        assert!(config.key_id.is_none());
        assert!(config.signature_verifier().is_none());
    }

    #[test]
    fn test_base_url_override() {
        let config = RazorpayConfig::from_lookup(lookup(&[(
            "RAZORPAY_API_BASE_URL",
            "http://localhost:9000",
        )]));
        assert_eq!(config.api_base_url, "http://localhost:9000");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = RazorpayConfig::new("rzp_live_abc", "super-secret");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret"));
        assert!(!config.is_test_mode());
    }
}
