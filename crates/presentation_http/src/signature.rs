//! Webhook signature verification
//!
//! Callbacks from the delayed-callback service carry an HMAC-SHA256
//! signature over the raw body, formatted `sha256=<hex>`. Two signing keys
//! are accepted - the current one and, during rotation, the next one.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tracing::warn;

use infrastructure::config::WebhookConfig;

type HmacSha256 = Hmac<Sha256>;

/// The signing key pair callbacks are verified against
#[derive(Clone)]
pub struct SigningKeys {
    current: SecretString,
    next: Option<SecretString>,
}

impl std::fmt::Debug for SigningKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeys")
            .field("has_next", &self.next.is_some())
            .finish_non_exhaustive()
    }
}

impl SigningKeys {
    /// Build a key pair
    #[must_use]
    pub const fn new(current: SecretString, next: Option<SecretString>) -> Self {
        Self { current, next }
    }

    /// Extract the key pair from webhook configuration, if configured
    #[must_use]
    pub fn from_config(config: &WebhookConfig) -> Option<Self> {
        config
            .signing_key
            .clone()
            .map(|current| Self::new(current, config.next_signing_key.clone()))
    }
}

/// Verify a webhook signature against the key pair
///
/// The header format is `sha256=<hex>`. The current key is tried first,
/// then the rotation key.
#[must_use]
pub fn verify_signature(payload: &[u8], signature: &str, keys: &SigningKeys) -> bool {
    let expected_prefix = "sha256=";
    let Some(signature_hex) = signature.strip_prefix(expected_prefix) else {
        warn!("Invalid signature format");
        return false;
    };

    let Ok(expected) = hex::decode(signature_hex) else {
        warn!("Failed to decode signature hex");
        return false;
    };

    verify_with_key(payload, &expected, &keys.current)
        || keys
            .next
            .as_ref()
            .is_some_and(|next| verify_with_key(payload, &expected, next))
}

fn verify_with_key(payload: &[u8], expected: &[u8], key: &SecretString) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(key.expose_secret().as_bytes()) else {
        warn!("Failed to create HMAC");
        return false;
    };
    mac.update(payload);
    mac.verify_slice(expected).is_ok()
}
