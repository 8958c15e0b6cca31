//! Webhook signature verification.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha512;

use super::PaymentError;

/// Header carrying the hex HMAC-SHA512 of the raw body.
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Check `signature` against the body, keyed with the secret key.
///
/// # Errors
///
/// Returns [`PaymentError::InvalidSignature`] on any mismatch.
pub fn verify_signature(
    secret_key: &SecretString,
    body: &[u8],
    signature: &str,
) -> Result<(), PaymentError> {
    let expected = hex::decode(signature.trim()).map_err(|_| PaymentError::InvalidSignature)?;

    let mut mac = Hmac::<Sha512>::new_from_slice(secret_key.expose_secret().as_bytes())
        .map_err(|_| PaymentError::InvalidSignature)?;
    mac.update(body);

    // Constant-time comparison
    mac.verify_slice(&expected)
        .map_err(|_| PaymentError::InvalidSignature)
}
