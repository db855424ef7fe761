//! Payment signature verification.
//!
//! The gateway signs every payment confirmation with HMAC-SHA256 over
//! `"{gateway_order_id}|{payment_id}"` using the shared key secret, and
//! delivers the tag hex-encoded. A mismatch is treated as a security
//! failure, never as a retryable customer error.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Errors from signature construction.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// The configured signing key was rejected by the MAC implementation.
    #[error("invalid payment signing key")]
    InvalidKey,
}

/// The shared secret used to verify gateway payment signatures.
#[derive(Clone)]
pub struct PaymentSignatureKey {
    secret: Vec<u8>,
}

impl PaymentSignatureKey {
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Sign the canonical input for an order/payment pair, hex-encoded.
    ///
    /// # Errors
    ///
    /// Returns an error when the configured key is rejected.
    pub fn sign(&self, gateway_order_id: &str, payment_id: &str) -> Result<String, SignatureError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| SignatureError::InvalidKey)?;

        mac.update(&signature_input(gateway_order_id, payment_id));

        Ok(encode_hex(&mac.finalize().into_bytes()))
    }

    /// Verify a hex-encoded signature in constant time.
    ///
    /// Malformed hex and key failures verify as false; this path never
    /// distinguishes *why* a signature is bad.
    #[must_use]
    pub fn verify(&self, gateway_order_id: &str, payment_id: &str, signature: &str) -> bool {
        let Some(provided) = decode_hex(signature) else {
            return false;
        };

        let Ok(mut mac) = HmacSha256::new_from_slice(&self.secret) else {
            return false;
        };

        mac.update(&signature_input(gateway_order_id, payment_id));

        mac.verify_slice(&provided).is_ok()
    }
}

impl std::fmt::Debug for PaymentSignatureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PaymentSignatureKey(**redacted**)")
    }
}

/// Canonical signed bytes: `{gateway_order_id}|{payment_id}`.
#[must_use]
pub fn signature_input(gateway_order_id: &str, payment_id: &str) -> Vec<u8> {
    format!("{gateway_order_id}|{payment_id}").into_bytes()
}

pub(crate) fn encode_hex(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";

    let mut encoded = String::with_capacity(bytes.len() * 2);

    for byte in bytes {
        encoded.push(HEX[(byte >> 4) as usize] as char);
        encoded.push(HEX[(byte & 0x0f) as usize] as char);
    }

    encoded
}

pub(crate) fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }

    let bytes = hex.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len() / 2);

    for pair in bytes.chunks_exact(2) {
        let hi = decode_hex_nibble(*pair.first()?)?;
        let lo = decode_hex_nibble(*pair.get(1)?)?;

        decoded.push((hi << 4) | lo);
    }

    Some(decoded)
}

fn decode_hex_nibble(value: u8) -> Option<u8> {
    match value {
        b'0'..=b'9' => Some(value - b'0'),
        b'a'..=b'f' => Some(value - b'a' + 10),
        b'A'..=b'F' => Some(value - b'A' + 10),
        _ => None,
    }
}
