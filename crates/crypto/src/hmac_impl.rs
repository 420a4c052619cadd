//! HMAC-SHA256, the one keyed primitive everything else signs with.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{CryptoError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Length in bytes of an HMAC-SHA256 tag.
pub const DIGEST_LEN: usize = 32;

/// Compute the raw HMAC-SHA256 tag.
///
/// # Arguments
/// * `key` - Secret key bytes
/// * `message` - Message to sign
///
/// # Returns
/// The 32-byte tag
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> Result<[u8; DIGEST_LEN]> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    mac.update(message);

    let mut tag = [0u8; DIGEST_LEN];
    tag.copy_from_slice(&mac.finalize().into_bytes());
    Ok(tag)
}

/// Generate HMAC-SHA256 signature.
///
/// # Returns
/// Signature as lowercase hex string
pub fn hmac_sha256_hex(key: &[u8], message: &[u8]) -> Result<String> {
    hmac_sha256(key, message).map(crate::encoding::hex_lower)
}

/// Verify a signature against an expected value.
///
/// # Arguments
/// * `signature` - The signature to verify
/// * `expected` - The expected signature, in the same encoding
///
/// # Returns
/// Ok(()) if signatures match, Err otherwise
pub fn verify_signature(signature: &str, expected: &str) -> std::result::Result<(), crate::VerifyError> {
    if crate::constant_time_compare(signature.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        Err(crate::VerifyError::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hmac_sha256_rfc4231_case_2() {
        let sig = hmac_sha256_hex(b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_hmac_sha256_hex_shape() {
        let sig = hmac_sha256_hex(b"secret", b"hello world").unwrap();

        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_empty_key_is_accepted_by_primitive() {
        // Rejecting empty secrets is the job of the token and event layers.
        assert!(hmac_sha256(b"", b"message").is_ok());
    }

    #[test]
    fn test_verify_signature_match() {
        let sig = "abc123";
        assert!(verify_signature(sig, sig).is_ok());
    }

    #[test]
    fn test_verify_signature_mismatch() {
        assert_eq!(
            verify_signature("abc123", "def456"),
            Err(crate::VerifyError::InvalidSignature)
        );
    }
}
