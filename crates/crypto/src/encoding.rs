//! Wire encodings shared by tokens and event signatures.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Encode bytes as unpadded base64url.
pub fn base64url_encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode unpadded base64url. Padded input is rejected.
pub fn base64url_decode(input: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD.decode(input).ok()
}

/// Render bytes as lowercase hex.
pub fn hex_lower(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(bytes)
}
