//! Compact HS256 authorization tokens.
//!
//! A token is `base64url(header).base64url(payload).base64url(tag)` where the
//! tag is HMAC-SHA256 over the first two encoded segments joined by `.`.
//! The payload carries the caller's claims plus three claims owned by this
//! module: `iat`, `exp` and `jti`.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use trustmark_crypto::token::{self, IssueOptions, VerifyOptions};
//!
//! let claims = json!({ "sub": "player-42", "role": "host" });
//! let token = token::issue(&claims, "s3cret", &IssueOptions::new(60).issued_at(1_000))
//!     .expect("valid configuration");
//!
//! let verified: token::Claims = token::verify(&token, "s3cret", &VerifyOptions::at(1_030))
//!     .expect("token is fresh");
//! assert_eq!(verified.exp, 1_060);
//! assert_eq!(verified.extra["sub"], "player-42");
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::encoding::{base64url_decode, base64url_encode};
use crate::{hmac_sha256, verify_signature, CryptoError, Result, VerifyError};

/// The only algorithm tokens are signed with.
pub const ALGORITHM: &str = "HS256";

/// The only token type accepted.
pub const TOKEN_TYPE: &str = "JWT";

/// Claim names reserved by the codec. Caller values for these are discarded.
pub const RESERVED_CLAIMS: [&str; 3] = ["iat", "exp", "jti"];

/// Token header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Signing algorithm
    pub alg: String,
    /// Token type
    pub typ: String,
}

impl Header {
    /// The fixed header every issued token carries.
    pub fn hs256() -> Self {
        Self {
            alg: ALGORITHM.to_string(),
            typ: TOKEN_TYPE.to_string(),
        }
    }
}

/// Verified claim set: the codec-owned claims plus the caller's own.
///
/// `T` defaults to an untyped JSON map; any `DeserializeOwned` record works.
/// `extra` never contains `iat`, `exp` or `jti`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Claims<T = Map<String, Value>> {
    /// Issued-at, seconds since the Unix epoch
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch
    pub exp: i64,
    /// Unique token identifier
    pub jti: String,
    /// Caller claims
    #[serde(flatten)]
    pub extra: T,
}

impl<T> Claims<T> {
    /// Seconds left before expiry at `now`, zero once expired.
    ///
    /// Saturates at `i64::MAX` for claims far apart.
    pub fn remaining_seconds(&self, now: i64) -> i64 {
        self.exp.saturating_sub(now).max(0)
    }

    /// Lifetime the token was issued with, saturating like
    /// [`Claims::remaining_seconds`].
    pub fn ttl_seconds(&self) -> i64 {
        self.exp.saturating_sub(self.iat)
    }
}

/// Options for [`issue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueOptions {
    /// Time to live; must be positive
    pub expires_in_seconds: u64,
    /// Overrides the issued-at time (defaults to now)
    pub issued_at_seconds: Option<i64>,
    /// Overrides the token identifier (defaults to a random UUID v4)
    pub token_id: Option<String>,
}

impl IssueOptions {
    /// Options for a token living `expires_in_seconds`.
    pub fn new(expires_in_seconds: u64) -> Self {
        Self {
            expires_in_seconds,
            issued_at_seconds: None,
            token_id: None,
        }
    }

    /// Pin the issued-at time.
    #[must_use]
    pub fn issued_at(mut self, seconds: i64) -> Self {
        self.issued_at_seconds = Some(seconds);
        self
    }

    /// Pin the token identifier.
    #[must_use]
    pub fn token_id(mut self, id: impl Into<String>) -> Self {
        self.token_id = Some(id.into());
        self
    }
}

/// Options for [`verify`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Overrides the current time
    pub now_seconds: Option<i64>,
}

impl VerifyOptions {
    /// Verify as of `now_seconds`.
    pub fn at(now_seconds: i64) -> Self {
        Self {
            now_seconds: Some(now_seconds),
        }
    }
}

/// Issue a signed token carrying `claims`.
///
/// `claims` must serialize to a JSON object. Any `iat`, `exp` or `jti` it
/// contains is replaced by the codec's own values.
///
/// # Errors
/// [`CryptoError::Configuration`] for an empty secret or a zero TTL,
/// [`CryptoError::Serialization`] when the claims are not a JSON object.
pub fn issue<T>(claims: &T, secret: impl AsRef<[u8]>, options: &IssueOptions) -> Result<String>
where
    T: Serialize + ?Sized,
{
    let secret = secret.as_ref();
    if secret.is_empty() {
        return Err(CryptoError::configuration("token secret must not be empty"));
    }
    if options.expires_in_seconds == 0 {
        return Err(CryptoError::configuration("expires_in_seconds must be positive"));
    }

    let ttl = i64::try_from(options.expires_in_seconds)
        .map_err(|_| CryptoError::configuration("expires_in_seconds is out of range"))?;
    let iat = options.issued_at_seconds.unwrap_or_else(crate::unix_now);
    let exp = iat
        .checked_add(ttl)
        .ok_or_else(|| CryptoError::configuration("token expiry overflows"))?;
    let jti = options
        .token_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut payload = match serde_json::to_value(claims)? {
        Value::Object(map) => map,
        _ => {
            return Err(CryptoError::Serialization(serde::ser::Error::custom(
                "claims must serialize to a JSON object",
            )));
        }
    };
    for name in RESERVED_CLAIMS {
        payload.remove(name);
    }
    payload.insert("iat".to_string(), Value::from(iat));
    payload.insert("exp".to_string(), Value::from(exp));
    payload.insert("jti".to_string(), Value::from(jti.as_str()));

    let header = base64url_encode(serde_json::to_vec(&Header::hs256())?);
    let payload = base64url_encode(serde_json::to_vec(&Value::Object(payload))?);
    let signing_input = format!("{header}.{payload}");
    let signature = base64url_encode(hmac_sha256(secret, signing_input.as_bytes())?);

    tracing::trace!(jti = %jti, exp, "issued token");
    Ok(format!("{signing_input}.{signature}"))
}

/// Verify `token` against `secret` and return its claims.
///
/// Checks run in a fixed order and the first failure is returned. The
/// signature is checked before either segment is decoded.
pub fn verify<T>(
    token: &str,
    secret: impl AsRef<[u8]>,
    options: &VerifyOptions,
) -> std::result::Result<Claims<T>, VerifyError>
where
    T: DeserializeOwned,
{
    let result = verify_inner(token, secret.as_ref(), options);
    if let Err(reason) = &result {
        tracing::debug!(reason = reason.code(), "token rejected");
    }
    result
}

fn verify_inner<T>(
    token: &str,
    secret: &[u8],
    options: &VerifyOptions,
) -> std::result::Result<Claims<T>, VerifyError>
where
    T: DeserializeOwned,
{
    if secret.is_empty() {
        return Err(VerifyError::MissingSecret);
    }

    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(VerifyError::InvalidFormat);
    };

    let signing_input = &token[..header.len() + 1 + payload.len()];
    let expected = hmac_sha256(secret, signing_input.as_bytes())
        .map(base64url_encode)
        .map_err(|_| VerifyError::InvalidSignature)?;
    verify_signature(signature, &expected)?;

    let header = decode_object(header).ok_or(VerifyError::InvalidHeader)?;
    let supported = header.get("alg").and_then(Value::as_str) == Some(ALGORITHM)
        && header.get("typ").and_then(Value::as_str) == Some(TOKEN_TYPE);
    if !supported {
        return Err(VerifyError::InvalidHeader);
    }

    let mut payload = decode_object(payload).ok_or(VerifyError::InvalidPayload)?;

    let iat = payload
        .remove("iat")
        .and_then(|v| v.as_i64())
        .ok_or(VerifyError::InvalidClaims)?;
    let exp = payload
        .remove("exp")
        .and_then(|v| v.as_i64())
        .ok_or(VerifyError::InvalidClaims)?;
    let jti = match payload.remove("jti") {
        Some(Value::String(jti)) => jti,
        _ => return Err(VerifyError::InvalidClaims),
    };

    let now = options.now_seconds.unwrap_or_else(crate::unix_now);
    if exp <= now {
        return Err(VerifyError::Expired);
    }

    let extra = serde_json::from_value(Value::Object(payload))
        .map_err(|_| VerifyError::InvalidClaims)?;

    Ok(Claims { iat, exp, jti, extra })
}

fn decode_object(segment: &str) -> Option<Map<String, Value>> {
    let bytes = base64url_decode(segment)?;
    match serde_json::from_slice(&bytes).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "test_signing_secret";

    fn issue_at(claims: &Value, iat: i64, ttl: u64) -> String {
        issue(claims, SECRET, &IssueOptions::new(ttl).issued_at(iat)).unwrap()
    }

    fn verify_at(token: &str, now: i64) -> std::result::Result<Claims, VerifyError> {
        verify(token, SECRET, &VerifyOptions::at(now))
    }

    /// Build a correctly signed token from raw JSON segments.
    fn forge(header: &str, payload: &str, secret: &str) -> String {
        let input = format!("{}.{}", base64url_encode(header), base64url_encode(payload));
        let tag = base64url_encode(hmac_sha256(secret.as_bytes(), input.as_bytes()).unwrap());
        format!("{input}.{tag}")
    }

    #[test]
    fn test_issue_and_verify() {
        let token = issue_at(&json!({"sub": "user-1", "admin": false}), 1_000, 60);
        let claims = verify_at(&token, 1_001).unwrap();

        assert_eq!(claims.iat, 1_000);
        assert_eq!(claims.exp, 1_060);
        assert!(!claims.jti.is_empty());
        assert_eq!(claims.extra.get("sub"), Some(&json!("user-1")));
        assert_eq!(claims.extra.get("admin"), Some(&json!(false)));
        assert_eq!(claims.extra.len(), 2);
    }

    #[test]
    fn test_token_shape() {
        let token = issue_at(&json!({}), 1_000, 60);
        let segments: Vec<&str> = token.split('.').collect();

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], base64url_encode(r#"{"alg":"HS256","typ":"JWT"}"#));
        // 32-byte tag, unpadded base64url
        assert_eq!(segments[2].len(), 43);
        assert!(!token.contains('='));
    }

    #[test]
    fn test_issue_is_deterministic_with_pinned_inputs() {
        let options = IssueOptions::new(60).issued_at(1_000).token_id("fixed");
        let a = issue(&json!({"sub": "x"}), SECRET, &options).unwrap();
        let b = issue(&json!({"sub": "x"}), SECRET, &options).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_generated_token_ids_are_unique() {
        let a = verify_at(&issue_at(&json!({}), 1_000, 60), 1_000).unwrap();
        let b = verify_at(&issue_at(&json!({}), 1_000, 60), 1_000).unwrap();
        assert_ne!(a.jti, b.jti);
        assert!(Uuid::parse_str(&a.jti).is_ok());
    }

    #[test]
    fn test_reserved_claims_are_overwritten() {
        let forged = json!({"iat": 0, "exp": i64::MAX, "jti": "mine", "sub": "u"});
        let options = IssueOptions::new(10).issued_at(1_000).token_id("codec");
        let token = issue(&forged, SECRET, &options).unwrap();
        let claims = verify_at(&token, 1_005).unwrap();

        assert_eq!(claims.iat, 1_000);
        assert_eq!(claims.exp, 1_010);
        assert_eq!(claims.jti, "codec");
        assert!(!claims.extra.contains_key("exp"));
    }

    #[test]
    fn test_expiry_boundary() {
        let token = issue_at(&json!({}), 1_000, 10);

        assert!(verify_at(&token, 1_009).is_ok());
        assert_eq!(verify_at(&token, 1_010).unwrap_err(), VerifyError::Expired);
        assert_eq!(verify_at(&token, 5_000).unwrap_err(), VerifyError::Expired);
    }

    #[test]
    fn test_wrong_secret() {
        let token = issue(&json!({}), "a", &IssueOptions::new(60).issued_at(1_000)).unwrap();
        let result: std::result::Result<Claims, _> = verify(&token, "b", &VerifyOptions::at(1_000));
        assert_eq!(result.unwrap_err(), VerifyError::InvalidSignature);
    }

    #[test]
    fn test_tampered_payload_is_a_signature_failure() {
        let token = issue_at(&json!({"role": "player"}), 1_000, 60);
        let dot = token.find('.').unwrap();

        for offset in 1..=token[dot + 1..].find('.').unwrap() {
            let mut bytes = token.clone().into_bytes();
            let i = dot + offset;
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();

            assert_eq!(
                verify_at(&tampered, 1_001).unwrap_err(),
                VerifyError::InvalidSignature,
                "offset {offset}"
            );
        }
    }

    #[test]
    fn test_tampered_signature() {
        let mut token = issue_at(&json!({}), 1_000, 60);
        token.push('A');
        assert_eq!(verify_at(&token, 1_001).unwrap_err(), VerifyError::InvalidSignature);
    }

    #[test]
    fn test_malformed_shapes() {
        let token = issue_at(&json!({}), 1_000, 60);
        let mut parts = token.split('.');
        let (h, p, s) = (parts.next().unwrap(), parts.next().unwrap(), parts.next().unwrap());

        for candidate in [
            String::new(),
            h.to_string(),
            format!("{h}.{p}"),
            format!("{h}.{p}.{s}.{s}"),
            format!("{token}.."),
        ] {
            assert_eq!(
                verify_at(&candidate, 1_001).unwrap_err(),
                VerifyError::InvalidFormat,
                "{candidate}"
            );
        }
    }

    #[test]
    fn test_unsupported_algorithm() {
        let token = forge(
            r#"{"alg":"HS512","typ":"JWT"}"#,
            r#"{"iat":1000,"exp":2000,"jti":"x"}"#,
            SECRET,
        );
        assert_eq!(verify_at(&token, 1_001).unwrap_err(), VerifyError::InvalidHeader);
    }

    #[test]
    fn test_header_must_be_object() {
        let token = forge(r#"["HS256","JWT"]"#, r#"{"iat":1000,"exp":2000,"jti":"x"}"#, SECRET);
        assert_eq!(verify_at(&token, 1_001).unwrap_err(), VerifyError::InvalidHeader);

        let token = forge(r#"{"alg":"HS256"}"#, r#"{"iat":1000,"exp":2000,"jti":"x"}"#, SECRET);
        assert_eq!(verify_at(&token, 1_001).unwrap_err(), VerifyError::InvalidHeader);
    }

    #[test]
    fn test_invalid_payload() {
        let header = r#"{"alg":"HS256","typ":"JWT"}"#;
        for payload in ["not json", "[1,2,3]", "\"text\""] {
            let token = forge(header, payload, SECRET);
            assert_eq!(
                verify_at(&token, 1_001).unwrap_err(),
                VerifyError::InvalidPayload,
                "{payload}"
            );
        }
    }

    #[test]
    fn test_invalid_claims() {
        let header = r#"{"alg":"HS256","typ":"JWT"}"#;
        for payload in [
            r#"{"exp":2000,"jti":"x"}"#,
            r#"{"iat":1000,"jti":"x"}"#,
            r#"{"iat":1000,"exp":2000}"#,
            r#"{"iat":"1000","exp":2000,"jti":"x"}"#,
            r#"{"iat":1000,"exp":2000,"jti":7}"#,
            r#"{"iat":1000,"exp":2000.5,"jti":"x"}"#,
        ] {
            let token = forge(header, payload, SECRET);
            assert_eq!(
                verify_at(&token, 1_001).unwrap_err(),
                VerifyError::InvalidClaims,
                "{payload}"
            );
        }
    }

    #[test]
    fn test_claims_checked_before_expiry() {
        let token = forge(
            r#"{"alg":"HS256","typ":"JWT"}"#,
            r#"{"iat":1000,"exp":"soon","jti":"x"}"#,
            SECRET,
        );
        assert_eq!(verify_at(&token, 9_999).unwrap_err(), VerifyError::InvalidClaims);
    }

    #[test]
    fn test_empty_secret() {
        let err = issue(&json!({}), "", &IssueOptions::new(60)).unwrap_err();
        assert!(err.is_configuration());

        let token = issue_at(&json!({}), 1_000, 60);
        let result: std::result::Result<Claims, _> = verify(&token, "", &VerifyOptions::at(1_001));
        assert_eq!(result.unwrap_err(), VerifyError::MissingSecret);

        // Missing secret wins even over a malformed token.
        let result: std::result::Result<Claims, _> = verify("garbage", "", &VerifyOptions::default());
        assert_eq!(result.unwrap_err(), VerifyError::MissingSecret);
    }

    #[test]
    fn test_zero_ttl_is_rejected() {
        let err = issue(&json!({}), SECRET, &IssueOptions::new(0)).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_non_object_claims_are_rejected() {
        let err = issue(&json!([1, 2]), SECRET, &IssueOptions::new(60)).unwrap_err();
        assert!(matches!(err, CryptoError::Serialization(_)));
    }

    #[test]
    fn test_typed_claims() {
        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct Session {
            sub: String,
            room: u32,
        }

        let session = Session { sub: "p1".into(), room: 7 };
        let token = issue(&session, SECRET, &IssueOptions::new(60).issued_at(1_000)).unwrap();
        let claims: Claims<Session> = verify(&token, SECRET, &VerifyOptions::at(1_010)).unwrap();

        assert_eq!(claims.extra, session);
        assert_eq!(claims.ttl_seconds(), 60);
        assert_eq!(claims.remaining_seconds(1_010), 50);

        // A claim set that does not fit the requested type
        let token = issue_at(&json!({"sub": "p1"}), 1_000, 60);
        let result: std::result::Result<Claims<Session>, _> = verify(&token, SECRET, &VerifyOptions::at(1_010));
        assert_eq!(result.unwrap_err(), VerifyError::InvalidClaims);
    }

    #[test]
    fn test_default_clock_accepts_fresh_token() {
        let token = issue(&json!({}), SECRET, &IssueOptions::new(300)).unwrap();
        let result: std::result::Result<Claims, _> = verify(&token, SECRET, &VerifyOptions::default());
        assert!(result.is_ok());
    }

    #[test]
    fn test_claim_helpers_saturate_at_extremes() {
        let token = forge(
            r#"{"alg":"HS256","typ":"JWT"}"#,
            &format!(r#"{{"iat":{},"exp":{},"jti":"x"}}"#, i64::MIN, i64::MAX),
            SECRET,
        );
        let claims = verify_at(&token, i64::MIN).unwrap();

        assert_eq!(claims.ttl_seconds(), i64::MAX);
        assert_eq!(claims.remaining_seconds(i64::MIN), i64::MAX);
        assert_eq!(claims.remaining_seconds(-10), i64::MAX);

        let claims = verify_at(&issue_at(&json!({}), 0, i64::MAX as u64), -10).unwrap();
        assert_eq!(claims.ttl_seconds(), i64::MAX);
        assert_eq!(claims.remaining_seconds(-10), i64::MAX);
        assert_eq!(claims.remaining_seconds(i64::MAX), 0);
    }

    #[test]
    fn test_claims_serialize_flat() {
        let token = issue(&json!({"sub": "u"}), SECRET, &IssueOptions::new(5).issued_at(10).token_id("t")).unwrap();
        let claims = verify_at(&token, 11).unwrap();
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value, json!({"iat": 10, "exp": 15, "jti": "t", "sub": "u"}));
    }
}
