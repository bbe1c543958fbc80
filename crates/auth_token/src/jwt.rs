use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::Error;

pub const TOKEN_VERSION: u8 = 1;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthTokenHeader {
    pub alg: String,
    pub typ: String,
}

impl AuthTokenHeader {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Token class carried inside the claims. Decoding an unknown class fails
/// before the claims reach any caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenClass {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthTokenClaims {
    pub v: u8,
    pub sub: String,
    pub email: String,
    pub cls: TokenClass,
    pub iat: i64,
    pub exp: i64,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, Error> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| Error::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Create an HS256 signed auth token (JWT).
///
/// # Errors
///
/// Returns an error if the key is rejected by the MAC or claims/header JSON
/// cannot be encoded.
pub fn sign_hs256(secret: &[u8], claims: &AuthTokenClaims) -> Result<String, Error> {
    let header = AuthTokenHeader::hs256();
    let header_b64 = b64e_json(&header)?;
    let claims_b64 = b64e_json(claims)?;
    let signing_input = format!("{header_b64}.{claims_b64}");

    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| Error::InvalidKey)?;
    mac.update(signing_input.as_bytes());
    let tag = mac.finalize().into_bytes();
    let tag_b64 = Base64UrlUnpadded::encode_string(&tag);

    Ok(format!("{signing_input}.{tag_b64}"))
}

/// Verify an HS256 auth token and return its decoded claims.
///
/// The signature is checked (in constant time) before the claims are
/// decoded, so untrusted claim bytes are never parsed.
///
/// # Errors
///
/// Returns an error if:
/// - the token is malformed or contains invalid base64/json,
/// - the signature does not match,
/// - the claims fail validation (`v`, `cls`, `exp`).
pub fn verify_hs256(
    token: &str,
    secret: &[u8],
    expected_class: TokenClass,
    now_unix_seconds: i64,
) -> Result<AuthTokenClaims, Error> {
    let mut parts = token.split('.');
    let header_b64 = parts.next().ok_or(Error::TokenFormat)?;
    let claims_b64 = parts.next().ok_or(Error::TokenFormat)?;
    let tag_b64 = parts.next().ok_or(Error::TokenFormat)?;
    if parts.next().is_some() {
        return Err(Error::TokenFormat);
    }

    let header: AuthTokenHeader = b64d_json(header_b64)?;
    if header.alg != "HS256" {
        return Err(Error::UnsupportedAlg(header.alg));
    }

    let signing_input = format!("{header_b64}.{claims_b64}");
    let tag = Base64UrlUnpadded::decode_vec(tag_b64).map_err(|_| Error::Base64)?;
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| Error::InvalidKey)?;
    mac.update(signing_input.as_bytes());
    mac.verify_slice(&tag).map_err(|_| Error::InvalidSignature)?;

    let claims: AuthTokenClaims = b64d_json(claims_b64)?;
    if claims.v != TOKEN_VERSION {
        return Err(Error::InvalidVersion);
    }
    if claims.cls != expected_class {
        return Err(Error::ClassMismatch);
    }
    if claims.exp <= now_unix_seconds {
        return Err(Error::Expired);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCESS_SECRET: &[u8] = b"test-access-secret";
    const REFRESH_SECRET: &[u8] = b"test-refresh-secret";

    // Fixed clock so expiry checks are deterministic.
    const NOW: i64 = 1_700_000_000;

    fn test_claims(cls: TokenClass, ttl: i64) -> AuthTokenClaims {
        AuthTokenClaims {
            v: TOKEN_VERSION,
            sub: "11111111-2222-3333-4444-555555555555".to_string(),
            email: "ann@example.com".to_string(),
            cls,
            iat: NOW,
            exp: NOW + ttl,
        }
    }

    fn raw_token(secret: &[u8], header_json: &str, claims_json: &str) -> String {
        let header_b64 = Base64UrlUnpadded::encode_string(header_json.as_bytes());
        let claims_b64 = Base64UrlUnpadded::encode_string(claims_json.as_bytes());
        let signing_input = format!("{header_b64}.{claims_b64}");
        let mut mac = HmacSha256::new_from_slice(secret).expect("mac key");
        mac.update(signing_input.as_bytes());
        let tag_b64 = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());
        format!("{signing_input}.{tag_b64}")
    }

    #[test]
    fn sign_and_verify_round_trip() -> Result<(), Error> {
        let claims = test_claims(TokenClass::Access, 900);
        let token = sign_hs256(ACCESS_SECRET, &claims)?;

        let verified = verify_hs256(&token, ACCESS_SECRET, TokenClass::Access, NOW)?;
        assert_eq!(verified, claims);
        Ok(())
    }

    #[test]
    fn rejects_class_mismatch_even_with_matching_secret() -> Result<(), Error> {
        let token = sign_hs256(ACCESS_SECRET, &test_claims(TokenClass::Access, 900))?;
        let result = verify_hs256(&token, ACCESS_SECRET, TokenClass::Refresh, NOW);
        assert!(matches!(result, Err(Error::ClassMismatch)));
        Ok(())
    }

    #[test]
    fn rejects_wrong_secret() -> Result<(), Error> {
        let token = sign_hs256(REFRESH_SECRET, &test_claims(TokenClass::Refresh, 604_800))?;
        let result = verify_hs256(&token, ACCESS_SECRET, TokenClass::Refresh, NOW);
        assert!(matches!(result, Err(Error::InvalidSignature)));
        Ok(())
    }

    #[test]
    fn rejects_expired_token_regardless_of_signature() -> Result<(), Error> {
        let token = sign_hs256(ACCESS_SECRET, &test_claims(TokenClass::Access, 900))?;
        let result = verify_hs256(&token, ACCESS_SECRET, TokenClass::Access, NOW + 901);
        assert!(matches!(result, Err(Error::Expired)));
        Ok(())
    }

    #[test]
    fn expiry_boundary_is_exclusive() -> Result<(), Error> {
        let token = sign_hs256(ACCESS_SECRET, &test_claims(TokenClass::Access, 900))?;
        // exp == now is already expired.
        let result = verify_hs256(&token, ACCESS_SECRET, TokenClass::Access, NOW + 900);
        assert!(matches!(result, Err(Error::Expired)));
        Ok(())
    }

    #[test]
    fn rejects_tampering_in_every_segment() -> Result<(), Error> {
        let token = sign_hs256(ACCESS_SECRET, &test_claims(TokenClass::Access, 900))?;

        for index in 0..token.len() {
            if token.as_bytes()[index] == b'.' {
                continue;
            }
            let mut tampered = token.clone().into_bytes();
            tampered[index] = if tampered[index] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(tampered).expect("ascii token");
            assert!(
                verify_hs256(&tampered, ACCESS_SECRET, TokenClass::Access, NOW).is_err(),
                "tampered byte {index} was accepted"
            );
        }
        Ok(())
    }

    #[test]
    fn rejects_malformed_structure() {
        for token in ["", "a.b", "a.b.c.d", "not-a-token"] {
            assert!(verify_hs256(token, ACCESS_SECRET, TokenClass::Access, NOW).is_err());
        }
    }

    #[test]
    fn rejects_unsupported_algorithm() {
        let claims_json = serde_json::to_string(&test_claims(TokenClass::Access, 900))
            .expect("claims json");
        let token = raw_token(
            ACCESS_SECRET,
            r#"{"alg":"none","typ":"JWT"}"#,
            &claims_json,
        );
        let result = verify_hs256(&token, ACCESS_SECRET, TokenClass::Access, NOW);
        assert!(matches!(result, Err(Error::UnsupportedAlg(alg)) if alg == "none"));
    }

    #[test]
    fn rejects_claims_missing_required_fields() {
        // No email field: schema validation fails after the signature check.
        let claims_json = format!(
            r#"{{"v":1,"sub":"user-1","cls":"access","iat":{NOW},"exp":{}}}"#,
            NOW + 900
        );
        let token = raw_token(ACCESS_SECRET, r#"{"alg":"HS256","typ":"JWT"}"#, &claims_json);
        let result = verify_hs256(&token, ACCESS_SECRET, TokenClass::Access, NOW);
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn rejects_unknown_token_class() {
        let claims_json = format!(
            r#"{{"v":1,"sub":"user-1","email":"a@b.com","cls":"session","iat":{NOW},"exp":{}}}"#,
            NOW + 900
        );
        let token = raw_token(ACCESS_SECRET, r#"{"alg":"HS256","typ":"JWT"}"#, &claims_json);
        let result = verify_hs256(&token, ACCESS_SECRET, TokenClass::Access, NOW);
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn rejects_wrong_token_version() {
        let claims_json = format!(
            r#"{{"v":2,"sub":"user-1","email":"a@b.com","cls":"access","iat":{NOW},"exp":{}}}"#,
            NOW + 900
        );
        let token = raw_token(ACCESS_SECRET, r#"{"alg":"HS256","typ":"JWT"}"#, &claims_json);
        let result = verify_hs256(&token, ACCESS_SECRET, TokenClass::Access, NOW);
        assert!(matches!(result, Err(Error::InvalidVersion)));
    }
}
