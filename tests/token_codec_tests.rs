use bearer_posts::token::{self, Claims, TokenCodec, TokenError};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::json;
use std::time::Duration;

// --- Helper Functions ---

const TEST_SECRET: &[u8] = b"test-secret-value-1234567890";
const OTHER_SECRET: &[u8] = b"a-completely-different-secret";

fn codec() -> TokenCodec {
    TokenCodec::new(TEST_SECRET)
}

// Replaces the first character of the signature segment with a different one.
fn tamper_signature(token: &str) -> String {
    let (message, signature) = token.rsplit_once('.').unwrap();
    let mut chars: Vec<char> = signature.chars().collect();
    chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
    format!("{}.{}", message, chars.into_iter().collect::<String>())
}

// --- Tests ---

#[test]
fn test_round_trip_returns_claims_unchanged() {
    let mut claims = Claims::for_subject("Audrey", None);
    claims.extra.insert("role".to_string(), json!("editor"));
    claims.extra.insert("teams".to_string(), json!(["red", "blue"]));

    let token = codec().issue(&claims).unwrap();
    let verified = codec().verify(&token).unwrap();

    assert_eq!(verified, claims);
}

#[test]
fn test_round_trip_through_free_functions() {
    let claims = Claims::new("Rodrigo");
    let token = token::issue(&claims, TEST_SECRET).unwrap();
    assert_eq!(token::verify(&token, TEST_SECRET).unwrap(), claims);
}

#[test]
fn test_issue_is_deterministic_for_same_claims() {
    let claims = Claims {
        iat: Some(1_700_000_000),
        ..Claims::new("Audrey")
    };
    assert_eq!(codec().issue(&claims).unwrap(), codec().issue(&claims).unwrap());
}

#[test]
fn test_issue_rejects_empty_subject() {
    let result = codec().issue(&Claims::new(""));
    assert_eq!(result.unwrap_err(), TokenError::EmptySubject);
}

#[test]
fn test_token_is_three_segment_compact_form() {
    let token = codec().issue(&Claims::new("Audrey")).unwrap();
    assert_eq!(token.split('.').count(), 3);
    assert!(!token.contains("test-secret"));
}

#[test]
fn test_verify_with_wrong_secret_is_invalid_signature() {
    let token = token::issue(&Claims::new("Audrey"), TEST_SECRET).unwrap();
    let result = token::verify(&token, OTHER_SECRET);
    assert_eq!(result.unwrap_err(), TokenError::InvalidSignature);
}

#[test]
fn test_verify_tampered_signature_is_invalid_signature() {
    let token = codec().issue(&Claims::new("Audrey")).unwrap();
    let result = codec().verify(&tamper_signature(&token));
    assert_eq!(result.unwrap_err(), TokenError::InvalidSignature);
}

#[test]
fn test_verify_forged_payload_is_rejected() {
    let token = codec().issue(&Claims::new("Audrey")).unwrap();
    let forged = codec().issue(&Claims::new("Rodrigo")).unwrap();

    // Audrey's header and signature around Rodrigo's payload.
    let parts: Vec<&str> = token.split('.').collect();
    let forged_payload = forged.split('.').nth(1).unwrap();
    let spliced = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

    assert_eq!(
        codec().verify(&spliced).unwrap_err(),
        TokenError::InvalidSignature
    );
}

#[test]
fn test_verify_expired_token() {
    let claims = Claims {
        iat: Some(Utc::now().timestamp() - 7200),
        exp: Some(Utc::now().timestamp() - 3600),
        ..Claims::new("Audrey")
    };
    let token = codec().issue(&claims).unwrap();
    assert_eq!(codec().verify(&token).unwrap_err(), TokenError::Expired);
}

#[test]
fn test_verify_accepts_unexpired_token() {
    let claims = Claims::for_subject("Audrey", Some(Duration::from_secs(3600)));
    let token = codec().issue(&claims).unwrap();
    assert_eq!(codec().verify(&token).unwrap().sub, "Audrey");
}

#[test]
fn test_verify_accepts_token_without_expiry() {
    let claims = Claims::for_subject("Audrey", None);
    assert!(claims.exp.is_none());
    let token = codec().issue(&claims).unwrap();
    assert!(codec().verify(&token).unwrap().exp.is_none());
}

#[test]
fn test_for_subject_sets_expiry_from_ttl() {
    let claims = Claims::for_subject("Audrey", Some(Duration::from_secs(900)));
    assert_eq!(claims.exp.unwrap() - claims.iat.unwrap(), 900);
}

#[test]
fn test_verify_malformed_tokens() {
    for garbage in ["", "not-a-token", "only.two", "%%%.%%%.%%%"] {
        assert_eq!(
            codec().verify(garbage).unwrap_err(),
            TokenError::Malformed,
            "expected Malformed for {garbage:?}"
        );
    }
}

#[test]
fn test_verify_rejects_other_algorithm() {
    let token = encode(
        &Header::new(Algorithm::HS512),
        &Claims::new("Audrey"),
        &EncodingKey::from_secret(TEST_SECRET),
    )
    .unwrap();
    assert_eq!(
        codec().verify(&token).unwrap_err(),
        TokenError::InvalidSignature
    );
}

#[test]
fn test_debug_and_errors_never_show_secret() {
    let rendered = format!("{:?}", codec());
    assert!(!rendered.contains("test-secret"));

    for error in [
        TokenError::Malformed,
        TokenError::InvalidSignature,
        TokenError::Expired,
        TokenError::EmptySubject,
        TokenError::ReservedClaim("exp".to_string()),
        TokenError::Encoding,
    ] {
        assert!(!error.to_string().contains("test-secret"));
    }
}

#[test]
fn test_issue_rejects_extra_claims_shadowing_registered_ones() {
    for name in ["sub", "iat", "exp"] {
        let mut claims = Claims::new("Audrey");
        claims.extra.insert(name.to_string(), json!(1));
        assert_eq!(
            codec().issue(&claims).unwrap_err(),
            TokenError::ReservedClaim(name.to_string())
        );
    }
}

#[test]
fn test_round_trip_with_audience_extra_claim() {
    let mut claims = Claims::new("Audrey");
    claims.extra.insert("aud".to_string(), json!("posts-api"));
    claims.extra.insert("nbf".to_string(), json!(0));

    let token = codec().issue(&claims).unwrap();
    assert_eq!(codec().verify(&token).unwrap(), claims);
}

#[test]
fn test_for_subject_with_huge_ttl_never_expires_in_the_past() {
    let claims = Claims::for_subject("Audrey", Some(Duration::from_secs(u64::MAX)));
    assert!(claims.exp.unwrap() > claims.iat.unwrap());

    let token = codec().issue(&claims).unwrap();
    assert_eq!(codec().verify(&token).unwrap(), claims);
}

#[test]
fn test_expiry_boundary_is_exclusive() {
    let exp = 1_800_000_000;
    let claims = Claims {
        exp: Some(exp),
        ..Claims::new("Audrey")
    };
    let token = codec().issue(&claims).unwrap();

    assert_eq!(codec().verify_at(&token, exp - 1).unwrap(), claims);
    assert_eq!(codec().verify_at(&token, exp).unwrap_err(), TokenError::Expired);
    assert_eq!(codec().verify_at(&token, exp + 1).unwrap_err(), TokenError::Expired);
}

#[test]
fn test_signature_is_checked_before_expiry() {
    let claims = Claims {
        exp: Some(Utc::now().timestamp() - 3600),
        ..Claims::new("Audrey")
    };
    let token = token::issue(&claims, OTHER_SECRET).unwrap();
    assert_eq!(
        codec().verify(&token).unwrap_err(),
        TokenError::InvalidSignature
    );
}
