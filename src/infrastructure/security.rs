// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Stateless signed tokens and credential hashing.
//!
//! A token is `payload_b64.sig_b64`: the claim set serialized as JSON,
//! base64url-encoded without padding, HMAC-SHA256 signed with the server
//! secret. Validity is established entirely by recomputing the signature
//! and checking expiry; there is no revocation list, and rotating the
//! secret invalidates every outstanding token.

use crate::domain::auth::Claims;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub fn create_token(secret: &str, subject: &str, ttl_seconds: u64) -> String {
    create_token_at(secret, subject, ttl_seconds, unix_now())
}

pub fn verify_token(secret: &str, token: &str) -> Option<Claims> {
    verify_token_at(secret, token, unix_now())
}

fn create_token_at(secret: &str, subject: &str, ttl_seconds: u64, now: u64) -> String {
    let claims = serde_json::json!({
        "sub": subject,
        "iat": now,
        "exp": now + ttl_seconds,
    });
    let payload_b64 = URL_SAFE_NO_PAD.encode(claims.to_string());
    let sig_b64 = URL_SAFE_NO_PAD.encode(sign(secret, payload_b64.as_bytes()));
    format!("{payload_b64}.{sig_b64}")
}

fn verify_token_at(secret: &str, token: &str, now: u64) -> Option<Claims> {
    let (payload_b64, sig_b64) = token.split_once('.')?;

    let expected = sign(secret, payload_b64.as_bytes());
    let provided = URL_SAFE_NO_PAD.decode(sig_b64).ok()?;
    if expected.ct_eq(&provided).unwrap_u8() != 1 {
        return None;
    }

    let payload = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
    let claims: Claims = serde_json::from_slice(&payload).ok()?;
    if claims.exp < now {
        return None;
    }
    Some(claims)
}

fn sign(secret: &str, data: &[u8]) -> Vec<u8> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Hash a password with a library-managed random salt.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn token_round_trips() {
        let now = 1_700_000_000;
        let token = create_token_at(SECRET, "42", 3600, now);
        let claims = verify_token_at(SECRET, &token, now).expect("fresh token verifies");
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.iat, now);
        assert_eq!(claims.exp, now + 3600);
    }

    #[test]
    fn token_expires_after_ttl() {
        let now = 1_700_000_000;
        let token = create_token_at(SECRET, "42", 60, now);
        assert!(verify_token_at(SECRET, &token, now + 60).is_some());
        assert!(verify_token_at(SECRET, &token, now + 61).is_none());
    }

    #[test]
    fn any_altered_character_breaks_verification() {
        let now = 1_700_000_000;
        let token = create_token_at(SECRET, "42", 3600, now);
        for (i, c) in token.char_indices() {
            if c == '.' {
                continue;
            }
            let mut tampered: Vec<char> = token.chars().collect();
            tampered[i] = if c == 'A' { 'B' } else { 'A' };
            let tampered: String = tampered.into_iter().collect();
            if tampered == token {
                continue;
            }
            assert!(
                verify_token_at(SECRET, &tampered, now).is_none(),
                "tampered byte {i} still verified"
            );
        }
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let now = 1_700_000_000;
        let token = create_token_at(SECRET, "42", 3600, now);
        assert!(verify_token_at("other-secret", &token, now).is_none());
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        let now = 1_700_000_000;
        assert!(verify_token_at(SECRET, "", now).is_none());
        assert!(verify_token_at(SECRET, "no-separator", now).is_none());
        assert!(verify_token_at(SECRET, "a.b.c", now).is_none());
        assert!(verify_token_at(SECRET, "!!!.???", now).is_none());
    }

    #[test]
    fn password_hashes_are_salted_yet_both_verify() {
        let first = hash_password("hunter2").unwrap();
        let second = hash_password("hunter2").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("hunter2", &first));
        assert!(verify_password("hunter2", &second));
        assert!(!verify_password("hunter3", &first));
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("hunter2", "not-a-phc-string"));
    }
}
