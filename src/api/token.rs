//! Session bearer tokens.
//!
//! A token is the hex HMAC-SHA256 of the session name keyed by the service
//! secret, so it can be checked without storing anything.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Token for `session` under `secret`
pub fn generate_token(secret: &str, session: &str) -> anyhow::Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("Failed to create HMAC instance: {}", e))?;
    mac.update(session.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time equality of two secrets
pub fn secrets_match(given: &str, expected: &str) -> bool {
    given.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Checks an `Authorization` header value against the session token
pub fn verify_bearer(header: Option<&str>, secret: &str, session: &str) -> bool {
    let token = match header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token.trim(),
        None => return false,
    };

    // accept the `<session>:<token>` form handed out by generate-token
    let token = token
        .strip_prefix(session)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or(token);

    match generate_token(secret, session) {
        Ok(expected) => secrets_match(token, &expected),
        Err(e) => {
            logfire::error!("Failed to verify bearer token: {error}", error = e.to_string());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_deterministic_per_session() {
        let token = generate_token("secret", "sales").unwrap();

        assert_eq!(token, generate_token("secret", "sales").unwrap());
        assert_eq!(token.len(), 64);
        assert_ne!(token, generate_token("secret", "support").unwrap());
        assert_ne!(token, generate_token("other", "sales").unwrap());
    }

    #[test]
    fn test_verify_bearer() {
        let token = generate_token("secret", "sales").unwrap();

        assert!(verify_bearer(
            Some(&format!("Bearer {token}")),
            "secret",
            "sales"
        ));
        assert!(verify_bearer(
            Some(&format!("Bearer sales:{token}")),
            "secret",
            "sales"
        ));
        assert!(!verify_bearer(Some(&token), "secret", "sales"));
        assert!(!verify_bearer(
            Some(&format!("Bearer {token}")),
            "secret",
            "support"
        ));
        assert!(!verify_bearer(Some("Bearer "), "secret", "sales"));
        assert!(!verify_bearer(None, "secret", "sales"));
    }

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("abc", "abc"));
        assert!(!secrets_match("abc", "abd"));
        assert!(!secrets_match("abc", "abcd"));
    }
}
