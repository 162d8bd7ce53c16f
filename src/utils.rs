//! Token and normalisation helpers.

use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Generate a cryptographically secure bearer secret.
///
/// Returns a 256-bit random value encoded as base64url (43 characters).
/// The raw value is handed out exactly once; only [`hash_token`] output is
/// ever persisted.
#[must_use]
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let mut random_bytes = [0u8; 32];
    rng.fill_bytes(&mut random_bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes)
}

/// One-way hash of a bearer secret or claim token.
///
/// SHA-256, hex encoded. Lookups at the gate and on the claim path go
/// through this hash, so a store compromise never yields presentable
/// tokens.
#[must_use]
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = hasher.finalize();

    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write;
        // Writing to a String cannot fail.
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Normalise a phone number into a bare MSISDN for rate-limit keys and
/// payer references.
///
/// Strips spaces, dashes and a leading `+`. Returns `None` when what
/// remains is not 8-15 digits.
///
/// # Examples
///
/// ```
/// use matchday_core::utils::normalize_msisdn;
///
/// assert_eq!(normalize_msisdn("+250 788 123 456"), Some("250788123456".to_string()));
/// assert_eq!(normalize_msisdn("078-812-3456"), Some("0788123456".to_string()));
/// assert_eq!(normalize_msisdn("not a number"), None);
/// ```
#[must_use]
pub fn normalize_msisdn(raw: &str) -> Option<String> {
    let digits: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '+')
        .collect();

    if digits.len() < 8 || digits.len() > 15 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    Some(digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_unique_and_url_safe() {
        let a = generate_token();
        let b = generate_token();

        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(!a.contains('+') && !a.contains('/') && !a.contains('='));
    }

    #[test]
    fn hash_is_deterministic_and_hex() {
        let token = "Zm9vYmFy";
        let h1 = hash_token(token);
        let h2 = hash_token(token);

        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(h1, hash_token("Zm9vYmFy2"));
    }

    #[test]
    fn hash_never_echoes_the_token() {
        let token = generate_token();
        assert!(!hash_token(&token).contains(&token));
    }

    #[test]
    fn msisdn_normalisation() {
        assert_eq!(
            normalize_msisdn("+250788123456"),
            Some("250788123456".to_string())
        );
        assert_eq!(
            normalize_msisdn("0788 123 456"),
            Some("0788123456".to_string())
        );
        assert_eq!(normalize_msisdn("12345"), None);
        assert_eq!(normalize_msisdn(""), None);
        assert_eq!(normalize_msisdn("0788x123456"), None);
    }

    proptest::proptest! {
        #[test]
        fn normalisation_output_is_always_a_bare_msisdn(raw in ".*") {
            if let Some(msisdn) = normalize_msisdn(&raw) {
                proptest::prop_assert!(msisdn.chars().all(|c| c.is_ascii_digit()));
                proptest::prop_assert!((8..=15).contains(&msisdn.len()));
            }
        }

        #[test]
        fn hashes_are_fixed_width_hex(token in "[A-Za-z0-9_-]{1,64}") {
            let hash = hash_token(&token);
            proptest::prop_assert_eq!(hash.len(), 64);
            proptest::prop_assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }
}
