use crate::error::ApiError;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt::Write as _;

type HmacSha256 = Hmac<Sha256>;

/// Gateway payment signature: hex HMAC-SHA256 over `payment_id` followed by
/// the subscription id, keyed with the gateway secret.
pub fn payment_signature(secret: &str, payment_id: &str, subscription_id: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payment_id.as_bytes());
    mac.update(subscription_id.as_bytes());
    let digest = mac.finalize().into_bytes();
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

/// Constant-time check of a supplied signature against the expected one.
pub fn verify_payment_signature(
    secret: &str,
    payment_id: &str,
    subscription_id: &str,
    supplied: &str,
) -> Result<(), ApiError> {
    let expected = payment_signature(secret, payment_id, subscription_id);
    if ct_eq(expected.as_bytes(), supplied.as_bytes()) {
        Ok(())
    } else {
        Err(ApiError::InvalidSignature)
    }
}

fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "rzp_test_secret";

    #[test]
    fn signature_roundtrip() {
        let sig = payment_signature(SECRET, "pay_1", "sub_1");
        assert!(verify_payment_signature(SECRET, "pay_1", "sub_1", &sig).is_ok());
    }

    #[test]
    fn signature_is_hex_sha256_length() {
        let sig = payment_signature(SECRET, "pay_1", "sub_1");
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signature_for_other_payment_id_is_rejected() {
        let sig = payment_signature(SECRET, "pay_other", "sub_1");
        let err = verify_payment_signature(SECRET, "pay_1", "sub_1", &sig).unwrap_err();
        assert!(matches!(err, ApiError::InvalidSignature));
    }

    #[test]
    fn signature_with_other_secret_is_rejected() {
        let sig = payment_signature("another-secret", "pay_1", "sub_1");
        assert!(verify_payment_signature(SECRET, "pay_1", "sub_1", &sig).is_err());
    }

    #[test]
    fn truncated_signature_is_rejected() {
        let sig = payment_signature(SECRET, "pay_1", "sub_1");
        assert!(verify_payment_signature(SECRET, "pay_1", "sub_1", &sig[..32]).is_err());
        assert!(verify_payment_signature(SECRET, "pay_1", "sub_1", "").is_err());
    }

    #[test]
    fn ct_eq_basics() {
        assert!(ct_eq(b"abc", b"abc"));
        assert!(!ct_eq(b"abc", b"abd"));
        assert!(!ct_eq(b"abc", b"ab"));
    }
}
