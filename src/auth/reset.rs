use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use time::{Duration, OffsetDateTime};

/// A freshly issued password-reset token. The raw value goes out by email;
/// only the hash and expiry are persisted.
#[derive(Debug)]
pub struct IssuedResetToken {
    pub raw: String,
    pub hash: String,
    pub expires_at: OffsetDateTime,
}

/// Issue a high-entropy single-use reset token valid for `ttl_minutes`.
pub fn issue(ttl_minutes: i64) -> IssuedResetToken {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let raw = to_hex(&bytes);
    IssuedResetToken {
        hash: hash_token(&raw),
        raw,
        expires_at: OffsetDateTime::now_utc() + Duration::minutes(ttl_minutes),
    }
}

/// One-way hash of a raw reset token, as stored in the credential store.
pub fn hash_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    to_hex(&hasher.finalize())
}

pub fn is_expired(expires_at: OffsetDateTime) -> bool {
    expires_at <= OffsetDateTime::now_utc()
}

/// Why a presented raw token did not redeem.
#[derive(Debug, PartialEq, Eq)]
pub enum RedeemError {
    NoMatch,
    Expired,
}

/// The pending-reset fields as persisted on a user row. Redemption is
/// destructive: any hash match clears the fields, so a raw token redeems at
/// most once even when the redemption itself fails on expiry.
#[derive(Debug, Default, Clone)]
pub struct StoredReset {
    pub hash: Option<String>,
    pub expires_at: Option<OffsetDateTime>,
}

impl StoredReset {
    pub fn redeem(&mut self, raw: &str) -> Result<(), RedeemError> {
        match self.hash.as_deref() {
            Some(stored) if stored == hash_token(raw) => {}
            _ => return Err(RedeemError::NoMatch),
        }
        let expired = self.expires_at.map_or(true, is_expired);
        self.hash = None;
        self.expires_at = None;
        if expired {
            Err(RedeemError::Expired)
        } else {
            Ok(())
        }
    }
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_hash_matches_raw() {
        let issued = issue(15);
        assert_eq!(hash_token(&issued.raw), issued.hash);
        assert_ne!(issued.raw, issued.hash);
        assert!(!is_expired(issued.expires_at));
    }

    #[test]
    fn tokens_are_unique() {
        let a = issue(15);
        let b = issue(15);
        assert_ne!(a.raw, b.raw);
    }

    #[test]
    fn raw_token_is_64_hex_chars() {
        let issued = issue(15);
        assert_eq!(issued.raw.len(), 64);
        assert!(issued.raw.chars().all(|c| c.is_ascii_hexdigit()));
    }

    fn stored(issued: &IssuedResetToken) -> StoredReset {
        StoredReset {
            hash: Some(issued.hash.clone()),
            expires_at: Some(issued.expires_at),
        }
    }

    #[test]
    fn redeemed_token_cannot_be_reused() {
        let issued = issue(15);
        let mut fields = stored(&issued);
        assert!(fields.redeem(&issued.raw).is_ok());
        assert!(fields.hash.is_none());
        assert_eq!(fields.redeem(&issued.raw), Err(RedeemError::NoMatch));
    }

    #[test]
    fn expired_token_is_burned_on_match() {
        let issued = issue(15);
        let mut fields = StoredReset {
            hash: Some(issued.hash.clone()),
            expires_at: Some(OffsetDateTime::now_utc() - Duration::minutes(1)),
        };
        assert_eq!(fields.redeem(&issued.raw), Err(RedeemError::Expired));
        assert!(fields.hash.is_none());
        assert_eq!(fields.redeem(&issued.raw), Err(RedeemError::NoMatch));
    }

    #[test]
    fn wrong_raw_token_does_not_burn() {
        let issued = issue(15);
        let mut fields = stored(&issued);
        assert_eq!(fields.redeem("deadbeef"), Err(RedeemError::NoMatch));
        assert!(fields.hash.is_some());
        assert!(fields.redeem(&issued.raw).is_ok());
    }

    #[test]
    fn past_expiry_is_expired() {
        let past = OffsetDateTime::now_utc() - Duration::minutes(1);
        assert!(is_expired(past));
        let future = OffsetDateTime::now_utc() + Duration::minutes(1);
        assert!(!is_expired(future));
    }
}
