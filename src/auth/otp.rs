use rand::Rng;
use time::{Duration, OffsetDateTime};

use crate::auth::password::hash_secret;

/// Five minutes advertised to the user, plus a 30 second grace window.
const OTP_TTL_SECONDS: i64 = 5 * 60 + 30;

/// A freshly minted one-time code. `text` is sent to the user exactly once;
/// only `hash` is persisted.
#[derive(Debug)]
pub struct OneTimeCode {
    pub text: String,
    pub hash: String,
    pub expires_at: OffsetDateTime,
}

pub fn generate_otp() -> anyhow::Result<OneTimeCode> {
    let code: u32 = rand::thread_rng().gen_range(100_000..=999_999);
    let text = code.to_string();
    let hash = hash_secret(&text)?;
    let expires_at = OffsetDateTime::now_utc() + Duration::seconds(OTP_TTL_SECONDS);
    Ok(OneTimeCode {
        text,
        hash,
        expires_at,
    })
}

pub fn is_expired(expires_at: OffsetDateTime) -> bool {
    OffsetDateTime::now_utc() > expires_at
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_secret;

    #[test]
    fn otp_is_six_digits() {
        let otp = generate_otp().expect("generate");
        assert_eq!(otp.text.len(), 6);
        let value: u32 = otp.text.parse().expect("numeric");
        assert!((100_000..=999_999).contains(&value));
    }

    #[test]
    fn only_the_hash_matches_the_display_text() {
        let otp = generate_otp().expect("generate");
        assert_ne!(otp.text, otp.hash);
        assert!(verify_secret(&otp.text, &otp.hash));
        assert!(!verify_secret("000000", &otp.hash));
    }

    #[test]
    fn expiry_is_five_and_a_half_minutes_out() {
        let before = OffsetDateTime::now_utc();
        let otp = generate_otp().expect("generate");
        let ttl = otp.expires_at - before;
        assert!(ttl > Duration::minutes(5));
        assert!(ttl <= Duration::seconds(OTP_TTL_SECONDS + 5));
    }

    #[test]
    fn expiry_check_uses_current_time() {
        let now = OffsetDateTime::now_utc();
        assert!(is_expired(now - Duration::seconds(1)));
        assert!(!is_expired(now + Duration::minutes(5)));
    }
}
