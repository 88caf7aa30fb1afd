use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::error::{TrackerError, TrackerResult};

/// Verification codes stay valid for a day.
pub const VERIFY_OTP_TTL_MINUTES: i64 = 24 * 60;
/// Password reset codes stay valid for 15 minutes.
pub const RESET_OTP_TTL_MINUTES: i64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPurpose {
    VerifyAccount,
    ResetPassword,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VerifyAccount => "verify-account",
            Self::ResetPassword => "reset-password",
        }
    }

    pub fn ttl(&self) -> Duration {
        match self {
            Self::VerifyAccount => Duration::minutes(VERIFY_OTP_TTL_MINUTES),
            Self::ResetPassword => Duration::minutes(RESET_OTP_TTL_MINUTES),
        }
    }
}

/// Delivers one-time codes to account holders.
pub trait OtpSender {
    fn send(&self, email: &str, purpose: OtpPurpose, otp: &str) -> TrackerResult<()>;
}

/// Writes codes to the log instead of mailing them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOtpSender;

impl OtpSender for LogOtpSender {
    fn send(&self, email: &str, purpose: OtpPurpose, otp: &str) -> TrackerResult<()> {
        tracing::info!(email, purpose = purpose.as_str(), otp, "one-time code issued");
        Ok(())
    }
}

/// Six decimal digits, never with a leading zero.
pub fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

/// Compare a submitted code against the stored one and its expiry.
pub fn check_otp(
    stored: Option<&str>,
    expires_at: Option<DateTime<Utc>>,
    submitted: &str,
    now: DateTime<Utc>,
) -> TrackerResult<()> {
    match stored {
        Some(code) if !code.is_empty() && code == submitted.trim() => {}
        _ => return Err(TrackerError::invalid("Invalid OTP")),
    }
    match expires_at {
        Some(at) if at >= now => Ok(()),
        _ => Err(TrackerError::invalid("OTP Expired")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_otp_is_six_digits() {
        for _ in 0..50 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_check_otp() {
        let now = Utc::now();
        let later = now + Duration::minutes(5);
        assert!(check_otp(Some("123456"), Some(later), "123456", now).is_ok());
        assert!(check_otp(Some("123456"), Some(later), " 123456 ", now).is_ok());
        assert!(check_otp(Some("123456"), Some(later), "654321", now).is_err());
        assert!(check_otp(None, Some(later), "123456", now).is_err());
        assert!(check_otp(Some(""), Some(later), "", now).is_err());

        let expired = check_otp(Some("123456"), Some(now - Duration::seconds(1)), "123456", now);
        assert!(matches!(expired, Err(TrackerError::InvalidInput(ref m)) if m == "OTP Expired"));
    }
}
