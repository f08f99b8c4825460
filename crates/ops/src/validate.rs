//! Local field validation for edit submissions.
//!
//! Runs entirely before any remote call; a failure blocks the submit and the
//! remote never sees the patch.

use std::sync::OnceLock;

use regex::Regex;

use focal_api::ApiError;
use focal_core::{BookingPatch, ContentPatch, TransactionPatch, UserPatch};

pub const USERNAME_MIN_LEN: usize = 3;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern"))
}

// Permissive: digits with an optional leading + and common separators.
// Normalization happens server-side.
fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?[0-9 ().-]{7,20}$").expect("phone pattern"))
}

fn fail(msg: impl Into<String>) -> ApiError {
    ApiError::Validation(msg.into())
}

/// Field-level rules applied to a patch before submission.
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

impl Validate for UserPatch {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(fail("name is required"));
            }
        }
        if let Some(username) = &self.username {
            if username.trim().len() < USERNAME_MIN_LEN {
                return Err(fail(format!(
                    "username must be at least {} characters",
                    USERNAME_MIN_LEN
                )));
            }
        }
        if let Some(email) = &self.email {
            if !email_re().is_match(email) {
                return Err(fail(format!("malformed email: {}", email)));
            }
        }
        if let Some(phone) = &self.phone {
            if !phone_re().is_match(phone) {
                return Err(fail(format!("malformed phone number: {}", phone)));
            }
        }
        Ok(())
    }
}

impl Validate for BookingPatch {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(venue) = &self.venue {
            if venue.trim().is_empty() {
                return Err(fail("venue must not be blank when set"));
            }
        }
        if let Some(ts) = self.scheduled_ts {
            if ts <= 0 {
                return Err(fail("scheduled time must be a positive epoch timestamp"));
            }
        }
        Ok(())
    }
}

impl Validate for ContentPatch {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(fail("title is required"));
            }
        }
        Ok(())
    }
}

impl Validate for TransactionPatch {
    fn validate(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_patch_rules() {
        let ok = UserPatch {
            name: Some("Anna Quirke".into()),
            username: Some("annaq".into()),
            email: Some("anna.q@lenswork.io".into()),
            phone: Some("+353 1 555 2210".into()),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let blank_name = UserPatch { name: Some("   ".into()), ..Default::default() };
        assert!(matches!(blank_name.validate(), Err(ApiError::Validation(_))));

        let short_username = UserPatch { username: Some("ab".into()), ..Default::default() };
        assert!(short_username.validate().is_err());

        let bad_email = UserPatch { email: Some("anna@@example".into()), ..Default::default() };
        assert!(bad_email.validate().is_err());

        let bad_phone = UserPatch { phone: Some("call me".into()), ..Default::default() };
        assert!(bad_phone.validate().is_err());

        // absent fields are not checked at all
        assert!(UserPatch::default().validate().is_ok());
    }

    #[test]
    fn phone_pattern_is_permissive() {
        for p in ["+1 415 555 0134", "0871234567", "(020) 7946-0812"] {
            let patch = UserPatch { phone: Some(p.into()), ..Default::default() };
            assert!(patch.validate().is_ok(), "expected {:?} to pass", p);
        }
    }

    #[test]
    fn booking_patch_rules() {
        let ok = BookingPatch { venue: Some("Marsh Hall".into()), ..Default::default() };
        assert!(ok.validate().is_ok());
        let blank = BookingPatch { venue: Some("".into()), ..Default::default() };
        assert!(blank.validate().is_err());
        let bad_ts = BookingPatch { scheduled_ts: Some(0), ..Default::default() };
        assert!(bad_ts.validate().is_err());
    }
}
