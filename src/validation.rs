//! Field validation for JSON request payloads.
//!
//! Endpoints collect problems into a [ValidationErrors] map and bail out with
//! `errors.into_result()?`, which renders as
//! `{"ok": false, "errors": {field: message}}` with HTTP 400.

use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use email_address::EmailAddress;
use serde_json::json;

use crate::{
    Error,
    user::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH},
};

/// The maximum accepted email length at registration.
pub const MAX_REGISTRATION_EMAIL_LENGTH: usize = 64;

/// The maximum accepted email length everywhere else, per RFC 3696.
pub const MAX_EMAIL_LENGTH: usize = 320;

/// The number of characters expected in a one-time password.
const OTP_FIELD_LENGTH: usize = 6;

/// The field errors collected while validating a request payload.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    /// Create an empty error map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for `field`. The first message per field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Whether any errors have been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The message recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Return `Ok(())` when no errors were recorded, otherwise
    /// `Err(Error::Validation(self))` so callers can use `?`.
    pub fn into_result(self) -> Result<(), Error> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Error::Validation(errors)
    }
}

impl IntoResponse for ValidationErrors {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "ok": false,
                "errors": self.0,
            })),
        )
            .into_response()
    }
}

/// Require a non-empty string.
pub fn require_present(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if value.is_empty() {
        errors.add(field, format!("The {field} is required."));
    }
}

/// Require a non-empty string between `min` and `max` characters.
pub fn require_length(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) {
    let char_count = value.chars().count();

    if char_count == 0 {
        errors.add(field, format!("The {field} is required."));
    } else if char_count < min || char_count > max {
        errors.add(
            field,
            format!("The {field} must be between {min} and {max} characters."),
        );
    }
}

/// Require a syntactically valid email address no longer than `max` characters.
pub fn require_email(errors: &mut ValidationErrors, value: &str, max: usize) {
    if value.is_empty() {
        errors.add("email", "The email is required.");
    } else if value.chars().count() > max {
        errors.add(
            "email",
            format!("The email cannot be more than {max} characters."),
        );
    } else if !EmailAddress::is_valid(value) {
        errors.add("email", "The email address is not valid.");
    }
}

/// Require a password within the accepted length bounds, and if
/// `confirm_password` is given, that the two match.
///
/// Password strength is checked separately when the password is hashed, so a
/// weak but well-formed password passes here.
pub fn require_password(
    errors: &mut ValidationErrors,
    password: &str,
    confirm_password: Option<&str>,
) {
    let char_count = password.chars().count();

    if char_count == 0 {
        errors.add("password", "The password is required.");
    } else if char_count < MIN_PASSWORD_LENGTH || char_count > MAX_PASSWORD_LENGTH {
        errors.add(
            "password",
            format!(
                "The password must be between {MIN_PASSWORD_LENGTH} and \
                 {MAX_PASSWORD_LENGTH} characters."
            ),
        );
    }

    if let Some(confirm_password) = confirm_password
        && confirm_password != password
    {
        errors.add("confirmPassword", "The passwords do not match.");
    }
}

/// Require a one-time password of exactly six characters.
pub fn require_otp(errors: &mut ValidationErrors, value: &str) {
    if value.is_empty() {
        errors.add("otp", "The code is required.");
    } else if value.chars().count() != OTP_FIELD_LENGTH {
        errors.add("otp", format!("The code must be {OTP_FIELD_LENGTH} digits."));
    }
}

/// Require a number greater than zero.
pub fn require_positive(errors: &mut ValidationErrors, field: &'static str, value: f64) {
    if !(value > 0.0) {
        errors.add(field, format!("The {field} must be a positive number."));
    }
}

/// Require a number that is zero or greater.
pub fn require_non_negative(errors: &mut ValidationErrors, field: &'static str, value: f64) {
    if !(value >= 0.0) {
        errors.add(field, format!("The {field} cannot be negative."));
    }
}

#[cfg(test)]
mod validation_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use super::{
        MAX_REGISTRATION_EMAIL_LENGTH, ValidationErrors, require_email, require_length,
        require_non_negative, require_otp, require_password, require_positive, require_present,
    };

    #[test]
    fn empty_value_is_reported_as_required() {
        let mut errors = ValidationErrors::new();

        require_length(&mut errors, "name", "", 3, 256);

        assert_eq!(errors.get("name"), Some("The name is required."));
    }

    #[test]
    fn present_value_passes_bare_requirement() {
        let mut errors = ValidationErrors::new();

        require_present(&mut errors, "currency", "NZD");
        require_present(&mut errors, "type", "");

        assert!(errors.get("currency").is_none());
        assert_eq!(errors.get("type"), Some("The type is required."));
    }

    #[test]
    fn out_of_bounds_length_is_reported() {
        let mut errors = ValidationErrors::new();

        require_length(&mut errors, "name", "ab", 3, 256);

        assert_eq!(
            errors.get("name"),
            Some("The name must be between 3 and 256 characters.")
        );
    }

    #[test]
    fn first_message_per_field_wins() {
        let mut errors = ValidationErrors::new();

        errors.add("name", "first");
        errors.add("name", "second");

        assert_eq!(errors.get("name"), Some("first"));
    }

    #[test]
    fn invalid_email_is_reported() {
        let mut errors = ValidationErrors::new();

        require_email(&mut errors, "not-an-email", MAX_REGISTRATION_EMAIL_LENGTH);

        assert_eq!(errors.get("email"), Some("The email address is not valid."));
    }

    #[test]
    fn valid_email_passes() {
        let mut errors = ValidationErrors::new();

        require_email(&mut errors, "ada@example.com", MAX_REGISTRATION_EMAIL_LENGTH);

        assert!(errors.is_empty());
    }

    #[test]
    fn mismatched_passwords_are_reported() {
        let mut errors = ValidationErrors::new();

        require_password(&mut errors, "correcthorsebattery", Some("somethingelse"));

        assert_eq!(
            errors.get("confirmPassword"),
            Some("The passwords do not match.")
        );
    }

    #[test]
    fn short_password_is_reported() {
        let mut errors = ValidationErrors::new();

        require_password(&mut errors, "short", None);

        assert_eq!(
            errors.get("password"),
            Some("The password must be between 8 and 128 characters.")
        );
    }

    #[test]
    fn wrong_length_otp_is_reported() {
        let mut errors = ValidationErrors::new();

        require_otp(&mut errors, "12345");

        assert_eq!(errors.get("otp"), Some("The code must be 6 digits."));
    }

    #[test]
    fn zero_is_not_positive() {
        let mut errors = ValidationErrors::new();

        require_positive(&mut errors, "amount", 0.0);

        assert_eq!(
            errors.get("amount"),
            Some("The amount must be a positive number.")
        );
    }

    #[test]
    fn negative_balance_is_reported() {
        let mut errors = ValidationErrors::new();

        require_non_negative(&mut errors, "balance", -0.01);

        assert_eq!(errors.get("balance"), Some("The balance cannot be negative."));
    }

    #[test]
    fn into_result_passes_through_when_empty() {
        let errors = ValidationErrors::new();

        assert!(errors.into_result().is_ok());
    }

    #[tokio::test]
    async fn response_envelope_lists_field_errors() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "The name is required.");

        let response = errors.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["errors"]["name"], "The name is required.");
    }
}
