//! Builds the HTML bodies for account emails.

/// The subject line for the email-verification message.
pub const VERIFICATION_SUBJECT: &str = "Verify your email address";

/// The subject line for the password-reset message.
pub const PASSWORD_RESET_SUBJECT: &str = "Reset your password";

/// Build the HTML body for the verification email sent after registration.
pub fn verification_email(first_name: &str, otp_value: &str) -> String {
    format!(
        "<div style=\"font-family: sans-serif; max-width: 480px\">\
            <h2>Hi {first_name},</h2>\
            <p>Enter this code to verify your email address:</p>\
            <p style=\"font-size: 28px; font-weight: bold; letter-spacing: 6px\">{otp_value}</p>\
            <p>The code expires in 24 hours. If you did not create an account, \
            you can ignore this email.</p>\
        </div>"
    )
}

/// Build the HTML body for the password-reset email.
pub fn password_reset_email(first_name: &str, otp_value: &str) -> String {
    format!(
        "<div style=\"font-family: sans-serif; max-width: 480px\">\
            <h2>Hi {first_name},</h2>\
            <p>Enter this code to reset your password:</p>\
            <p style=\"font-size: 28px; font-weight: bold; letter-spacing: 6px\">{otp_value}</p>\
            <p>The code expires in 24 hours. If you did not request a password \
            reset, you can ignore this email.</p>\
        </div>"
    )
}
