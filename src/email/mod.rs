//! Outbound email: the SMTP mailer and the messages it sends.

mod mailer;
mod templates;

pub use mailer::{Mailer, SmtpConfig};
pub use templates::{
    PASSWORD_RESET_SUBJECT, VERIFICATION_SUBJECT, password_reset_email, verification_email,
};
