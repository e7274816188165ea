//! One-time passwords for email verification and password resets.

mod core;

pub use core::{OTP_LENGTH, Otp, create_otp_table, new_otp, verify_otp};
