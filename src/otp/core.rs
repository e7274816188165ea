use rand::Rng;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use crate::{Error, user::UserId};

/// The number of decimal digits in a one-time password.
pub const OTP_LENGTH: usize = 6;

/// How long a one-time password stays valid after it is issued.
pub const OTP_TTL: Duration = Duration::hours(24);

/// A one-time password issued for email verification or a password reset.
#[derive(Debug, Clone, PartialEq)]
pub struct Otp {
    /// The id for the one-time password row.
    pub id: i64,
    /// The user the code was issued to.
    pub user_id: UserId,
    /// The code itself, [OTP_LENGTH] decimal digits.
    pub value: String,
    /// The instant after which the code no longer verifies.
    pub expiry: OffsetDateTime,
}

/// Create the one-time password table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_otp_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS otp (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            value TEXT NOT NULL,
            expiry TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

/// Generate a random code of [OTP_LENGTH] decimal digits.
pub fn generate_otp_value() -> String {
    let mut rng = rand::thread_rng();

    (0..OTP_LENGTH)
        .map(|_| char::from_digit(rng.gen_range(0..10), 10).unwrap_or('0'))
        .collect()
}

/// Issue a new one-time password for `user_id`, replacing any codes issued
/// earlier.
///
/// The code expires [OTP_TTL] after this call.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn new_otp(user_id: UserId, connection: &Connection) -> Result<Otp, Error> {
    let value = generate_otp_value();
    let expiry = OffsetDateTime::now_utc() + OTP_TTL;

    connection.execute("DELETE FROM otp WHERE user_id = ?1", (user_id.as_i64(),))?;
    connection.execute(
        "INSERT INTO otp (user_id, value, expiry) VALUES (?1, ?2, ?3)",
        (user_id.as_i64(), &value, expiry),
    )?;

    Ok(Otp {
        id: connection.last_insert_rowid(),
        user_id,
        value,
        expiry,
    })
}

/// Check `value` against the codes issued to `user_id`.
///
/// A code verifies at most once: the matching row is deleted on success.
/// Expired rows for the user are cleaned up on every attempt, so stale codes
/// do not accumulate.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn verify_otp(user_id: UserId, value: &str, connection: &Connection) -> Result<bool, Error> {
    let now = OffsetDateTime::now_utc();

    let matched = connection.execute(
        "DELETE FROM otp WHERE user_id = ?1 AND value = ?2 AND expiry > ?3",
        (user_id.as_i64(), value, now),
    )?;

    connection.execute(
        "DELETE FROM otp WHERE user_id = ?1 AND expiry <= ?2",
        (user_id.as_i64(), now),
    )?;

    Ok(matched > 0)
}
