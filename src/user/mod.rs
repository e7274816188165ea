//! Registered users: the profile rows, password hashing, and the endpoints
//! for registration, verification, and profile management.

mod core;
mod currencies_endpoint;
mod get_endpoint;
mod money_stats_endpoint;
mod password;
mod register_endpoint;
mod summary_endpoint;
mod update_endpoint;
mod verify_endpoint;

pub use core::{
    NewUser, Permission, User, UserId, UserProfile, UserProfileUpdate, create_user_table,
    get_user_by_email, get_user_by_id, insert_user, mark_user_verified, update_user_password,
    update_user_profile,
};
pub use currencies_endpoint::get_user_currencies_endpoint;
pub use get_endpoint::get_user_endpoint;
pub use money_stats_endpoint::get_money_stats_endpoint;
pub use password::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH, PasswordHash, ValidatedPassword};
pub use register_endpoint::register_user_endpoint;
pub use summary_endpoint::get_summary_endpoint;
pub use update_endpoint::update_user_endpoint;
pub use verify_endpoint::verify_user_endpoint;
