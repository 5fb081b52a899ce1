mod account;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod profile;
mod refresh;
mod register;
mod session;
mod token;
mod user;

pub use account::{change_password, delete_account};
pub use log_in::log_in;
pub use log_out::log_out;
pub use middleware::{AuthState, OptionalUser, auth_guard};
pub use password::{PasswordHash, ValidatedPassword};
pub use profile::{get_profile, put_preferences, put_profile};
pub use refresh::refresh;
pub use register::register;
pub use session::create_refresh_token_table;
pub use token::{TokenKeys, TokenPair};
pub use user::{User, UserID, create_user_table};

#[cfg(test)]
pub(crate) use user::{NewUser, create_user};
