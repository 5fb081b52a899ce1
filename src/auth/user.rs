//! Code for creating the user table and reading and writing users.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use crate::{Error, auth::PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The notification settings of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Whether the user wants emails at all.
    pub email_notifications: bool,
    /// Whether the user wants to hear about budgets nearing their limit.
    pub budget_alerts: bool,
    /// Whether the user wants a weekly spending report.
    pub weekly_report: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            email_notifications: true,
            budget_alerts: true,
            weekly_report: false,
        }
    }
}

/// A partial update to a user's [Preferences], `None` leaves a flag as is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    /// See [Preferences::email_notifications].
    pub email_notifications: Option<bool>,
    /// See [Preferences::budget_alerts].
    pub budget_alerts: Option<bool>,
    /// See [Preferences::weekly_report].
    pub weekly_report: Option<bool>,
}

impl Preferences {
    fn apply(self, update: PreferencesUpdate) -> Self {
        Self {
            email_notifications: update
                .email_notifications
                .unwrap_or(self.email_notifications),
            budget_alerts: update.budget_alerts.unwrap_or(self.budget_alerts),
            weekly_report: update.weekly_report.unwrap_or(self.weekly_report),
        }
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's email address, stored in lowercase.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// The user's given name.
    pub first_name: String,
    /// The user's family name.
    pub last_name: String,
    /// What the user wants to be notified about.
    pub preferences: Preferences,
    /// When the user registered.
    pub created_at: OffsetDateTime,
    /// When the user's details last changed.
    pub updated_at: OffsetDateTime,
}

/// The details needed to register a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// The user's email address.
    pub email: String,
    /// The hash of the user's chosen password.
    pub password_hash: PasswordHash,
    /// The user's given name.
    pub first_name: String,
    /// The user's family name.
    pub last_name: String,
}

/// The public view of a [User] that is safe to send to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// The user's ID.
    pub id: i64,
    /// The user's email address.
    pub email: String,
    /// The user's given name.
    pub first_name: String,
    /// The user's family name.
    pub last_name: String,
    /// What the user wants to be notified about.
    pub preferences: Preferences,
    /// When the user registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the user's details last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.as_i64(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            preferences: user.preferences,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Normalise an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Create the user table.
///
/// Emails are unique regardless of case.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password TEXT NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                email_notifications INTEGER NOT NULL DEFAULT 1,
                budget_alerts INTEGER NOT NULL DEFAULT 1,
                weekly_report INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

const USER_COLUMNS: &str = "id, email, password, first_name, last_name, email_notifications, \
                            budget_alerts, weekly_report, created_at, updated_at";

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(2)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        email: row.get(1)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        preferences: Preferences {
            email_notifications: row.get(5)?,
            budget_alerts: row.get(6)?,
            weekly_report: row.get(7)?,
        },
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

/// Create and insert a new user into the database.
///
/// The email is normalised with [normalize_email] and the user starts with
/// the default [Preferences].
///
/// # Errors
///
/// Returns a [Error::Conflict] if the email is taken, or a [Error::SqlError]
/// if another SQL related error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    let now = OffsetDateTime::now_utc();
    let email = normalize_email(&new_user.email);
    let preferences = Preferences::default();

    connection.execute(
        "INSERT INTO user (email, password, first_name, last_name, email_notifications,
                           budget_alerts, weekly_report, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        (
            &email,
            new_user.password_hash.as_ref(),
            &new_user.first_name,
            &new_user.last_name,
            preferences.email_notifications,
            preferences.budget_alerts,
            preferences.weekly_report,
            now,
        ),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        email,
        password_hash: new_user.password_hash,
        first_name: new_user.first_name,
        last_name: new_user.last_name,
        preferences,
        created_at: now,
        updated_at: now,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("SELECT {USER_COLUMNS} FROM user WHERE id = :id"))?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user registered with `email`, ignoring case.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has the email.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!(
            "SELECT {USER_COLUMNS} FROM user WHERE email = :email"
        ))?
        .query_row(&[(":email", &normalize_email(email))], map_user_row)
        .map_err(|error| error.into())
}

/// Whether `user_id` belongs to a registered user.
pub fn user_exists(user_id: UserID, connection: &Connection) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM user WHERE id = ?1)",
            [user_id.as_i64()],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Change the user's names, `None` leaves a name as is.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist.
pub fn update_profile(
    user_id: UserID,
    first_name: Option<&str>,
    last_name: Option<&str>,
    connection: &Connection,
) -> Result<User, Error> {
    let rows_affected = connection.execute(
        "UPDATE user
         SET first_name = COALESCE(?2, first_name),
             last_name = COALESCE(?3, last_name),
             updated_at = ?4
         WHERE id = ?1",
        (
            user_id.as_i64(),
            first_name,
            last_name,
            OffsetDateTime::now_utc(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_user_by_id(user_id, connection)
}

/// Apply `update` to the user's notification preferences.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist.
pub fn update_preferences(
    user_id: UserID,
    update: PreferencesUpdate,
    connection: &Connection,
) -> Result<User, Error> {
    let user = get_user_by_id(user_id, connection)?;
    let preferences = user.preferences.apply(update);

    connection.execute(
        "UPDATE user
         SET email_notifications = ?2, budget_alerts = ?3, weekly_report = ?4, updated_at = ?5
         WHERE id = ?1",
        (
            user_id.as_i64(),
            preferences.email_notifications,
            preferences.budget_alerts,
            preferences.weekly_report,
            OffsetDateTime::now_utc(),
        ),
    )?;

    get_user_by_id(user_id, connection)
}

/// Replace the user's password hash.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist.
pub fn update_password_hash(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?2, updated_at = ?3 WHERE id = ?1",
        (
            user_id.as_i64(),
            password_hash.as_ref(),
            OffsetDateTime::now_utc(),
        ),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Delete the user along with everything they own.
///
/// Foreign keys cascade the deletion to the user's sessions, transactions,
/// budgets and custom categories.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist.
pub fn delete_user(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM user WHERE id = ?1", [user_id.as_i64()])?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}
