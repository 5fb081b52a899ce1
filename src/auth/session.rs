//! Refresh token sessions: issuing, single use rotation with reuse detection,
//! and revocation.
//!
//! Only the SHA-256 hash of each outstanding refresh token is stored. A user
//! has at most [MAX_SESSIONS] stored hashes at a time, the oldest session is
//! evicted when a new one would exceed the cap.

use rusqlite::Connection;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::{
        TokenKeys, TokenPair, User, UserID,
        token::TokenKind,
        user::get_user_by_id,
    },
};

/// The most refresh tokens a user may hold at once.
pub const MAX_SESSIONS: i64 = 5;

/// The hex encoded SHA-256 hash of a raw refresh token.
pub fn hash_refresh_token(raw_token: &str) -> String {
    Sha256::digest(raw_token.as_bytes())
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Create the table of stored refresh token hashes.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_refresh_token_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS refresh_token (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                token_hash TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                );
        CREATE INDEX IF NOT EXISTS idx_refresh_token_user_id ON refresh_token(user_id);",
    )?;

    Ok(())
}

/// Store the hash of `raw_token` and evict the user's oldest sessions beyond
/// [MAX_SESSIONS].
fn store_refresh_token(
    user_id: UserID,
    raw_token: &str,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO refresh_token (user_id, token_hash, created_at) VALUES (?1, ?2, ?3)",
        (
            user_id.as_i64(),
            hash_refresh_token(raw_token),
            OffsetDateTime::now_utc(),
        ),
    )?;

    let evicted = connection.execute(
        "DELETE FROM refresh_token
         WHERE user_id = ?1
           AND id NOT IN (
               SELECT id FROM refresh_token WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2
           )",
        (user_id.as_i64(), MAX_SESSIONS),
    )?;

    if evicted > 0 {
        tracing::debug!("Evicted {evicted} old session(s) for user {user_id}");
    }

    Ok(())
}

/// Remove the stored hash of `raw_token`, returning whether it was stored.
fn remove_refresh_token(
    user_id: UserID,
    raw_token: &str,
    connection: &Connection,
) -> Result<bool, Error> {
    let rows_affected = connection.execute(
        "DELETE FROM refresh_token WHERE user_id = ?1 AND token_hash = ?2",
        (user_id.as_i64(), hash_refresh_token(raw_token)),
    )?;

    Ok(rows_affected > 0)
}

/// Count the sessions the user currently holds.
#[cfg(test)]
pub fn count_sessions(user_id: UserID, connection: &Connection) -> Result<i64, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM refresh_token WHERE user_id = ?1",
            [user_id.as_i64()],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Sign a new token pair for `user` and store the refresh token's hash.
///
/// # Errors
///
/// Returns an error if a token could not be signed or stored.
pub fn issue_token_pair(
    user: &User,
    token_keys: &TokenKeys,
    connection: &Connection,
) -> Result<TokenPair, Error> {
    let pair = token_keys.encode_pair(user.id, &user.email)?;
    store_refresh_token(user.id, &pair.refresh_token, connection)?;

    Ok(pair)
}

/// Exchange a refresh token for a new token pair.
///
/// The presented token is consumed. If it is validly signed but no longer
/// stored it has been used before, so every session of its owner is revoked
/// and [Error::RefreshTokenReuse] is returned.
///
/// # Errors
///
/// Returns [Error::InvalidToken] if the token is malformed, expired, not a
/// refresh token or its user no longer exists.
pub fn rotate_refresh_token(
    raw_token: &str,
    token_keys: &TokenKeys,
    connection: &Connection,
) -> Result<(User, TokenPair), Error> {
    let claims = token_keys.decode(TokenKind::Refresh, raw_token)?;

    let user = match get_user_by_id(claims.user_id(), connection) {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(Error::InvalidToken),
        Err(error) => return Err(error),
    };

    if !remove_refresh_token(user.id, raw_token, connection)? {
        let revoked = revoke_all_refresh_tokens(user.id, connection)?;
        tracing::warn!(
            "Refresh token reuse detected for user {}, revoked {revoked} session(s)",
            user.id
        );
        return Err(Error::RefreshTokenReuse);
    }

    let pair = issue_token_pair(&user, token_keys, connection)?;

    Ok((user, pair))
}

/// Log out a single session by forgetting its refresh token.
///
/// Unknown tokens are ignored so logging out twice is harmless.
pub fn revoke_refresh_token(
    user_id: UserID,
    raw_token: &str,
    connection: &Connection,
) -> Result<(), Error> {
    if !remove_refresh_token(user_id, raw_token, connection)? {
        tracing::debug!("Logout for user {user_id} named a session that was not stored");
    }

    Ok(())
}

/// Forget every refresh token of the user, returning how many were stored.
pub fn revoke_all_refresh_tokens(user_id: UserID, connection: &Connection) -> Result<usize, Error> {
    let revoked = connection.execute(
        "DELETE FROM refresh_token WHERE user_id = ?1",
        [user_id.as_i64()],
    )?;

    tracing::warn!("Revoked all {revoked} session(s) of user {user_id}");

    Ok(revoked)
}
