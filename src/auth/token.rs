//! Signing and verifying the JSON web tokens used for access and refresh.

use std::fmt::Debug;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{Error, auth::UserID};

/// How long an access token stays valid.
pub const ACCESS_TOKEN_TTL: Duration = Duration::days(7);

/// How long a refresh token stays valid.
pub const REFRESH_TOKEN_TTL: Duration = Duration::days(30);

/// Which of the two token kinds a token is.
///
/// The kind is part of the signed payload so an access token can never be
/// used as a refresh token or the other way round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// A short lived token sent with every request.
    Access,
    /// A long lived, single use token exchanged for a new pair.
    Refresh,
}

impl TokenKind {
    fn time_to_live(self) -> Duration {
        match self {
            TokenKind::Access => ACCESS_TOKEN_TTL,
            TokenKind::Refresh => REFRESH_TOKEN_TTL,
        }
    }
}

/// The contents of a JSON Web Token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub sub: i64,
    /// Email associated with the token.
    pub email: String,
    /// Whether this is an access or refresh token.
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// A unique ID so two tokens issued in the same second still differ.
    pub jti: String,
    /// The time the token was issued as a unix timestamp.
    pub iat: i64,
    /// The expiry time of the token as a unix timestamp.
    pub exp: i64,
}

impl Claims {
    /// The user the token was issued to.
    pub fn user_id(&self) -> UserID {
        UserID::new(self.sub)
    }
}

/// An access token and refresh token issued together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Sent as a bearer token to authenticate requests.
    pub access_token: String,
    /// Exchanged once for a new [TokenPair].
    pub refresh_token: String,
}

/// The keys for signing and verifying both kinds of token.
///
/// Access and refresh tokens use different secrets.
#[derive(Clone)]
pub struct TokenKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys").finish_non_exhaustive()
    }
}

impl TokenKeys {
    /// Create the keys from the two HMAC secrets.
    pub fn new(access_secret: &str, refresh_secret: &str) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
        }
    }

    /// Sign a new token of `kind` for the user, valid from now.
    ///
    /// # Errors
    ///
    /// Returns [Error::TokenCreation] if the token could not be signed.
    pub fn encode(&self, kind: TokenKind, user_id: UserID, email: &str) -> Result<String, Error> {
        self.encode_at(kind, user_id, email, OffsetDateTime::now_utc())
    }

    fn encode_at(
        &self,
        kind: TokenKind,
        user_id: UserID,
        email: &str,
        issued_at: OffsetDateTime,
    ) -> Result<String, Error> {
        let claims = Claims {
            sub: user_id.as_i64(),
            email: email.to_owned(),
            kind,
            jti: Uuid::new_v4().to_string(),
            iat: issued_at.unix_timestamp(),
            exp: (issued_at + kind.time_to_live()).unix_timestamp(),
        };

        let key = match kind {
            TokenKind::Access => &self.access_encoding,
            TokenKind::Refresh => &self.refresh_encoding,
        };

        encode(&Header::new(Algorithm::HS256), &claims, key).map_err(|error| {
            tracing::error!("Error signing {kind:?} token: {error}");
            Error::TokenCreation(error.to_string())
        })
    }

    /// Sign a fresh access and refresh token for the user.
    ///
    /// # Errors
    ///
    /// Returns [Error::TokenCreation] if either token could not be signed.
    pub fn encode_pair(&self, user_id: UserID, email: &str) -> Result<TokenPair, Error> {
        Ok(TokenPair {
            access_token: self.encode(TokenKind::Access, user_id, email)?,
            refresh_token: self.encode(TokenKind::Refresh, user_id, email)?,
        })
    }

    /// Verify the signature, expiry and kind of `token`.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidToken] for any failure so that callers learn
    /// nothing about why the token was rejected.
    pub fn decode(&self, kind: TokenKind, token: &str) -> Result<Claims, Error> {
        let key = match kind {
            TokenKind::Access => &self.access_decoding,
            TokenKind::Refresh => &self.refresh_decoding,
        };

        let claims = decode::<Claims>(token, key, &Validation::new(Algorithm::HS256))
            .map_err(|error| {
                tracing::debug!("Rejected {kind:?} token: {error}");
                Error::InvalidToken
            })?
            .claims;

        if claims.kind != kind {
            tracing::debug!("Rejected {:?} token presented as {kind:?}", claims.kind);
            return Err(Error::InvalidToken);
        }

        Ok(claims)
    }
}
