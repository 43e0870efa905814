use std::marker::PhantomData;

use argon2::Config as Argon2Config;
use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{
    errors::{Error as JwtError, ErrorKind as JwtErrorKind},
    DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use rand::Rng;
use rocket::{
    http::{Cookie, SameSite, Status},
    request::{self, FromRequest},
    Request, State,
};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::model::{db::user::User, mongodb::Id};
use crate::Config;

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Raw login credentials, received from a user. These are never stored
/// directly, since the password is in plaintext.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Hash the password for storage.
    ///
    /// Returns `None` if the username is empty or the password is below the
    /// minimum length.
    pub fn hash_password(&self) -> Option<String> {
        if self.username.is_empty() || self.password.len() < MIN_PASSWORD_LENGTH {
            return None;
        }

        // 16 bytes of salt is the recommended amount for password hashing:
        //  https://en.wikipedia.org/wiki/Argon2
        let mut salt = [0_u8; 16];
        rand::thread_rng().fill(&mut salt);
        let hash = argon2::hash_encoded(self.password.as_bytes(), &salt, &Argon2Config::default())
            .unwrap(); // Safe because the default `Config` is valid.
        Some(hash)
    }
}

/// What a token holder is allowed to do. Rights are ordered: an admin can do
/// anything an employee can.
#[derive(
    Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Serialize_repr, Deserialize_repr,
)]
#[repr(u8)]
pub enum Rights {
    Employee = 0,
    Admin = 1,
}

/// Marker for routes any authenticated user may call.
pub enum Employee {}

/// Marker for admin-only routes.
pub enum Admin {}

/// The minimum rights a route demands, lifted to the type level so the
/// requirement is visible in the handler signature.
pub trait AccessLevel {
    const RIGHTS: Rights;
}

impl AccessLevel for Employee {
    const RIGHTS: Rights = Rights::Employee;
}

impl AccessLevel for Admin {
    const RIGHTS: Rights = Rights::Admin;
}

/// An authentication token representing a specific user with specific rights.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthToken {
    id: Id,
    #[serde(rename = "rgt")]
    rights: Rights,
}

impl AuthToken {
    /// Create a new token for the given user, with the rights of their role.
    pub fn new(user: &User) -> Self {
        Self {
            id: user.id,
            rights: user.role.into(),
        }
    }

    /// Get the user's database ID.
    pub fn id(&self) -> Id {
        self.id
    }

    /// Get the user's rights.
    pub fn rights(&self) -> Rights {
        self.rights
    }

    /// Does this token permit actions demanding the target rights?
    pub fn permits(&self, target: Rights) -> bool {
        self.rights >= target
    }

    /// Serialize this token into a signed cookie.
    pub fn into_cookie(self, config: &Config) -> Cookie<'static> {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.auth_ttl(),
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )
        .unwrap(); // Infallible.

        Cookie::build(AUTH_TOKEN_COOKIE, token)
            .max_age(time::Duration::seconds(config.auth_ttl().num_seconds()))
            .same_site(SameSite::Strict)
            .finish()
    }

    /// Deserialize and verify a token from a cookie.
    pub fn from_cookie(cookie: &Cookie<'_>, config: &Config) -> Result<Self, JwtError> {
        jsonwebtoken::decode(
            cookie.value(),
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims>| claims.claims.token)
    }
}

/// Cookie claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: AuthToken,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

/// Request guard proving the caller holds at least the rights of `L`.
///
/// A missing, invalid, or expired token fails with 401; a valid token with
/// insufficient rights fails with 403. Unlike forwarding, this reports the
/// real reason to the caller.
pub struct Auth<L> {
    token: AuthToken,
    level: PhantomData<L>,
}

impl<L> std::ops::Deref for Auth<L> {
    type Target = AuthToken;

    fn deref(&self) -> &Self::Target {
        &self.token
    }
}

#[rocket::async_trait]
impl<'r, L> FromRequest<'r> for Auth<L>
where
    L: AccessLevel,
{
    type Error = JwtError;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        // Valid as `Config` is always managed.
        let config = req.guard::<&State<Config>>().await.unwrap();

        let cookie = match req.cookies().get(AUTH_TOKEN_COOKIE) {
            Some(cookie) => cookie,
            None => {
                return request::Outcome::Failure((
                    Status::Unauthorized,
                    JwtErrorKind::InvalidToken.into(),
                ));
            }
        };

        let token = match AuthToken::from_cookie(cookie, config) {
            Ok(token) => token,
            Err(err) => {
                return request::Outcome::Failure((Status::Unauthorized, err));
            }
        };

        if token.permits(L::RIGHTS) {
            request::Outcome::Success(Self {
                token,
                level: PhantomData,
            })
        } else {
            request::Outcome::Failure((Status::Forbidden, JwtErrorKind::InvalidToken.into()))
        }
    }
}
