use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::{
    api::auth::{Credentials, Rights},
    common::VoterId,
    mongodb::Id,
};

/// A user's role, stored alongside their account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Admin,
}

impl From<Role> for Rights {
    fn from(role: Role) -> Self {
        match role {
            Role::Employee => Rights::Employee,
            Role::Admin => Rights::Admin,
        }
    }
}

/// Core user account data, as stored in the database.
///
/// Employees and admins live in the same collection; only the role differs.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCore {
    /// Stable integer identity; this is the `voter_id` recorded in the ledger.
    pub user_id: VoterId,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

impl UserCore {
    /// Create a new user by hashing the given credentials.
    ///
    /// Returns `None` if the username is empty or the password is below the
    /// minimum length.
    pub fn new(user_id: VoterId, credentials: &Credentials, role: Role) -> Option<Self> {
        let password_hash = credentials.hash_password()?;
        Some(Self {
            user_id,
            username: credentials.username.clone(),
            password_hash,
            role,
        })
    }

    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        // Unwrap safe: the only way to create a UserCore is via `new`, so the
        // stored hash is always well-formed.
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap()
    }
}

/// A user without a database ID.
pub type NewUser = UserCore;

/// A user account from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub user: UserCore,
}

impl Deref for User {
    type Target = UserCore;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

impl DerefMut for User {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.user
    }
}
