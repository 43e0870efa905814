use crate::error::{Error, Result};
use crate::model::{
    api::auth::Auth,
    db::user::User,
    mongodb::Coll,
};

/// Return the user behind an authentication token.
///
/// Tokens outlive accounts, so a valid token may still point at nothing;
/// treat that the same as a bad token.
pub async fn user_by_token<L>(token: &Auth<L>, users: &Coll<User>) -> Result<User> {
    users
        .find_one(token.id().as_doc(), None)
        .await?
        .ok_or_else(|| Error::Unauthorized(format!("No user with ID {}", token.id())))
}
