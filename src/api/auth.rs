use mongodb::bson::doc;
use rocket::{
    http::{Cookie, CookieJar, Status},
    serde::json::Json,
    Route, State,
};

use crate::error::{Error, Result};
use crate::model::{
    api::auth::{AuthToken, Credentials, AUTH_TOKEN_COOKIE},
    db::user::User,
    mongodb::Coll,
};
use crate::Config;

pub fn routes() -> Vec<Route> {
    routes![authenticate, logout]
}

#[post("/auth", data = "<credentials>", format = "json")]
async fn authenticate(
    cookies: &CookieJar<'_>,
    credentials: Json<Credentials>,
    users: Coll<User>,
    config: &State<Config>,
) -> Result<()> {
    let user = users
        .find_one(doc! { "username": &credentials.username }, None)
        .await?
        .filter(|user| user.verify_password(&credentials.password))
        .ok_or_else(|| Error::Unauthorized("Invalid username or password".to_string()))?;

    info!("User {} ({}) logged in", user.username, user.user_id);
    cookies.add(AuthToken::new(&user).into_cookie(config));
    Ok(())
}

#[delete("/auth")]
fn logout(cookies: &CookieJar) -> Status {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    Status::Ok
}

/// Log the given test client in, panicking if the credentials are rejected.
#[cfg(test)]
pub async fn test_login(client: &rocket::local::asynchronous::Client, credentials: &Credentials) {
    use rocket::http::ContentType;
    use rocket::serde::json::serde_json::json;

    let response = client
        .post(uri!(authenticate))
        .header(ContentType::JSON)
        .body(json!(credentials).to_string())
        .dispatch()
        .await;
    assert_eq!(Status::Ok, response.status());
}

#[cfg(test)]
mod tests {
    use rocket::{http::ContentType, local::asynchronous::Client, serde::json::serde_json::json};

    use crate::model::db::user::NewUser;

    use super::*;

    #[db_test]
    async fn authenticate_valid(client: Client, users: Coll<NewUser>) {
        // Ensure there is a user to log in as.
        users
            .insert_one(NewUser::example_employee(), None)
            .await
            .unwrap();

        // Use valid credentials to attempt login.
        let response = client
            .post(uri!(authenticate))
            .header(ContentType::JSON)
            .body(json!(Credentials::example_employee()).to_string())
            .dispatch()
            .await;

        assert_eq!(Status::Ok, response.status());
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_some());
    }

    #[db_test]
    async fn authenticate_invalid(client: Client, users: Coll<NewUser>) {
        // Ensure there is a user to fail to log in as.
        users
            .insert_one(NewUser::example_employee(), None)
            .await
            .unwrap();

        // Use an unknown username to attempt login.
        let response = client
            .post(uri!(authenticate))
            .header(ContentType::JSON)
            .body(
                json!({
                    "username": "nobody",
                    "password": "correct-horse-battery",
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(Status::Unauthorized, response.status());
        assert_eq!(None, client.cookies().get(AUTH_TOKEN_COOKIE));

        // Use a wrong password to attempt login.
        let response = client
            .post(uri!(authenticate))
            .header(ContentType::JSON)
            .body(
                json!({
                    "username": &Credentials::example_employee().username,
                    "password": "not-the-password",
                })
                .to_string(),
            )
            .dispatch()
            .await;

        assert_eq!(Status::Unauthorized, response.status());
        assert_eq!(None, client.cookies().get(AUTH_TOKEN_COOKIE));
    }

    #[db_test]
    async fn logout_clears_cookie(client: Client, users: Coll<NewUser>) {
        users
            .insert_one(NewUser::example_employee(), None)
            .await
            .unwrap();

        client
            .post(uri!(authenticate))
            .header(ContentType::JSON)
            .body(json!(Credentials::example_employee()).to_string())
            .dispatch()
            .await;
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_some());

        let response = client.delete(uri!(logout)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(None, client.cookies().get(AUTH_TOKEN_COOKIE));
    }
}
