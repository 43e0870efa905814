use rocket::Route;

pub mod auth;
mod common;
mod public;
mod results;
mod voting;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(auth::routes());
    routes.extend(public::routes());
    routes.extend(voting::routes());
    routes.extend(results::routes());
    routes
}
