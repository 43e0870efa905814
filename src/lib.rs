#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate db_test;

use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

pub use config::Config;

/// Assemble the server: all routes, plus the fairings that load the config
/// and bring up the database connection.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(config::ConfigFairing)
        .attach(config::DatabaseFairing)
        .attach(logging::LoggerFairing)
}

#[cfg(test)]
pub(crate) async fn client_and_db() -> (rocket::local::asynchronous::Client, mongodb::Database) {
    let client = rocket::local::asynchronous::Client::tracked(build())
        .await
        .unwrap();
    // The database fairing managed a fresh randomly-named database.
    let db = client
        .rocket()
        .state::<mongodb::Database>()
        .unwrap()
        .clone();
    (client, db)
}
