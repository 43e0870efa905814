pub mod auth;
pub mod candidate;
pub mod results;
pub mod vote;
