pub mod candidate;
pub mod user;
pub mod vote;
