mod bson;
mod collection;
mod counter;

pub use bson::Id;
pub use collection::{ensure_indexes_exist, Coll, MongoCollection};
pub use counter::{
    ensure_counters_exist, Counter, CANDIDATE_ID_COUNTER, USER_ID_COUNTER, VOTE_ID_COUNTER,
};
