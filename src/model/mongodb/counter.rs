use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, ReturnDocument, UpdateOptions},
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::mongodb::Coll;

/// Counter for allocating user IDs.
pub const USER_ID_COUNTER: &str = "user_id";
/// Counter for allocating candidate IDs.
pub const CANDIDATE_ID_COUNTER: &str = "candidate_id";
/// Counter for allocating vote IDs.
pub const VOTE_ID_COUNTER: &str = "vote_id";

/// A counter object used to implement auto-increment fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    #[serde(rename = "_id")]
    pub id: String,
    pub next: u32,
}

impl Counter {
    /// Create a new `Counter` with the given name, starting at the given value.
    pub fn new(id: impl Into<String>, start: u32) -> Self {
        Self {
            id: id.into(),
            next: start,
        }
    }

    /// Atomically retrieve the next value of the named counter.
    pub async fn next(counters: &Coll<Counter>, id: &str) -> Result<u32> {
        let update = doc! {
            "$inc": { "next": 1 }
        };
        let options: FindOneAndUpdateOptions = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::Before)
            .build();
        let counter = counters
            .find_one_and_update(doc! { "_id": id }, update, options)
            .await?
            .ok_or_else(|| Error::not_found(format!("Counter '{}'", id)))?;
        Ok(counter.next)
    }
}

/// Ensure all the ID counters exist, starting at 1.
///
/// Implemented as an upsert so that two processes racing at startup cannot
/// fail or reset an existing counter. Idempotent.
pub async fn ensure_counters_exist(counters: &Coll<Counter>) -> Result<()> {
    debug!("Ensuring ID counters exist");

    for id in [USER_ID_COUNTER, CANDIDATE_ID_COUNTER, VOTE_ID_COUNTER] {
        let update = doc! {
            "$setOnInsert": { "next": 1 }
        };
        let options: UpdateOptions = UpdateOptions::builder().upsert(true).build();
        counters
            .update_one(doc! { "_id": id }, update, options)
            .await?;
    }

    Ok(())
}
