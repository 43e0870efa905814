use std::ops::Deref;

use mongodb::bson::doc;
use mongodb::options::FindOptions;
use rocket::futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{common::CandidateId, mongodb::Coll, mongodb::Id};

/// Core candidate data, as stored in the database.
///
/// Candidates are created by administrative provisioning and are immutable
/// thereafter; there is deliberately no update or delete path, so votes can
/// always resolve their candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCore {
    pub candidate_id: CandidateId,
    pub name: String,
    pub department: Option<String>,
}

/// A candidate without a database ID.
pub type NewCandidate = CandidateCore;

/// A candidate from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

/// All candidates, ordered by candidate ID for deterministic output.
pub async fn list_candidates(candidates: &Coll<Candidate>) -> Result<Vec<Candidate>> {
    let options = FindOptions::builder()
        .sort(doc! { "candidate_id": 1 })
        .build();
    let all = candidates.find(None, options).await?.try_collect().await?;
    Ok(all)
}

/// Look up a single candidate by its candidate ID.
pub async fn candidate_by_id(
    candidates: &Coll<Candidate>,
    candidate_id: CandidateId,
) -> Result<Option<Candidate>> {
    let candidate = candidates
        .find_one(doc! { "candidate_id": candidate_id }, None)
        .await?;
    Ok(candidate)
}
