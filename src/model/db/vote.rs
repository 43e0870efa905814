use std::collections::HashMap;
use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::{doc, from_document};
use mongodb::error::{Error as DbError, ErrorKind, WriteFailure};
use rocket::futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    common::{CandidateId, VoteId, VoterId},
    db::candidate::{candidate_by_id, Candidate},
    mongodb::{Coll, Counter, Id, VOTE_ID_COUNTER},
};

/// The mongodb server error code for a unique index violation.
const DUPLICATE_KEY_ERROR: i32 = 11000;

/// Core vote data, as stored in the ledger.
///
/// Votes are append-only: nothing in the server mutates or deletes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCore {
    pub vote_id: VoteId,
    pub voter_id: VoterId,
    pub candidate_id: CandidateId,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub cast_at: DateTime<Utc>,
}

impl VoteCore {
    /// Create a new vote, timestamped now.
    pub fn new(vote_id: VoteId, voter_id: VoterId, candidate_id: CandidateId) -> Self {
        Self {
            vote_id,
            voter_id,
            candidate_id,
            cast_at: Utc::now(),
        }
    }
}

/// A vote without a database ID.
pub type NewVote = VoteCore;

/// A vote from the ledger, with its unique database ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub vote: VoteCore,
}

impl Deref for Vote {
    type Target = VoteCore;

    fn deref(&self) -> &Self::Target {
        &self.vote
    }
}

/// Cast a vote on behalf of the given voter.
///
/// The candidate must exist, otherwise this fails with
/// [`Error::InvalidCandidate`] and inserts nothing.
///
/// There is intentionally no "has this voter already voted?" pre-check: the
/// unique index on `voter_id` is the sole arbiter, so two racing casts from
/// the same voter (even via different server processes) produce exactly one
/// ledger entry and one [`Error::DuplicateVote`].
pub async fn cast_vote(
    votes: &Coll<NewVote>,
    candidates: &Coll<Candidate>,
    counters: &Coll<Counter>,
    voter_id: VoterId,
    candidate_id: CandidateId,
) -> Result<VoteCore> {
    let candidate = candidate_by_id(candidates, candidate_id)
        .await?
        .ok_or(Error::InvalidCandidate(candidate_id))?;

    let vote_id = Counter::next(counters, VOTE_ID_COUNTER).await?;
    let vote = VoteCore::new(vote_id, voter_id, candidate.candidate_id);

    votes.insert_one(&vote, None).await.map_err(|err| {
        if is_duplicate_key_error(&err) {
            Error::DuplicateVote(voter_id)
        } else {
            err.into()
        }
    })?;

    info!("Voter {} cast vote {}", voter_id, vote.vote_id);
    Ok(vote)
}

/// Count the ledger entries for each candidate, via a server-side `$group`.
///
/// Candidates with no votes are absent from the returned map.
pub async fn count_votes(votes: &Coll<Vote>) -> Result<HashMap<CandidateId, u64>> {
    #[derive(Deserialize)]
    struct CandidateVotes {
        #[serde(rename = "_id")]
        candidate_id: CandidateId,
        votes: u64,
    }

    let pipeline = vec![doc! {
        "$group": {
            "_id": "$candidate_id",
            "votes": { "$sum": 1 },
        }
    }];

    let mut counts = HashMap::new();
    let mut cursor = votes.aggregate(pipeline, None).await?;
    while let Some(document) = cursor.try_next().await? {
        let group: CandidateVotes = from_document(document)?;
        counts.insert(group.candidate_id, group.votes);
    }
    Ok(counts)
}

/// Was this error caused by a unique index violation?
fn is_duplicate_key_error(err: &DbError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_err)) => {
            write_err.code == DUPLICATE_KEY_ERROR
        }
        ErrorKind::BulkWrite(failure) => failure
            .write_errors
            .iter()
            .flatten()
            .any(|write_err| write_err.code == DUPLICATE_KEY_ERROR),
        _ => false,
    }
}
