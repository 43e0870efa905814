use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{CandidateId, VoteId},
    db::vote::VoteCore,
};

/// A vote that the user wishes to cast.
#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct VoteSpec {
    pub candidate_id: CandidateId,
}

/// Receipt for a successfully cast vote.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub id: VoteId,
    pub candidate_id: CandidateId,
    pub cast_at: DateTime<Utc>,
}

impl From<VoteCore> for VoteReceipt {
    fn from(vote: VoteCore) -> Self {
        Self {
            id: vote.vote_id,
            candidate_id: vote.candidate_id,
            cast_at: vote.cast_at,
        }
    }
}
