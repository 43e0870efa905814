use serde::{Deserialize, Serialize};

use crate::model::{common::CandidateId, db::candidate::Candidate};

/// API-friendly representation of a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDescription {
    pub id: CandidateId,
    pub name: String,
    pub department: Option<String>,
}

impl From<Candidate> for CandidateDescription {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.candidate.candidate_id,
            name: candidate.candidate.name,
            department: candidate.candidate.department,
        }
    }
}
