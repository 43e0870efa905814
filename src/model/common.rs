//! Application-level integer identifiers.
//!
//! Every stored document also has a mongodb ObjectId, but the IDs exposed
//! over the API are small stable integers allocated from the counters
//! collection.

pub type VoterId = u32;
pub type CandidateId = u32;
pub type VoteId = u32;
