use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{common::CandidateId, db::candidate::Candidate};

/// Per-candidate tally in a results snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub id: CandidateId,
    pub name: String,
    pub department: Option<String>,
    pub votes: u64,
    pub percentage: f64,
}

/// A read-only snapshot of the election tallies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionResults {
    pub total_votes: u64,
    pub candidates: Vec<CandidateResult>,
}

impl ElectionResults {
    /// Tabulate the results from the candidate list and the per-candidate
    /// vote counts.
    ///
    /// Every candidate appears in the output, zero-vote candidates included.
    /// The candidate order is preserved from the input, which the registry
    /// returns sorted by candidate ID. Pure; the same inputs always produce
    /// the same snapshot.
    pub fn tabulate(candidates: Vec<Candidate>, counts: &HashMap<CandidateId, u64>) -> Self {
        let total_votes = candidates
            .iter()
            .map(|candidate| counts.get(&candidate.candidate_id).copied().unwrap_or(0))
            .sum();

        let candidates = candidates
            .into_iter()
            .map(|candidate| {
                let votes = counts.get(&candidate.candidate_id).copied().unwrap_or(0);
                CandidateResult {
                    id: candidate.candidate.candidate_id,
                    name: candidate.candidate.name,
                    department: candidate.candidate.department,
                    votes,
                    percentage: percentage(votes, total_votes),
                }
            })
            .collect();

        Self {
            total_votes,
            candidates,
        }
    }
}

/// `votes / total_votes * 100`, rounded to 2 decimal places (half away from
/// zero). Defined as 0 when the ledger is empty.
fn percentage(votes: u64, total_votes: u64) -> f64 {
    if total_votes == 0 {
        return 0.0;
    }
    (votes as f64 / total_votes as f64 * 10_000.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_candidates() -> Vec<Candidate> {
        vec![
            Candidate::example(1, "john doe", "eng"),
            Candidate::example(2, "jane doe", "hr"),
        ]
    }

    #[test]
    fn tabulates_counts_and_percentages() {
        // Voters 7 and 1 chose candidate 1; voter 9 chose candidate 2.
        let counts = HashMap::from([(1, 2), (2, 1)]);
        let results = ElectionResults::tabulate(example_candidates(), &counts);

        assert_eq!(results.total_votes, 3);
        assert_eq!(results.candidates.len(), 2);

        assert_eq!(results.candidates[0].id, 1);
        assert_eq!(results.candidates[0].votes, 2);
        assert_eq!(results.candidates[0].percentage, 66.67);

        assert_eq!(results.candidates[1].id, 2);
        assert_eq!(results.candidates[1].votes, 1);
        assert_eq!(results.candidates[1].percentage, 33.33);
    }

    #[test]
    fn empty_ledger_yields_zero_percentages() {
        let results = ElectionResults::tabulate(example_candidates(), &HashMap::new());

        assert_eq!(results.total_votes, 0);
        for candidate in &results.candidates {
            assert_eq!(candidate.votes, 0);
            assert_eq!(candidate.percentage, 0.0);
        }
    }

    #[test]
    fn zero_vote_candidates_still_appear() {
        let counts = HashMap::from([(1, 4)]);
        let results = ElectionResults::tabulate(example_candidates(), &counts);

        assert_eq!(results.total_votes, 4);
        assert_eq!(results.candidates[0].percentage, 100.0);
        assert_eq!(results.candidates[1].votes, 0);
        assert_eq!(results.candidates[1].percentage, 0.0);
    }

    #[test]
    fn exact_tie_splits_evenly() {
        let counts = HashMap::from([(1, 3), (2, 3)]);
        let results = ElectionResults::tabulate(example_candidates(), &counts);

        assert_eq!(results.candidates[0].percentage, 50.0);
        assert_eq!(results.candidates[1].percentage, 50.0);
    }

    #[test]
    fn total_equals_sum_of_candidate_votes() {
        let counts = HashMap::from([(1, 17), (2, 5)]);
        let results = ElectionResults::tabulate(example_candidates(), &counts);

        let sum: u64 = results.candidates.iter().map(|c| c.votes).sum();
        assert_eq!(results.total_votes, sum);
    }

    #[test]
    fn tabulation_is_deterministic() {
        let counts = HashMap::from([(1, 2), (2, 1)]);
        let first = ElectionResults::tabulate(example_candidates(), &counts);
        let second = ElectionResults::tabulate(example_candidates(), &counts);
        assert_eq!(first, second);
    }
}
