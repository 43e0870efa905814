use rocket::{serde::json::Json, Route};

use crate::error::Result;
use crate::model::{
    api::{
        auth::{Admin, Auth},
        results::ElectionResults,
    },
    db::{
        candidate::{list_candidates, Candidate},
        vote::{count_votes, Vote},
    },
    mongodb::Coll,
};

pub fn routes() -> Vec<Route> {
    routes![get_results]
}

/// A read-only snapshot of the tallies. Takes no locks: votes committed
/// while the aggregation runs simply appear in the next snapshot.
#[get("/results")]
async fn get_results(
    _token: Auth<Admin>,
    candidates: Coll<Candidate>,
    votes: Coll<Vote>,
) -> Result<Json<ElectionResults>> {
    let candidates = list_candidates(&candidates).await?;
    let counts = count_votes(&votes).await?;
    Ok(Json(ElectionResults::tabulate(candidates, &counts)))
}

#[cfg(test)]
mod tests {
    use rocket::{http::Status, local::asynchronous::Client};

    use crate::api::auth::test_login;
    use crate::model::{
        api::{auth::Credentials, results::CandidateResult},
        db::{user::NewUser, vote::VoteCore},
    };

    use super::*;

    async fn seed(candidates: &Coll<Candidate>, users: &Coll<NewUser>) {
        candidates
            .insert_many(
                [
                    Candidate::example(1, "john doe", "eng"),
                    Candidate::example(2, "jane doe", "hr"),
                ],
                None,
            )
            .await
            .unwrap();
        users
            .insert_many(
                [NewUser::example_employee(), NewUser::example_admin()],
                None,
            )
            .await
            .unwrap();
    }

    #[db_test]
    async fn results_are_admin_only(
        client: Client,
        candidates: Coll<Candidate>,
        users: Coll<NewUser>,
    ) {
        seed(&candidates, &users).await;

        // Unauthenticated callers are rejected outright.
        let response = client.get(uri!(get_results)).dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());

        // Employees are authenticated but not permitted.
        test_login(&client, &Credentials::example_employee()).await;
        let response = client.get(uri!(get_results)).dispatch().await;
        assert_eq!(Status::Forbidden, response.status());

        // Admins may read the results.
        test_login(&client, &Credentials::example_admin()).await;
        let response = client.get(uri!(get_results)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
    }

    #[db_test]
    async fn tallies_and_percentages(
        client: Client,
        candidates: Coll<Candidate>,
        users: Coll<NewUser>,
        votes: Coll<VoteCore>,
    ) {
        seed(&candidates, &users).await;

        // Voters 7 and 1 chose candidate 1; voter 9 chose candidate 2.
        votes
            .insert_many(
                [
                    VoteCore::new(1, 7, 1),
                    VoteCore::new(2, 1, 1),
                    VoteCore::new(3, 9, 2),
                ],
                None,
            )
            .await
            .unwrap();

        test_login(&client, &Credentials::example_admin()).await;
        let response = client.get(uri!(get_results)).dispatch().await;
        assert_eq!(Status::Ok, response.status());

        let results: ElectionResults = response.into_json().await.unwrap();
        assert_eq!(
            results,
            ElectionResults {
                total_votes: 3,
                candidates: vec![
                    CandidateResult {
                        id: 1,
                        name: "john doe".to_string(),
                        department: Some("eng".to_string()),
                        votes: 2,
                        percentage: 66.67,
                    },
                    CandidateResult {
                        id: 2,
                        name: "jane doe".to_string(),
                        department: Some("hr".to_string()),
                        votes: 1,
                        percentage: 33.33,
                    },
                ],
            }
        );
    }

    #[db_test]
    async fn empty_ledger(client: Client, candidates: Coll<Candidate>, users: Coll<NewUser>) {
        seed(&candidates, &users).await;
        test_login(&client, &Credentials::example_admin()).await;

        let response = client.get(uri!(get_results)).dispatch().await;
        let results: ElectionResults = response.into_json().await.unwrap();

        assert_eq!(results.total_votes, 0);
        for candidate in &results.candidates {
            assert_eq!(candidate.votes, 0);
            assert_eq!(candidate.percentage, 0.0);
        }
    }

    #[db_test]
    async fn reads_are_idempotent(
        client: Client,
        candidates: Coll<Candidate>,
        users: Coll<NewUser>,
        votes: Coll<VoteCore>,
    ) {
        seed(&candidates, &users).await;
        votes
            .insert_one(VoteCore::new(1, 7, 1), None)
            .await
            .unwrap();
        test_login(&client, &Credentials::example_admin()).await;

        let first: ElectionResults = client
            .get(uri!(get_results))
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        let second: ElectionResults = client
            .get(uri!(get_results))
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(first, second);
    }
}
