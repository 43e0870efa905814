use rocket::{serde::json::Json, Route};

use crate::error::Result;
use crate::model::{
    api::{
        auth::{Auth, Employee},
        vote::{VoteReceipt, VoteSpec},
    },
    db::{
        candidate::Candidate,
        user::User,
        vote::{self, NewVote},
    },
    mongodb::{Coll, Counter},
};

use super::common::user_by_token;

pub fn routes() -> Vec<Route> {
    routes![cast_vote]
}

#[post("/vote", data = "<spec>", format = "json")]
async fn cast_vote(
    token: Auth<Employee>,
    spec: Json<VoteSpec>,
    users: Coll<User>,
    candidates: Coll<Candidate>,
    votes: Coll<NewVote>,
    counters: Coll<Counter>,
) -> Result<Json<VoteReceipt>> {
    // The ledger keys votes by the stable integer identity, not the token's
    // database ID.
    let voter = user_by_token(&token, &users).await?;

    let vote = vote::cast_vote(
        &votes,
        &candidates,
        &counters,
        voter.user_id,
        spec.candidate_id,
    )
    .await?;

    Ok(Json(vote.into()))
}

#[cfg(test)]
mod tests {
    use mongodb::bson::doc;
    use rocket::{
        futures::TryStreamExt,
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::serde_json::json,
    };

    use crate::api::auth::test_login;
    use crate::model::{
        api::auth::Credentials,
        db::{user::NewUser, vote::Vote},
    };

    use super::*;

    async fn seed(client: &Client, candidates: &Coll<Candidate>, users: &Coll<NewUser>) {
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
            .insert_one(NewUser::example_employee(), None)
            .await
            .unwrap();
        test_login(client, &Credentials::example_employee()).await;
    }

    async fn dispatch_vote(client: &Client, candidate_id: u32) -> Status {
        client
            .post(uri!(cast_vote))
            .header(ContentType::JSON)
            .body(json!({ "candidate_id": candidate_id }).to_string())
            .dispatch()
            .await
            .status()
    }

    #[db_test]
    async fn vote_requires_authentication(client: Client) {
        let response = client
            .post(uri!(cast_vote))
            .header(ContentType::JSON)
            .body(json!({ "candidate_id": 1 }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
    }

    #[db_test]
    async fn cast_and_receipt(client: Client, candidates: Coll<Candidate>, users: Coll<NewUser>) {
        seed(&client, &candidates, &users).await;

        let response = client
            .post(uri!(cast_vote))
            .header(ContentType::JSON)
            .body(json!({ "candidate_id": 1 }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let receipt: VoteReceipt = response.into_json().await.unwrap();
        assert_eq!(receipt.candidate_id, 1);

        // The ledger records the vote against the user's integer identity.
        let ledger = Coll::<Vote>::from_db(client.rocket().state().unwrap());
        let recorded = ledger
            .find_one(doc! { "voter_id": NewUser::example_employee().user_id }, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(recorded.candidate_id, 1);
        assert_eq!(recorded.vote_id, receipt.id);
    }

    #[db_test]
    async fn second_vote_conflicts(client: Client, candidates: Coll<Candidate>, users: Coll<NewUser>) {
        seed(&client, &candidates, &users).await;

        assert_eq!(Status::Ok, dispatch_vote(&client, 1).await);
        // A second vote is rejected even for a different candidate.
        assert_eq!(Status::Conflict, dispatch_vote(&client, 2).await);

        // The ledger still shows exactly one vote, for the first candidate.
        let ledger = Coll::<Vote>::from_db(client.rocket().state().unwrap());
        let recorded: Vec<Vote> = ledger
            .find(None, None)
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].candidate_id, 1);
    }

    #[db_test]
    async fn unknown_candidate_not_found(
        client: Client,
        candidates: Coll<Candidate>,
        users: Coll<NewUser>,
    ) {
        seed(&client, &candidates, &users).await;

        assert_eq!(Status::NotFound, dispatch_vote(&client, 999).await);

        // No vote row was created.
        let ledger = Coll::<Vote>::from_db(client.rocket().state().unwrap());
        assert_eq!(ledger.count_documents(None, None).await.unwrap(), 0);
    }
}
