use rocket::{serde::json::Json, Route};

use crate::error::{Error, Result};
use crate::model::{
    api::{
        auth::{Auth, Employee},
        candidate::CandidateDescription,
    },
    common::CandidateId,
    db::candidate::{self, Candidate},
    mongodb::Coll,
};

pub fn routes() -> Vec<Route> {
    routes![get_candidates, get_candidate]
}

#[get("/candidates")]
async fn get_candidates(
    _token: Auth<Employee>,
    candidates: Coll<Candidate>,
) -> Result<Json<Vec<CandidateDescription>>> {
    let all = candidate::list_candidates(&candidates).await?;
    Ok(Json(all.into_iter().map(Into::into).collect()))
}

#[get("/candidates/<candidate_id>")]
async fn get_candidate(
    _token: Auth<Employee>,
    candidate_id: CandidateId,
    candidates: Coll<Candidate>,
) -> Result<Json<CandidateDescription>> {
    let candidate = candidate::candidate_by_id(&candidates, candidate_id)
        .await?
        .ok_or(Error::InvalidCandidate(candidate_id))?;
    Ok(Json(candidate.into()))
}
