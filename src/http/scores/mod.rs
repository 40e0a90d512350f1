use chrono::Utc;
use rocket::http::Status;
use rocket::serde::json::{self, Json};
use rocket::{Build, Rocket, State};

use crate::database::models::score_entry::ScoreEntry;
use crate::database::StoreContext;
use crate::leaderboard::UnvalidatedScoreEntry;
use crate::util::auth::VerifiedUser;
use crate::util::error::ApiErrorResponder;
use crate::util::responder::JsonResponder;
use crate::DriftMinerState;

#[post("/submit-score", data = "<submission>")]
async fn submit_score(
    state: &State<DriftMinerState>,
    ctx: StoreContext,
    verified: VerifiedUser,
    submission: Result<Json<UnvalidatedScoreEntry>, json::Error<'_>>,
) -> Result<(Status, &'static str), ApiErrorResponder> {
    let Json(mut candidate) = submission.map_err(|e| {
        debug!("[{}] Rejecting submission body: {}", ctx.request_id, e);
        ApiErrorResponder::invalid_json()
    })?;
    // the gateway's verified identity wins over whatever the client claims
    if let VerifiedUser(Some(user_id)) = verified {
        candidate.user_id = user_id;
    }
    state.leaderboard.submit_score(&ctx, candidate, Utc::now()).await?;
    Ok((Status::Created, "Score Submitted Successfully"))
}

#[get("/leaderboard?<limit>")]
async fn leaderboard(
    state: &State<DriftMinerState>,
    ctx: StoreContext,
    limit: Option<u32>,
) -> Result<JsonResponder<Vec<ScoreEntry>>, ApiErrorResponder> {
    let entries = state.leaderboard.get_leaderboard(&ctx, limit).await?;
    Ok(JsonResponder::ok(entries))
}

pub fn mount(rocket_build: Rocket<Build>) -> Rocket<Build> {
    rocket_build.mount("/api/v1", routes![submit_score, leaderboard])
}
