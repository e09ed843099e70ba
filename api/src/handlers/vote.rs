use axum::{extract::State, http::StatusCode, Json};

use crate::{
    auth::AuthUser,
    db,
    error::AppResult,
    extract::JsonBody,
    models::vote::{MessageResponse, VotePayload},
    validation::vote_request,
    AppState,
};

pub async fn vote(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonBody(payload): JsonBody<VotePayload>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let (post_id, direction) = vote_request(payload)?;
    let outcome = db::votes::cast_vote(&state.db, caller.user_id, post_id, direction).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: outcome.message().to_string(),
        }),
    ))
}
