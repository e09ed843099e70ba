use axum::{extract::State, http::StatusCode, Json};

use crate::{
    auth::{authorize_ownership, AuthUser},
    db::{self, posts::post_not_found},
    error::AppResult,
    extract::{JsonBody, PathParam, QueryParams},
    models::post::{ListQuery, Post, PostDraft, PostFilter, PostPayload, PostWithVotes},
    AppState,
};

pub async fn list_posts(
    State(state): State<AppState>,
    _caller: AuthUser,
    QueryParams(query): QueryParams<ListQuery>,
) -> AppResult<Json<Vec<PostWithVotes>>> {
    let filter = PostFilter::try_from(query)?;
    let posts = db::posts::list(&state.db, &filter).await?;
    Ok(Json(posts))
}

pub async fn create_post(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonBody(payload): JsonBody<PostPayload>,
) -> AppResult<(StatusCode, Json<Post>)> {
    let draft = PostDraft::try_from(payload)?;
    let post = db::posts::insert(&state.db, caller.user_id, &draft).await?;
    tracing::info!(post_id = post.id, author_id = caller.user_id, "post created");

    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post(
    State(state): State<AppState>,
    _caller: AuthUser,
    PathParam(id): PathParam<i64>,
) -> AppResult<Json<PostWithVotes>> {
    let post = db::posts::get_by_id(&state.db, id).await?;
    Ok(Json(post))
}

pub async fn update_post(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParam(id): PathParam<i64>,
    JsonBody(payload): JsonBody<PostPayload>,
) -> AppResult<Json<Post>> {
    let draft = PostDraft::try_from(payload)?;
    let existing = db::posts::find(&state.db, id)
        .await?
        .ok_or_else(|| post_not_found(id))?;
    authorize_ownership(existing.author_id, caller.user_id)?;

    let post = db::posts::update(&state.db, id, &draft).await?;
    tracing::info!(post_id = id, "post updated");

    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParam(id): PathParam<i64>,
) -> AppResult<StatusCode> {
    let existing = db::posts::find(&state.db, id)
        .await?
        .ok_or_else(|| post_not_found(id))?;
    authorize_ownership(existing.author_id, caller.user_id)?;

    db::posts::delete(&state.db, id).await?;
    tracing::info!(post_id = id, "post deleted");

    Ok(StatusCode::NO_CONTENT)
}
