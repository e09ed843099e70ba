use axum::{extract::State, http::StatusCode, Json};

use crate::{
    auth::{password::hash_password, AuthUser},
    db,
    error::{AppError, AppResult},
    extract::{JsonBody, PathParam},
    models::user::{CreateUser, User},
    validation::NewUser,
    AppState,
};

pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    let new_user = NewUser::try_from(payload)?;

    // Fast path: skip hashing when the email is already registered
    if db::users::find_by_email(&state.db, &new_user.email)
        .await?
        .is_some()
    {
        return Err(db::users::email_taken());
    }

    let password_hash = hash_password(&new_user.password)?;
    let user = db::users::insert(
        &state.db,
        &new_user.email,
        &password_hash,
        new_user.phone_number.as_deref(),
    )
    .await?;
    tracing::info!(user_id = user.id, "user registered");

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    _caller: AuthUser,
    PathParam(id): PathParam<i64>,
) -> AppResult<Json<User>> {
    let user = db::users::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("user with id: {id} was not found")))?;

    Ok(Json(user))
}
