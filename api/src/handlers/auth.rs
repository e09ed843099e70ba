use axum::{extract::State, Json};

use crate::{
    auth::password::verify_password,
    db,
    error::{AppError, AppResult},
    extract::FormBody,
    models::user::{AuthResponse, LoginForm},
    validation::login_credentials,
    AppState,
};

pub async fn login(
    State(state): State<AppState>,
    FormBody(form): FormBody<LoginForm>,
) -> AppResult<Json<AuthResponse>> {
    let (email, password) = login_credentials(form)?;

    let Some(user) = db::users::find_by_email(&state.db, &email).await? else {
        tracing::info!("login rejected: unknown email");
        return Err(invalid_credentials());
    };

    if !verify_password(&password, &user.password_hash)? {
        tracing::info!(user_id = user.id, "login rejected: wrong password");
        return Err(invalid_credentials());
    }

    let token = state.tokens.issue(user.id)?;
    tracing::info!(user_id = user.id, "login succeeded");

    Ok(Json(AuthResponse::bearer(token)))
}

fn invalid_credentials() -> AppError {
    AppError::Forbidden("Invalid credentials".to_string())
}
