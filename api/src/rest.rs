use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::{
    handlers::{auth, posts, users, vote},
    AppState,
};

async fn root() -> Json<Value> {
    Json(json!({"message": "Hello World"}))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/login", post(auth::login))
        .route("/users", post(users::register))
        .route("/users/:id", get(users::get_user))
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/posts/:id",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/vote", post(vote::vote))
        .with_state(state)
}
