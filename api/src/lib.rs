//! A small multi-user posting service: registration and login with bearer
//! tokens, posts owned by their authors, and one vote per user per post.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod rest;
pub mod validation;

use sqlx::sqlite::SqlitePool;

use crate::{auth::TokenService, config::Config};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(db: SqlitePool, config: &Config) -> Self {
        Self {
            db,
            tokens: TokenService::new(config),
        }
    }
}

pub fn app(state: AppState) -> axum::Router {
    rest::router(state)
}
