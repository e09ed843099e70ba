//! Per-(user, post) vote toggling.
//!
//! A pair is either unvoted or voted. Adding moves it to voted and fails with
//! a conflict if it already was; removing moves it back and fails with not
//! found if there was nothing to remove. Both require the post to exist.

use sqlx::SqlitePool;

use crate::{
    error::{AppError, AppResult},
    models::vote::{Vote, VoteDirection, VoteOutcome},
};

use super::posts::post_not_found;

pub async fn cast_vote(
    pool: &SqlitePool,
    user_id: i64,
    post_id: i64,
    direction: VoteDirection,
) -> AppResult<VoteOutcome> {
    let post_exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE id = ?")
        .bind(post_id)
        .fetch_one(pool)
        .await?
        > 0;
    if !post_exists {
        return Err(post_not_found(post_id));
    }

    let existing = sqlx::query_as::<_, Vote>(
        "SELECT id, user_id, post_id FROM votes WHERE user_id = ? AND post_id = ?",
    )
    .bind(user_id)
    .bind(post_id)
    .fetch_optional(pool)
    .await?;

    let outcome = match (direction, existing) {
        (VoteDirection::Add, Some(_)) => return Err(already_voted(user_id, post_id)),
        (VoteDirection::Add, None) => {
            insert_vote(pool, user_id, post_id).await?;
            VoteOutcome::Added
        }
        (VoteDirection::Remove, None) => return Err(vote_not_found()),
        (VoteDirection::Remove, Some(_)) => {
            delete_vote(pool, user_id, post_id).await?;
            VoteOutcome::Removed
        }
    };

    tracing::debug!(user_id, post_id, ?outcome, "vote recorded");
    Ok(outcome)
}

// The unique (user_id, post_id) index decides between concurrent adds that
// both passed the read above.
async fn insert_vote(pool: &SqlitePool, user_id: i64, post_id: i64) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "INSERT INTO votes (user_id, post_id) SELECT ?, ? WHERE EXISTS (SELECT 1 FROM posts WHERE id = ?)",
    )
    .bind(user_id)
    .bind(post_id)
    .bind(post_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| match e.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => already_voted(user_id, post_id),
        _ => AppError::from(e),
    })?;
    if result.rows_affected() == 0 {
        return Err(post_not_found(post_id));
    }

    tx.commit().await?;
    Ok(())
}

async fn delete_vote(pool: &SqlitePool, user_id: i64, post_id: i64) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query("DELETE FROM votes WHERE user_id = ? AND post_id = ?")
        .bind(user_id)
        .bind(post_id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(vote_not_found());
    }

    tx.commit().await?;
    Ok(())
}

fn vote_not_found() -> AppError {
    AppError::not_found("Vote does not exist")
}

fn already_voted(user_id: i64, post_id: i64) -> AppError {
    AppError::Conflict(format!(
        "User {user_id} has already voted on post {post_id}"
    ))
}
