//! Post storage and the vote-aggregated listing queries.

use sqlx::SqlitePool;

use crate::{
    error::{AppError, AppResult},
    models::post::{Post, PostDraft, PostFilter, PostWithVotes},
};

const POST_COLUMNS: &str = "id, title, content, published, created_at, author_id";

// Posts are kept even without votes (left join); `instr` keeps the title
// match case-sensitive, and an empty search string matches every title.
const POSTS_WITH_VOTES: &str = "\
    SELECT p.id, p.title, p.content, p.published, p.created_at, p.author_id, \
           COUNT(v.id) AS votes \
    FROM posts p \
    LEFT JOIN votes v ON v.post_id = p.id";

pub async fn list(pool: &SqlitePool, filter: &PostFilter) -> AppResult<Vec<PostWithVotes>> {
    let posts = sqlx::query_as::<_, PostWithVotes>(&format!(
        "{POSTS_WITH_VOTES} WHERE instr(p.title, ?) > 0 GROUP BY p.id ORDER BY p.id LIMIT ? OFFSET ?"
    ))
    .bind(&filter.search)
    .bind(filter.limit)
    .bind(filter.offset)
    .fetch_all(pool)
    .await?;

    Ok(posts)
}

pub async fn get_by_id(pool: &SqlitePool, id: i64) -> AppResult<PostWithVotes> {
    sqlx::query_as::<_, PostWithVotes>(&format!(
        "{POSTS_WITH_VOTES} WHERE p.id = ? GROUP BY p.id"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| post_not_found(id))
}

/// Loads a post without aggregating its votes.
pub async fn find(pool: &SqlitePool, id: i64) -> AppResult<Option<Post>> {
    let post = sqlx::query_as::<_, Post>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(post)
}

pub async fn insert(pool: &SqlitePool, author_id: i64, draft: &PostDraft) -> AppResult<Post> {
    let mut tx = pool.begin().await?;

    let post = sqlx::query_as::<_, Post>(&format!(
        "INSERT INTO posts (title, content, published, author_id) VALUES (?, ?, ?, ?) RETURNING {POST_COLUMNS}"
    ))
    .bind(&draft.title)
    .bind(&draft.content)
    .bind(draft.published)
    .bind(author_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(post)
}

/// Replaces the editable fields of a post and returns the stored row.
pub async fn update(pool: &SqlitePool, id: i64, draft: &PostDraft) -> AppResult<Post> {
    let mut tx = pool.begin().await?;

    let post = sqlx::query_as::<_, Post>(&format!(
        "UPDATE posts SET title = ?, content = ?, published = ? WHERE id = ? RETURNING {POST_COLUMNS}"
    ))
    .bind(&draft.title)
    .bind(&draft.content)
    .bind(draft.published)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| post_not_found(id))?;

    tx.commit().await?;
    Ok(post)
}

pub async fn delete(pool: &SqlitePool, id: i64) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(post_not_found(id));
    }

    tx.commit().await?;
    Ok(())
}

pub(crate) fn post_not_found(id: i64) -> AppError {
    AppError::not_found(format!("post with id: {id} was not found"))
}
