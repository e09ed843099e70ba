use sqlx::SqlitePool;

use crate::{
    error::{AppError, AppResult},
    models::user::User,
};

const USER_COLUMNS: &str = "id, email, password_hash, created_at, phone_number";

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Inserts a user. The email lookup gives the friendly error; the unique
/// index decides when two registrations race.
pub async fn insert(
    pool: &SqlitePool,
    email: &str,
    password_hash: &str,
    phone_number: Option<&str>,
) -> AppResult<User> {
    if find_by_email(pool, email).await?.is_some() {
        return Err(email_taken());
    }

    insert_row(pool, email, password_hash, phone_number).await
}

async fn insert_row(
    pool: &SqlitePool,
    email: &str,
    password_hash: &str,
    phone_number: Option<&str>,
) -> AppResult<User> {
    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (email, password_hash, phone_number) VALUES (?, ?, ?) RETURNING {USER_COLUMNS}"
    ))
    .bind(email)
    .bind(password_hash)
    .bind(phone_number)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match e.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => email_taken(),
        _ => AppError::from(e),
    })?;

    tx.commit().await?;
    Ok(user)
}

pub(crate) fn email_taken() -> AppError {
    AppError::Conflict("A user with this email already exists".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;

    #[tokio::test]
    async fn insert_then_find() {
        let pool = test_support::pool().await;
        let user = insert(&pool, "a@x.com", "hash", Some("555-0100"))
            .await
            .unwrap();

        let by_email = find_by_email(&pool, "a@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert_eq!(by_email.phone_number.as_deref(), Some("555-0100"));

        let by_id = find_by_id(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@x.com");
        assert_eq!(by_id.password_hash, "hash");
    }

    #[tokio::test]
    async fn unknown_user_is_none() {
        let pool = test_support::pool().await;
        assert!(find_by_id(&pool, 99).await.unwrap().is_none());
        assert!(find_by_email(&pool, "nobody@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let pool = test_support::pool().await;
        insert(&pool, "a@x.com", "hash", None).await.unwrap();

        let err = insert(&pool, "a@x.com", "other", None).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn duplicate_row_is_a_conflict_not_a_store_error() {
        let pool = test_support::pool().await;
        insert_row(&pool, "a@x.com", "hash", None).await.unwrap();

        let err = insert_row(&pool, "a@x.com", "other", None).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg.contains("already exists")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registrations_yield_one_user_and_conflicts() {
        let (_dir, pool) = test_support::file_pool().await;

        let handles: Vec<_> = (0..6)
            .map(|n| {
                let pool = pool.clone();
                tokio::spawn(async move {
                    insert(&pool, "race@x.com", &format!("hash-{n}"), None).await
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(AppError::Conflict(_)) => {}
                Err(other) => panic!("unexpected registration result: {other:?}"),
            }
        }
        assert_eq!(created, 1);

        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(users, 1);
    }

    #[tokio::test]
    async fn deleting_a_user_cascades_to_posts_and_votes() {
        let pool = test_support::pool().await;
        let author = test_support::user(&pool, "author@x.com").await;
        let post = crate::db::posts::insert(&pool, author.id, &test_support::draft("hello"))
            .await
            .unwrap();
        crate::db::votes::cast_vote(
            &pool,
            author.id,
            post.id,
            crate::models::vote::VoteDirection::Add,
        )
        .await
        .unwrap();

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(author.id)
            .execute(&pool)
            .await
            .unwrap();

        let posts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&pool)
            .await
            .unwrap();
        let votes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM votes")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!((posts, votes), (0, 0));
    }
}
