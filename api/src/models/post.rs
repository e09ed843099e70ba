use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    pub published: bool,
    pub created_at: chrono::NaiveDateTime,
    pub author_id: i64,
}

/// A post together with the number of votes cast on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostWithVotes {
    #[sqlx(flatten)]
    pub post: Post,
    pub votes: i64,
}

/// Body for both create and full update. Any author field sent by the
/// client is ignored; the author always comes from the token.
#[derive(Debug, Deserialize)]
pub struct PostPayload {
    pub title: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
}

/// Validated post fields ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub content: Option<String>,
    pub published: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub limit: Option<i64>,
    #[serde(alias = "skip")]
    pub offset: Option<i64>,
}

pub const DEFAULT_LIMIT: i64 = 10;
pub const DEFAULT_OFFSET: i64 = 0;

/// Resolved listing parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostFilter {
    pub search: String,
    pub limit: i64,
    pub offset: i64,
}

impl Default for PostFilter {
    fn default() -> Self {
        Self {
            search: String::new(),
            limit: DEFAULT_LIMIT,
            offset: DEFAULT_OFFSET,
        }
    }
}
