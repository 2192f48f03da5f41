use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored issue opening, issue description, or reply comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CommentRow {
    pub comment_id: i64,
    /// Set on the row holding an issue's title, which opens the issue
    pub is_base: bool,
    pub comment_date: DateTime<Utc>,
    pub owner: String,
    pub repo: String,
    pub issue_number: i64,
    pub commenter: String,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Checkpoint {
    pub stream_key: String,
    pub last_page: i64,
    pub updated_at: DateTime<Utc>,
}
