use crate::db::{models::CommentRow, DbPool};
use crate::error::Result;
use sqlx::SqliteConnection;

/// Write rows, replacing any row with the same
/// `(comment_id, is_base, comment_date)` key
pub async fn upsert_rows(conn: &mut SqliteConnection, rows: &[CommentRow]) -> Result<u64> {
    let mut written = 0;

    for row in rows {
        let result = sqlx::query(
            r#"
            INSERT INTO issue_comments
                (comment_id, is_base, comment_date, owner, repo, issue_number, commenter, body)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (comment_id, is_base, comment_date) DO UPDATE SET
                owner = excluded.owner,
                repo = excluded.repo,
                issue_number = excluded.issue_number,
                commenter = excluded.commenter,
                body = excluded.body
            "#,
        )
        .bind(row.comment_id)
        .bind(row.is_base)
        .bind(row.comment_date)
        .bind(&row.owner)
        .bind(&row.repo)
        .bind(row.issue_number)
        .bind(&row.commenter)
        .bind(&row.body)
        .execute(&mut *conn)
        .await?;

        written += result.rows_affected();
    }

    Ok(written)
}

/// All rows of a repository in transcript order: by issue, then time,
/// with an issue's opening row ahead of anything sharing its timestamp
pub async fn list_repo_rows(pool: &DbPool, owner: &str, repo: &str) -> Result<Vec<CommentRow>> {
    let rows = sqlx::query_as::<_, CommentRow>(
        r#"
        SELECT comment_id, is_base, comment_date, owner, repo, issue_number, commenter, body
        FROM issue_comments
        WHERE owner = ? AND repo = ?
        ORDER BY issue_number ASC, comment_date ASC, is_base DESC, comment_id ASC
        "#,
    )
    .bind(owner)
    .bind(repo)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn count_rows(pool: &DbPool, owner: &str, repo: &str) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM issue_comments WHERE owner = ? AND repo = ?")
            .bind(owner)
            .bind(repo)
            .fetch_one(pool)
            .await?;

    Ok(count)
}

/// Number of distinct issues with an opening row
pub async fn count_issues(pool: &DbPool, owner: &str, repo: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT issue_number) FROM issue_comments WHERE owner = ? AND repo = ? AND is_base = 1",
    )
    .bind(owner)
    .bind(repo)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
