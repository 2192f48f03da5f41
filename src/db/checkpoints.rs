use crate::db::{comments, models::*, DbPool};
use crate::error::Result;
use crate::github::models::Stream;
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

/// Page a stream starts from when it has never been synced
pub const FIRST_PAGE: u32 = 1;

fn is_missing_table(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.message().contains("no such table"),
        _ => false,
    }
}

/// Last completed page for a stream, or page 1 when there is none.
/// A store whose checkpoint table does not exist yet has no checkpoints.
pub async fn get_checkpoint(pool: &DbPool, stream_key: &str) -> Result<u32> {
    let result = sqlx::query_scalar::<_, i64>("SELECT last_page FROM repo_meta WHERE stream_key = ?")
        .bind(stream_key)
        .fetch_optional(pool)
        .await;

    let page = match result {
        Ok(page) => page,
        Err(e) if is_missing_table(&e) => {
            debug!("Checkpoint table missing, starting {} from page 1", stream_key);
            None
        }
        Err(e) => return Err(e.into()),
    };

    Ok(page
        .and_then(|p| u32::try_from(p).ok())
        .unwrap_or(FIRST_PAGE)
        .max(FIRST_PAGE))
}

pub async fn set_checkpoint(conn: &mut SqliteConnection, stream_key: &str, page: u32) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO repo_meta (stream_key, last_page, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT (stream_key) DO UPDATE SET
            last_page = excluded.last_page,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(stream_key)
    .bind(i64::from(page))
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Store a page's rows and advance the stream's checkpoint to `page` as a
/// single transaction. Either both land or neither does.
pub async fn commit_page(
    pool: &DbPool,
    stream_key: &str,
    page: u32,
    rows: &[CommentRow],
) -> Result<u64> {
    let mut tx = pool.begin().await?;

    let written = comments::upsert_rows(&mut *tx, rows).await?;
    set_checkpoint(&mut *tx, stream_key, page).await?;

    tx.commit().await?;
    Ok(written)
}

/// Checkpoints of every stream belonging to `owner/repo`
pub async fn list_checkpoints(pool: &DbPool, owner: &str, repo: &str) -> Result<Vec<Checkpoint>> {
    let checkpoints = sqlx::query_as::<_, Checkpoint>(
        "SELECT stream_key, last_page, updated_at FROM repo_meta WHERE stream_key IN (?, ?) ORDER BY stream_key",
    )
    .bind(format!("{owner}/{repo}/{}", Stream::Issues))
    .bind(format!("{owner}/{repo}/{}", Stream::Comments))
    .fetch_all(pool)
    .await?;

    Ok(checkpoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_pool, run_migrations};

    #[tokio::test]
    async fn test_missing_checkpoint_defaults_to_first_page() {
        let pool = init_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        assert_eq!(get_checkpoint(&pool, "octo/widgets/issues").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_table_counts_as_no_checkpoint() {
        let pool = init_pool("sqlite::memory:").await.unwrap();

        assert_eq!(get_checkpoint(&pool, "octo/widgets/issues").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_set_and_overwrite_checkpoint() {
        let pool = init_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        set_checkpoint(&mut conn, "octo/widgets/comments", 4).await.unwrap();
        set_checkpoint(&mut conn, "octo/widgets/comments", 5).await.unwrap();
        set_checkpoint(&mut conn, "octo/gadgets/comments", 9).await.unwrap();
        drop(conn);

        assert_eq!(get_checkpoint(&pool, "octo/widgets/comments").await.unwrap(), 5);

        let listed = list_checkpoints(&pool, "octo", "widgets").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].last_page, 5);
    }
}
