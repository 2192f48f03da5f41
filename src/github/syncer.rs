use crate::db::{self, models::CommentRow, DbPool};
use crate::github::{
    client::GitHubClient,
    models::{Issue, IssueComment, Stream, StreamItem},
    parser::RepositoryInfo,
    rate_limiter::Gate,
};
use crate::Result;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// What a single stream run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub stream_key: String,
    /// Page the run started from
    pub first_page: u32,
    /// Last page committed by this run
    pub last_page: Option<u32>,
    /// Non-empty pages stored
    pub pages: u32,
    /// Rows written (two per issue, one per comment)
    pub rows: u64,
    pub cancelled: bool,
}

impl SyncReport {
    fn new(stream_key: String, first_page: u32) -> Self {
        Self {
            stream_key,
            first_page,
            last_page: None,
            pages: 0,
            rows: 0,
            cancelled: false,
        }
    }
}

/// Reports for every stream of one repository, in sync order
#[derive(Debug, Clone)]
pub struct RepositorySyncReport {
    pub repository: RepositoryInfo,
    pub streams: Vec<SyncReport>,
}

impl RepositorySyncReport {
    pub fn rows(&self) -> u64 {
        self.streams.iter().map(|s| s.rows).sum()
    }

    pub fn cancelled(&self) -> bool {
        self.streams.iter().any(|s| s.cancelled)
    }
}

/// Walks a repository's paged streams into the store, resuming from the
/// stored checkpoints.
///
/// The checkpoint of a stream is the last page committed. A resumed run
/// fetches that page again: with items sorted oldest first, it is the only
/// committed page that can have grown since.
#[derive(Clone)]
pub struct Syncer {
    client: GitHubClient,
    pool: DbPool,
    cancel: CancellationToken,
}

impl Syncer {
    pub fn new(client: GitHubClient, pool: DbPool, cancel: CancellationToken) -> Self {
        Self {
            client,
            pool,
            cancel,
        }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Same client and store, different cancellation scope
    pub fn with_cancellation(&self, cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..self.clone()
        }
    }

    /// Sync the given streams of a repository one after another.
    /// `start_page` overrides the stored checkpoint of every stream.
    pub async fn sync_repository(
        &self,
        repo: &RepositoryInfo,
        streams: &[Stream],
        start_page: Option<u32>,
    ) -> Result<RepositorySyncReport> {
        let mut reports = Vec::with_capacity(streams.len());

        for &stream in streams {
            let report = self.sync_stream(repo, stream, start_page).await?;
            let cancelled = report.cancelled;
            reports.push(report);
            if cancelled {
                break;
            }
        }

        Ok(RepositorySyncReport {
            repository: repo.clone(),
            streams: reports,
        })
    }

    /// Fetch pages of one stream until GitHub returns an empty page
    pub async fn sync_stream(
        &self,
        repo: &RepositoryInfo,
        stream: Stream,
        start_page: Option<u32>,
    ) -> Result<SyncReport> {
        let stream_key = stream.key(repo);
        let first_page = match start_page {
            Some(page) => page.max(db::checkpoints::FIRST_PAGE),
            None => db::checkpoints::get_checkpoint(&self.pool, &stream_key).await?,
        };

        info!("Syncing {} from page {}", stream_key, first_page);
        let mut report = SyncReport::new(stream_key.clone(), first_page);
        let mut page = first_page;

        loop {
            if self.cancel.is_cancelled() {
                info!("Sync of {} cancelled before page {}", stream_key, page);
                report.cancelled = true;
                break;
            }

            // Gate every fetch, including the first page of a stream: the
            // previous stream or a sibling repository may have drained the quota
            if self.client.rate_limiter().wait_if_needed(&self.cancel).await? == Gate::Cancelled {
                info!("Sync of {} cancelled while waiting for the rate limit", stream_key);
                report.cancelled = true;
                break;
            }

            let started = Instant::now();
            let rows = match stream {
                Stream::Issues => self.fetch_rows::<Issue>(repo, stream, page).await?,
                Stream::Comments => self.fetch_rows::<IssueComment>(repo, stream, page).await?,
            };

            let Some(rows) = rows else {
                debug!("{} page {} is empty", stream_key, page);
                break;
            };

            let written = db::checkpoints::commit_page(&self.pool, &stream_key, page, &rows).await?;
            report.last_page = Some(page);
            report.pages += 1;
            report.rows += written;

            info!(
                "{} page {}: stored {} rows in {:.2}s",
                stream_key,
                page,
                rows.len(),
                started.elapsed().as_secs_f64()
            );

            page += 1;
        }

        info!(
            "Finished {}: {} pages, {} rows{}",
            stream_key,
            report.pages,
            report.rows,
            if report.cancelled { " (cancelled)" } else { "" }
        );

        Ok(report)
    }

    /// `None` once the stream is exhausted
    async fn fetch_rows<T: StreamItem>(
        &self,
        repo: &RepositoryInfo,
        stream: Stream,
        page: u32,
    ) -> Result<Option<Vec<CommentRow>>> {
        let items = self.client.fetch_page::<T>(repo, stream, page).await?;
        if items.is_empty() {
            return Ok(None);
        }

        let mut rows = Vec::with_capacity(items.len() * 2);
        for item in items {
            rows.extend(item.into_stored_rows(repo)?);
        }

        Ok(Some(rows))
    }
}
