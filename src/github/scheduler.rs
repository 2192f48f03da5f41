use crate::github::{
    models::Stream,
    parser::RepositoryInfo,
    syncer::{RepositorySyncReport, Syncer},
};
use crate::{Error, Result};
use futures::stream::{self, StreamExt};
use tracing::{error, info};

/// Runs several repositories through the [`Syncer`] with a bounded number
/// of repositories in flight. Pages of one repository are always walked in
/// order by a single task.
pub struct SyncScheduler {
    syncer: Syncer,
    jobs: usize,
}

impl SyncScheduler {
    pub fn new(syncer: Syncer, jobs: usize) -> Self {
        Self {
            syncer,
            jobs: jobs.max(1),
        }
    }

    /// Sync every repository. The first failure cancels the others at their
    /// next page boundary and is returned once they have stopped.
    pub async fn sync_all(
        &self,
        repos: &[RepositoryInfo],
        streams: &[Stream],
        start_page: Option<u32>,
    ) -> Result<Vec<RepositorySyncReport>> {
        info!(
            "Syncing {} repositories ({} at a time)",
            repos.len(),
            self.jobs
        );

        let cancel = self.syncer.cancellation().child_token();
        let syncer = self.syncer.with_cancellation(cancel.clone());

        let mut results = stream::iter(repos)
            .map(|repo| {
                let syncer = syncer.clone();
                async move {
                    let result = syncer.sync_repository(repo, streams, start_page).await;
                    (repo, result)
                }
            })
            .buffer_unordered(self.jobs);

        let mut reports = Vec::with_capacity(repos.len());
        let mut first_error: Option<Error> = None;

        while let Some((repo, result)) = results.next().await {
            match result {
                Ok(report) => {
                    info!("Synced {}: {} rows", repo, report.rows());
                    reports.push(report);
                }
                Err(e) => {
                    error!("Failed to sync {}: {}", repo, e.log_safe());
                    cancel.cancel();
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(reports),
        }
    }
}
