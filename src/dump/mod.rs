// Transcript export: flattens a repository's stored rows into one text file

pub mod transcript;

use crate::db::{self, DbPool};
use crate::github::RepositoryInfo;
use crate::Result;
use std::path::{Path, PathBuf};
use tracing::info;

pub use transcript::{render_transcript, Transcript};

#[derive(Debug, Clone)]
pub struct DumpReport {
    pub path: PathBuf,
    pub issues: usize,
    pub entries: usize,
}

/// Write `{output_dir}/{owner}-{repo}.txt` from the stored rows
pub async fn dump_repository(
    pool: &DbPool,
    repo: &RepositoryInfo,
    output_dir: &Path,
) -> Result<DumpReport> {
    let rows = db::comments::list_repo_rows(pool, &repo.owner, &repo.repo).await?;
    let transcript = render_transcript(&rows);

    tokio::fs::create_dir_all(output_dir).await?;
    let path = output_dir.join(repo.dump_file_name());
    tokio::fs::write(&path, transcript.text.as_bytes()).await?;

    info!(
        "Dumped {}: {} issues, {} entries -> {}",
        repo,
        transcript.issues,
        transcript.entries,
        path.display()
    );

    Ok(DumpReport {
        path,
        issues: transcript.issues,
        entries: transcript.entries,
    })
}
