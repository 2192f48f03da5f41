use crate::config::Settings;
use crate::db::{self, DbPool};
use crate::dump::{self, DumpReport};
use crate::github::{
    parse_repository_url, GitHubClient, RepositoryInfo, Stream, SyncScheduler, Syncer,
};
use crate::{Error, Result};
use chrono::Utc;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Options of the `sync` command after CLI overrides are applied
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub repos: Vec<String>,
    pub start_page: Option<u32>,
    pub streams: Vec<Stream>,
    pub jobs: usize,
    pub dump: bool,
}

fn parse_repositories(repos: &[String]) -> Result<Vec<RepositoryInfo>> {
    let mut parsed: Vec<RepositoryInfo> = Vec::with_capacity(repos.len());
    for repo in repos {
        let info = parse_repository_url(repo)?;
        if parsed.contains(&info) {
            warn!("Ignoring duplicate repository {}", info);
            continue;
        }
        parsed.push(info);
    }
    Ok(parsed)
}

async fn open_store(settings: &Settings) -> Result<DbPool> {
    let pool = db::init_pool_with_config(&settings.database).await?;
    db::run_migrations(&pool).await?;
    Ok(pool)
}

/// Create the schema, then walk issues and comments of every repository
pub async fn sync(settings: &Settings, options: SyncOptions, cancel: CancellationToken) -> Result<()> {
    let repos = parse_repositories(&options.repos)?;
    let pool = open_store(settings).await?;
    let client = GitHubClient::new(settings.github.clone())?;

    if !settings.github.is_authenticated() {
        warn!("No GitHub credentials configured; unauthenticated requests are limited to 60 per hour");
    }

    // Seeds the shared limiter, so an exhausted quota holds back the first page
    let quota = client.rate_limit().await?;
    info!(
        "GitHub quota: {:?} of {:?} requests remaining",
        quota.remaining, quota.limit
    );

    let syncer = Syncer::new(client, pool.clone(), cancel);
    let scheduler = SyncScheduler::new(syncer, options.jobs);
    let reports = scheduler
        .sync_all(&repos, &options.streams, options.start_page)
        .await?;

    for report in &reports {
        for stream in &report.streams {
            println!(
                "{}: pages {}..{} ({} pages, {} rows){}",
                stream.stream_key,
                stream.first_page,
                stream
                    .last_page
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                stream.pages,
                stream.rows,
                if stream.cancelled { " cancelled" } else { "" }
            );
        }
    }

    if options.dump && !reports.iter().any(|r| r.cancelled()) {
        for repo in &repos {
            print_dump(&dump::dump_repository(&pool, repo, &settings.dump.output_dir).await?);
        }
    }

    Ok(())
}

/// Write transcripts for repositories already in the store
pub async fn dump(settings: &Settings, repos: &[String], output: Option<PathBuf>) -> Result<()> {
    let repos = parse_repositories(repos)?;
    let output_dir = output.unwrap_or_else(|| settings.dump.output_dir.clone());
    let pool = open_store(settings).await?;

    for repo in &repos {
        let report = dump::dump_repository(&pool, repo, &output_dir).await?;
        if report.entries == 0 {
            warn!("No stored issues for {}; run `issuedump sync {}` first", repo, repo);
        }
        print_dump(&report);
    }

    Ok(())
}

fn print_dump(report: &DumpReport) {
    println!(
        "✓ Wrote {} ({} issues, {} entries)",
        report.path.display(),
        report.issues,
        report.entries
    );
}

/// Print checkpoints and row counts of one repository
pub async fn status(settings: &Settings, repo: &str) -> Result<()> {
    let repo = parse_repository_url(repo)?;
    let pool = open_store(settings).await?;

    let checkpoints = db::checkpoints::list_checkpoints(&pool, &repo.owner, &repo.repo).await?;
    let rows = db::comments::count_rows(&pool, &repo.owner, &repo.repo).await?;
    let issues = db::comments::count_issues(&pool, &repo.owner, &repo.repo).await?;

    println!("{repo}");
    println!("  Issues: {issues}");
    println!("  Rows:   {rows}");
    if checkpoints.is_empty() {
        println!("  Never synced");
    }
    for checkpoint in checkpoints {
        println!(
            "  {}: last page {} (updated {})",
            checkpoint.stream_key,
            checkpoint.last_page,
            checkpoint.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }

    Ok(())
}

/// Print the core API quota
pub async fn limits(settings: &Settings) -> Result<()> {
    let client = GitHubClient::new(settings.github.clone())?;
    let status = client.rate_limit().await?;

    let (Some(remaining), Some(limit)) = (status.remaining, status.limit) else {
        return Err(Error::Data("rate limit response without quota".to_string()));
    };

    println!("Remaining: {remaining}/{limit}");
    if let Some(reset_at) = status.reset_at() {
        let minutes = (reset_at - Utc::now()).num_minutes().max(0);
        println!(
            "Resets:    {} (in {} min)",
            reset_at.format("%Y-%m-%d %H:%M:%S UTC"),
            minutes
        );
    }

    Ok(())
}

pub async fn migrate(settings: &Settings) -> Result<()> {
    info!("Running database migrations");
    open_store(settings).await?;
    println!("✓ Database migrations completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repositories_drops_duplicates() {
        let repos = parse_repositories(&[
            "dfm/emcee".to_string(),
            "https://github.com/dfm/emcee".to_string(),
            "dfm/george".to_string(),
        ])
        .unwrap();
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[1].repo, "george");
    }

    #[test]
    fn test_parse_repositories_rejects_bad_input() {
        assert!(parse_repositories(&["emcee".to_string()]).is_err());
    }
}
