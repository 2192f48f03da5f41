use crate::db::models::CommentRow;
use crate::github::parser::RepositoryInfo;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two paged sources mirrored per repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    /// Issue metadata and opening post
    Issues,
    /// Replies on issues
    Comments,
}

impl Stream {
    /// Path below `/repos/{owner}/{repo}/`
    pub fn endpoint(&self) -> &'static str {
        match self {
            Stream::Issues => "issues",
            Stream::Comments => "issues/comments",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stream::Issues => "issues",
            Stream::Comments => "comments",
        }
    }

    /// Checkpoint key, e.g. `rust-lang/rust/comments`
    pub fn key(&self, repo: &RepositoryInfo) -> String {
        format!("{}/{}", repo.full_name(), self.as_str())
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quota information taken from `X-RateLimit-*` headers or `/rate_limit`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
    /// Unix timestamp when the quota resets
    pub reset: Option<i64>,
}

impl RateLimitStatus {
    pub fn from_headers(headers: &reqwest::header::HeaderMap) -> Self {
        fn header<T: std::str::FromStr>(headers: &reqwest::header::HeaderMap, name: &str) -> Option<T> {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse().ok())
        }

        Self {
            limit: header(headers, "x-ratelimit-limit"),
            remaining: header(headers, "x-ratelimit-remaining"),
            reset: header(headers, "x-ratelimit-reset"),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        self.reset.and_then(|ts| DateTime::from_timestamp(ts, 0))
    }
}

/// `GET /rate_limit` response
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitResponse {
    pub resources: RateLimitResources,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitResources {
    pub core: RateLimitResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitResource {
    pub limit: u32,
    pub remaining: u32,
    pub reset: i64,
}

impl From<RateLimitResponse> for RateLimitStatus {
    fn from(response: RateLimitResponse) -> Self {
        let core = response.resources.core;
        Self {
            limit: Some(core.limit),
            remaining: Some(core.remaining),
            reset: Some(core.reset),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub login: Option<String>,
}

/// Issue as returned by `/repos/{owner}/{repo}/issues`.
///
/// Fields are optional so that a missing one surfaces as [`Error::Data`]
/// naming the field, rather than an opaque decode failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: Option<i64>,
    pub number: Option<i64>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub user: Option<User>,
}

/// Comment as returned by `/repos/{owner}/{repo}/issues/comments`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueComment {
    pub id: Option<i64>,
    pub issue_url: Option<String>,
    pub body: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub user: Option<User>,
}

fn required<T>(value: Option<T>, kind: &str, id: Option<i64>, field: &str) -> Result<T> {
    value.ok_or_else(|| match id {
        Some(id) => Error::Data(format!("{kind} {id} is missing `{field}`")),
        None => Error::Data(format!("{kind} is missing `{field}`")),
    })
}

fn login(user: Option<User>, kind: &str, id: i64) -> Result<String> {
    let user = required(user, kind, Some(id), "user")?;
    required(user.login, kind, Some(id), "user.login")
}

impl Issue {
    /// Split an issue into its stored rows: the description as an ordinary
    /// row, and the title as the `is_base` row marking the issue start.
    pub fn into_rows(self, repo: &RepositoryInfo) -> Result<[CommentRow; 2]> {
        let id = required(self.id, "issue", None, "id")?;
        let number = required(self.number, "issue", Some(id), "number")?;
        let title = required(self.title, "issue", Some(id), "title")?;
        let created_at = required(self.created_at, "issue", Some(id), "created_at")?;
        let commenter = login(self.user, "issue", id)?;

        let description = CommentRow {
            comment_id: id,
            is_base: false,
            comment_date: created_at,
            owner: repo.owner.clone(),
            repo: repo.repo.clone(),
            issue_number: number,
            commenter: commenter.clone(),
            body: self.body,
        };
        let opening = CommentRow {
            is_base: true,
            body: Some(title),
            commenter,
            ..description.clone()
        };

        Ok([opening, description])
    }
}

impl IssueComment {
    pub fn into_row(self, repo: &RepositoryInfo) -> Result<CommentRow> {
        let id = required(self.id, "comment", None, "id")?;
        let issue_url = required(self.issue_url, "comment", Some(id), "issue_url")?;
        let created_at = required(self.created_at, "comment", Some(id), "created_at")?;
        let commenter = login(self.user, "comment", id)?;

        Ok(CommentRow {
            comment_id: id,
            is_base: false,
            comment_date: created_at,
            owner: repo.owner.clone(),
            repo: repo.repo.clone(),
            issue_number: issue_number_from_url(&issue_url)?,
            commenter,
            body: self.body,
        })
    }
}

/// An item of a paged stream that turns into stored rows
pub trait StreamItem: DeserializeOwned {
    fn into_stored_rows(self, repo: &RepositoryInfo) -> Result<Vec<CommentRow>>;
}

impl StreamItem for Issue {
    fn into_stored_rows(self, repo: &RepositoryInfo) -> Result<Vec<CommentRow>> {
        Ok(Vec::from(self.into_rows(repo)?))
    }
}

impl StreamItem for IssueComment {
    fn into_stored_rows(self, repo: &RepositoryInfo) -> Result<Vec<CommentRow>> {
        Ok(vec![self.into_row(repo)?])
    }
}

/// Extract `42` from `https://api.github.com/repos/o/r/issues/42`
pub fn issue_number_from_url(issue_url: &str) -> Result<i64> {
    let url = url::Url::parse(issue_url)
        .map_err(|e| Error::Data(format!("invalid issue_url {issue_url}: {e}")))?;
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .and_then(|last| last.parse().ok())
        .ok_or_else(|| Error::Data(format!("issue_url has no issue number: {issue_url}")))
}
