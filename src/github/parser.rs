use crate::{Error, Result};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Parsed GitHub repository coordinates
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryInfo {
    pub owner: String,
    pub repo: String,
}

impl RepositoryInfo {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Transcript file name, `{owner}-{repo}.txt`
    pub fn dump_file_name(&self) -> String {
        format!("{}-{}.txt", self.owner, self.repo)
    }
}

impl fmt::Display for RepositoryInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("valid regex"))
}

/// Parse a GitHub repository reference
/// Accepts formats:
/// - https://github.com/owner/repo
/// - https://github.com/owner/repo/
/// - https://github.com/owner/repo.git
/// - github.com/owner/repo
/// - owner/repo
pub fn parse_repository_url(url: &str) -> Result<RepositoryInfo> {
    let url = url.trim();

    // Remove trailing slashes and .git suffix
    let url = url.trim_end_matches('/').trim_end_matches(".git");

    // Remove protocol if present
    let url = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);

    // Remove github.com if present
    let url = url.strip_prefix("github.com/").unwrap_or(url);

    let parts: Vec<&str> = url.split('/').collect();

    if parts.len() < 2 {
        return Err(Error::Validation(
            "Invalid GitHub repository format. Expected: owner/repo".to_string(),
        ));
    }

    let owner = parts[0].trim();
    let repo = parts[1].trim();

    if owner.is_empty() || repo.is_empty() {
        return Err(Error::Validation(
            "Repository owner and name cannot be empty".to_string(),
        ));
    }

    // Names end up in URL paths and in the dump file name
    for name in [owner, repo] {
        if !name_pattern().is_match(name) || name == "." || name == ".." {
            return Err(Error::Validation(format!(
                "Invalid repository name component: {name}"
            )));
        }
    }

    Ok(RepositoryInfo {
        owner: owner.to_string(),
        repo: repo.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_https_url() {
        let info = parse_repository_url("https://github.com/dfm/emcee").unwrap();
        assert_eq!(info.owner, "dfm");
        assert_eq!(info.repo, "emcee");
    }

    #[test]
    fn test_parse_url_with_git_suffix_and_slash() {
        let info = parse_repository_url("https://github.com/dfm/emcee.git").unwrap();
        assert_eq!(info.repo, "emcee");
        let info = parse_repository_url("github.com/dfm/emcee/").unwrap();
        assert_eq!(info.full_name(), "dfm/emcee");
    }

    #[test]
    fn test_parse_short_format() {
        let info = parse_repository_url("rust-lang/rust.vim").unwrap();
        assert_eq!(info.owner, "rust-lang");
        assert_eq!(info.repo, "rust.vim");
        assert_eq!(info.dump_file_name(), "rust-lang-rust.vim.txt");
    }

    #[test]
    fn test_parse_invalid_single_part() {
        assert!(parse_repository_url("dfm").is_err());
    }

    #[test]
    fn test_parse_empty_components() {
        assert!(parse_repository_url("/emcee").is_err());
        assert!(parse_repository_url("dfm/").is_err());
    }

    #[test]
    fn test_parse_rejects_traversal_and_odd_characters() {
        assert!(parse_repository_url("../etc").is_err());
        assert!(parse_repository_url("dfm/em cee").is_err());
        assert!(parse_repository_url("dfm/emcee?x=1").is_err());
    }
}
