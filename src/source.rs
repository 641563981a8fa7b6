//! Raw commit and tag records, the traits that produce them, and the retry
//! policy applied to every fetch.
use log::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::Path,
    sync::LazyLock,
};

use crate::error::{ChroniclerError, Result};

/// Matches `(#123)` style pull request references
static PR_REFERENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(#(?<number>[0-9]+)\)").unwrap());

/// Matches the subject of a forge generated merge commit
static MERGE_PR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Merge pull request #(?<number>[0-9]+) from (?<user>[^/\s]+)/")
        .unwrap()
});

/// Minimum length of an abbreviated commit id in a metadata file
const MIN_ID_PREFIX_LEN: usize = 7;

/// Pull request details associated with a commit on the hosting forge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteInfo {
    pub pr_number: Option<u64>,
    pub pr_title: Option<String>,
    pub username: Option<String>,
}

/// Commit as read from the repository, before any processing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCommit {
    pub id: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub timestamp: i64,
    pub merge_commit: bool,
    /// Ids of the parent commits, first parent first
    pub parents: Vec<String>,
    pub remote: Option<RemoteInfo>,
}

/// Tag as read from the repository, before pattern filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTag {
    /// Tag name without the `refs/tags/` prefix
    pub name: String,
    /// Id of the tagged commit
    pub sha: String,
    /// Tagger time for annotated tags, commit time otherwise
    pub timestamp: i64,
}

/// Source of commit history and tags.
pub trait CommitSource {
    /// Commits reachable from the range, newest first with every commit
    /// ahead of its parents. `range` accepts a single revision or
    /// `from..to`; `None` walks from HEAD.
    fn commits(&self, range: Option<&str>) -> Result<Vec<RawCommit>>;

    /// Every tag in the repository.
    fn tags(&self) -> Result<Vec<RawTag>>;
}

/// Lookup of forge metadata for a commit.
#[cfg_attr(test, mockall::automock)]
pub trait RemoteMetadata {
    fn lookup(&self, commit: &RawCommit) -> Result<Option<RemoteInfo>>;
}

/// Runs a fetch, retrying once if the first failure is transient.
pub fn with_retry<T>(
    what: &str,
    mut fetch: impl FnMut() -> Result<T>,
) -> Result<T> {
    match fetch() {
        Err(err) if err.is_transient() => {
            warn!("transient failure fetching {what}, retrying once: {err}");
            fetch()
        }
        result => result,
    }
}

/// Fills in remote info for each commit that has none, asking each provider
/// in turn until one answers.
pub fn attach_remote_metadata(
    commits: &mut [RawCommit],
    providers: &[&dyn RemoteMetadata],
) -> Result<()> {
    for commit in commits.iter_mut().filter(|c| c.remote.is_none()) {
        for provider in providers {
            let what = format!("remote metadata for {}", commit.id);
            if let Some(info) = with_retry(&what, || provider.lookup(commit))? {
                debug!("attached remote metadata to {}: {:?}", commit.id, info);
                commit.remote = Some(info);
                break;
            }
        }
    }

    Ok(())
}

/// Derives remote info from conventions in the commit message itself:
/// `(#123)` suffixes added by squash merges and the subject of forge merge
/// commits.
#[derive(Debug, Default)]
pub struct MessageMetadata;

impl RemoteMetadata for MessageMetadata {
    fn lookup(&self, commit: &RawCommit) -> Result<Option<RemoteInfo>> {
        let subject = commit.message.lines().next().unwrap_or_default();

        if let Some(caps) = MERGE_PR_REGEX.captures(subject) {
            let title = commit
                .message
                .lines()
                .skip(1)
                .map(str::trim)
                .find(|line| !line.is_empty())
                .map(str::to_string);

            return Ok(Some(RemoteInfo {
                pr_number: caps["number"].parse().ok(),
                pr_title: title,
                username: Some(caps["user"].to_string()),
            }));
        }

        if let Some(caps) = PR_REFERENCE_REGEX.captures(subject) {
            let title = PR_REFERENCE_REGEX.replace(subject, "").trim().to_string();
            return Ok(Some(RemoteInfo {
                pr_number: caps["number"].parse().ok(),
                pr_title: Some(title),
                username: None,
            }));
        }

        Ok(None)
    }
}

/// Remote info loaded from a JSON object keyed by commit id. Keys may be
/// abbreviated ids of at least 7 characters.
#[derive(Debug, Default)]
pub struct JsonMetadata {
    entries: HashMap<String, RemoteInfo>,
}

impl JsonMetadata {
    /// Parse metadata from JSON content.
    pub fn parse(content: &str) -> Result<Self> {
        let entries: HashMap<String, RemoteInfo> =
            serde_json::from_str(content)?;

        Ok(Self { entries })
    }

    /// Read metadata from a file, retrying once on interrupted reads.
    pub fn load(path: &Path) -> Result<Self> {
        let what = format!("remote metadata file {}", path.display());
        let content = with_retry(&what, || {
            fs::read_to_string(path).map_err(|err| match err.kind() {
                ErrorKind::Interrupted
                | ErrorKind::WouldBlock
                | ErrorKind::TimedOut => {
                    ChroniclerError::transient_fetch(&what, err.to_string())
                }
                _ => ChroniclerError::fetch(&what, err.to_string()),
            })
        })?;

        let metadata = Self::parse(&content)?;
        info!(
            "loaded remote metadata for {} commits from {}",
            metadata.entries.len(),
            path.display()
        );
        Ok(metadata)
    }
}

impl RemoteMetadata for JsonMetadata {
    fn lookup(&self, commit: &RawCommit) -> Result<Option<RemoteInfo>> {
        if let Some(info) = self.entries.get(&commit.id) {
            return Ok(Some(info.clone()));
        }

        // the longest matching prefix is the most specific entry
        let info = self
            .entries
            .iter()
            .filter(|(key, _)| key.len() >= MIN_ID_PREFIX_LEN)
            .filter(|(key, _)| commit.id.starts_with(key.as_str()))
            .max_by_key(|(key, _)| key.len())
            .map(|(_, info)| info.clone());

        Ok(info)
    }
}
