//! Local git repository access.
//!
//! [`Repository`] wraps `git2::Repository` and implements [`CommitSource`].
//! Every libgit2 failure is reported as a fetch error, flagged transient when
//! a second attempt could succeed (network, OS and lock errors).
use git2::{ErrorClass, ErrorCode, Oid, Sort};
use log::*;
use std::path::Path;

use crate::{
    error::{ChroniclerError, Result},
    source::{CommitSource, RawCommit, RawTag, with_retry},
};

/// Name of the remote used to infer the hosting repository.
const ORIGIN: &str = "origin";

/// Converts a libgit2 error into a fetch error for `what`.
fn fetch_error(what: &str, err: git2::Error) -> ChroniclerError {
    let transient = matches!(err.class(), ErrorClass::Net | ErrorClass::Os)
        || err.code() == ErrorCode::Locked;

    if transient {
        ChroniclerError::transient_fetch(what, err.message())
    } else {
        ChroniclerError::fetch(what, err.message())
    }
}

/// A local git repository.
pub struct Repository {
    repo: git2::Repository,
}

impl Repository {
    /// Open the repository containing `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let what = format!("repository at {}", path.display());
        let repo = with_retry(&what, || {
            git2::Repository::discover(path).map_err(|err| fetch_error(&what, err))
        })?;

        debug!("opened repository at {}", repo.path().display());

        Ok(Self { repo })
    }

    /// Url of the `origin` remote, if there is one.
    pub fn origin_url(&self) -> Option<String> {
        let remote = self.repo.find_remote(ORIGIN).ok()?;
        remote.url().map(str::to_string)
    }

    /// Whether HEAD points at a branch with no commits yet.
    fn is_unborn(&self) -> std::result::Result<bool, git2::Error> {
        match self.repo.head() {
            Ok(_) => Ok(false),
            Err(err)
                if matches!(
                    err.code(),
                    ErrorCode::UnbornBranch | ErrorCode::NotFound
                ) =>
            {
                Ok(true)
            }
            Err(err) => Err(err),
        }
    }

    fn walk(
        &self,
        range: Option<&str>,
    ) -> std::result::Result<Vec<RawCommit>, git2::Error> {
        if range.is_none() && self.is_unborn()? {
            warn!("repository has no commits yet");
            return Ok(vec![]);
        }

        // children always come before their parents, ties broken by time
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

        match range {
            Some(range) if range.contains("..") => revwalk.push_range(range)?,
            Some(revision) => {
                let commit = self.repo.revparse_single(revision)?.peel_to_commit()?;
                revwalk.push(commit.id())?;
            }
            None => revwalk.push_head()?,
        }

        let mut commits = vec![];

        for oid in revwalk {
            commits.push(self.raw_commit(oid?)?);
        }

        Ok(commits)
    }

    fn raw_commit(&self, oid: Oid) -> std::result::Result<RawCommit, git2::Error> {
        let commit = self.repo.find_commit(oid)?;
        let author = commit.author();

        Ok(RawCommit {
            id: oid.to_string(),
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
            author_name: author.name().unwrap_or_default().to_string(),
            author_email: author.email().unwrap_or_default().to_string(),
            timestamp: commit.time().seconds(),
            merge_commit: commit.parent_count() > 1,
            parents: commit.parent_ids().map(|id| id.to_string()).collect(),
            remote: None,
        })
    }

    fn list_tags(&self) -> std::result::Result<Vec<RawTag>, git2::Error> {
        let mut references = vec![];

        self.repo.tag_foreach(|oid, name| {
            let name = String::from_utf8_lossy(name)
                .trim_start_matches("refs/tags/")
                .to_string();
            references.push((oid, name));
            true
        })?;

        let mut tags = vec![];

        for (oid, name) in references {
            let object = self.repo.find_object(oid, None)?;

            let Ok(commit) = object.peel_to_commit() else {
                debug!("tag {name} does not point to a commit");
                continue;
            };

            // annotated tags carry their own creation time
            let timestamp = object
                .as_tag()
                .and_then(|tag| tag.tagger())
                .map(|tagger| tagger.when().seconds())
                .unwrap_or_else(|| commit.time().seconds());

            tags.push(RawTag {
                name,
                sha: commit.id().to_string(),
                timestamp,
            });
        }

        Ok(tags)
    }
}

impl CommitSource for Repository {
    fn commits(&self, range: Option<&str>) -> Result<Vec<RawCommit>> {
        let what = match range {
            Some(range) => format!("commits in {range}"),
            None => "commits".to_string(),
        };

        let commits = with_retry(&what, || {
            self.walk(range).map_err(|err| fetch_error(&what, err))
        })?;

        info!("found {} commits", commits.len());

        Ok(commits)
    }

    fn tags(&self) -> Result<Vec<RawTag>> {
        let tags = with_retry("tags", || {
            self.list_tags().map_err(|err| fetch_error("tags", err))
        })?;

        debug!("found {} tags", tags.len());

        Ok(tags)
    }
}
