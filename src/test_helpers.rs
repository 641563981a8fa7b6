//! Common test helper functions shared across test modules.
//!
//! Provides raw commit fixtures and a builder for throwaway git
//! repositories with deterministic commit times.
use std::{cell::Cell, path::Path};
use tempfile::TempDir;

use crate::{
    analyzer::Commit,
    source::{RawCommit, RemoteInfo},
};

/// Start of the commit clock used by [`TestRepo`].
pub const BASE_TIME: i64 = 1_700_000_000;

/// Creates a raw commit authored by "Test Author" at timestamp 0.
pub fn raw_commit(id: &str, message: &str) -> RawCommit {
    RawCommit {
        id: id.to_string(),
        message: message.to_string(),
        author_name: "Test Author".to_string(),
        author_email: "test@example.com".to_string(),
        timestamp: 0,
        merge_commit: false,
        parents: vec![],
        remote: None,
    }
}

/// Creates a raw commit with a forge username attached.
pub fn raw_commit_by(id: &str, message: &str, username: &str) -> RawCommit {
    RawCommit {
        remote: Some(RemoteInfo {
            username: Some(username.to_string()),
            ..RemoteInfo::default()
        }),
        ..raw_commit(id, message)
    }
}

/// Links a newest-first walk into a single line of history.
pub fn linear(mut walk: Vec<RawCommit>) -> Vec<RawCommit> {
    let ids: Vec<String> = walk.iter().map(|c| c.id.clone()).collect();
    for (index, commit) in walk.iter_mut().enumerate() {
        commit.parents = ids.get(index + 1).cloned().into_iter().collect();
    }
    walk
}

/// Parses raw commits without any filtering.
pub fn parse_all(walk: &[RawCommit]) -> Vec<Commit> {
    walk.iter()
        .map(|raw| Commit::new(raw, &raw.message).parse_conventional())
        .collect()
}

/// A git repository in a temporary directory.
///
/// Each commit is made one minute after the previous one.
pub struct TestRepo {
    pub dir: TempDir,
    pub repo: git2::Repository,
    clock: Cell<i64>,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = git2::Repository::init(dir.path()).unwrap();

        Self {
            dir,
            repo,
            clock: Cell::new(BASE_TIME),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Commits an empty tree on HEAD as "Test Author".
    pub fn commit(&self, message: &str) -> String {
        self.commit_as(message, "Test Author")
    }

    pub fn commit_as(&self, message: &str, author: &str) -> String {
        let parents: Vec<git2::Commit> = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok())
            .into_iter()
            .collect();

        self.write_commit(message, author, Some("HEAD"), &parents)
    }

    /// Commits on top of `parent` without moving HEAD, like a commit on a
    /// branch that is not checked out.
    pub fn side_commit(&self, message: &str, parent: &str) -> String {
        let parent = self.find(parent);
        self.write_commit(message, "Test Author", None, &[parent])
    }

    /// Merges `other` into HEAD with a merge commit.
    pub fn merge(&self, message: &str, other: &str) -> String {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap();
        let other = self.find(other);
        self.write_commit(message, "Test Author", Some("HEAD"), &[head, other])
    }

    fn find(&self, id: &str) -> git2::Commit<'_> {
        self.repo
            .find_commit(git2::Oid::from_str(id).unwrap())
            .unwrap()
    }

    fn write_commit(
        &self,
        message: &str,
        author: &str,
        update_ref: Option<&str>,
        parents: &[git2::Commit],
    ) -> String {
        let time = self.tick();
        let signature = git2::Signature::new(
            author,
            &format!("{}@example.com", author.to_lowercase().replace(' ', ".")),
            &git2::Time::new(time, 0),
        )
        .unwrap();

        let tree_id = self.repo.index().unwrap().write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();
        let parents: Vec<&git2::Commit> = parents.iter().collect();

        self.repo
            .commit(update_ref, &signature, &signature, message, &tree, &parents)
            .unwrap()
            .to_string()
    }

    /// Creates a lightweight tag.
    pub fn tag(&self, name: &str, id: &str) {
        let object = self.repo.revparse_single(id).unwrap();
        self.repo.tag_lightweight(name, &object, false).unwrap();
    }

    /// Creates an annotated tag with an explicit tagger time.
    pub fn annotated_tag(&self, name: &str, id: &str, timestamp: i64) {
        let object = self.repo.revparse_single(id).unwrap();
        let tagger = git2::Signature::new(
            "Release Bot",
            "release@example.com",
            &git2::Time::new(timestamp, 0),
        )
        .unwrap();
        self.repo.tag(name, &object, &tagger, name, false).unwrap();
    }

    /// Adds an `origin` remote.
    pub fn set_origin(&self, url: &str) {
        self.repo.remote("origin", url).unwrap();
    }

    fn tick(&self) -> i64 {
        let time = self.clock.get();
        self.clock.set(time + 60);
        time
    }
}
