//! Data types for releases, tags, and contributors.
use semver::Version;
use serde::{Serialize, ser::SerializeStruct};
use std::fmt::Display;

use crate::analyzer::commit::Commit;

/// Git tag that marks a release boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    /// Tag name.
    pub name: String,
    /// Git commit SHA of the tag.
    pub sha: String,
    /// Semantic version parsed from tag name, if it contains one.
    pub semver: Option<Version>,
    /// Timestamp of tag
    pub timestamp: i64,
    /// Release for this tag is left out of the changelog
    pub skipped: bool,
}

impl Tag {
    /// Parses the version portion of a tag name, ignoring any non-numeric
    /// prefix such as `v` or `my-package-v`.
    pub fn parse_semver(name: &str) -> Option<Version> {
        let version = name.trim_start_matches(|c: char| !c.is_ascii_digit());
        Version::parse(version).ok()
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Someone who contributed commits to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contributor {
    pub username: String,
    pub pr_number: Option<u64>,
    pub pr_title: Option<String>,
    /// First release in this changelog where the username appears
    pub is_first_time: bool,
}

/// Commits bounded by a tag, or by HEAD when `tag` is `None`.
#[derive(Clone, Default)]
pub struct Release {
    /// Associated version tag. `None` for unreleased commits.
    pub tag: Option<Tag>,
    /// Id of the newest commit in the release.
    pub commit_id: Option<String>,
    /// Release timestamp.
    pub timestamp: i64,
    /// Release URL link.
    pub link: Option<String>,
    /// Commits included in this release.
    pub commits: Vec<Commit>,
    /// Authors of the commits in this release.
    pub contributors: Vec<Contributor>,
    /// The release before this one, without commits.
    pub previous: Option<Box<Release>>,
}

impl Release {
    /// Tag name of the release, if tagged.
    pub fn version(&self) -> Option<&str> {
        self.tag.as_ref().map(|t| t.name.as_str())
    }

    /// Copy of this release without commits, used as `previous`.
    pub fn summary(&self) -> Self {
        Self {
            tag: self.tag.clone(),
            commit_id: self.commit_id.clone(),
            timestamp: self.timestamp,
            link: self.link.clone(),
            ..Self::default()
        }
    }
}

impl std::fmt::Debug for Release {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Release")
            .field("tag", &self.tag)
            .field("commit_id", &self.commit_id)
            .field("timestamp", &self.timestamp)
            .field("commits", &self.commits.len())
            .field("contributors", &self.contributors.len())
            .finish()
    }
}

impl Serialize for Release {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let semver = self
            .tag
            .as_ref()
            .and_then(|t| t.semver.as_ref())
            .map(|v| v.to_string());

        let mut s = serializer.serialize_struct("Release", 8)?;
        s.serialize_field("version", &self.version())?;
        s.serialize_field("semver", &semver)?;
        s.serialize_field("commit_id", &self.commit_id)?;
        s.serialize_field("timestamp", &self.timestamp)?;
        s.serialize_field("link", &self.link)?;
        s.serialize_field("commits", &self.commits)?;
        s.serialize_field("contributors", &self.contributors)?;
        s.serialize_field("previous", &self.previous)?;
        s.end()
    }
}
