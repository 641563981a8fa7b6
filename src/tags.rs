//! Tag filtering and ordering.
//!
//! Raw tags are narrowed by `git.tag_pattern` and `git.ignore_tags`, marked
//! by `git.skip_tags`, and ordered oldest to newest. The resulting
//! [`TagIndex`] answers which tag closes the release a commit belongs to.
use glob::Pattern;
use log::*;
use regex::Regex;
use std::{cmp::Ordering, collections::HashMap};

use crate::{
    config::GitConfig,
    error::{ChroniclerError, Result},
    release::Tag,
    source::{RawCommit, RawTag},
};

/// Compiled tag selection settings.
#[derive(Debug)]
pub struct TagFilter {
    pattern: Option<Pattern>,
    ignore: Option<Regex>,
    skip: Option<Regex>,
    topo_order: bool,
}

impl TagFilter {
    /// Compile `tag_pattern`, `ignore_tags` and `skip_tags`.
    pub fn new(config: &GitConfig) -> Result<Self> {
        let pattern = config
            .tag_pattern
            .as_deref()
            .map(Pattern::new)
            .transpose()
            .map_err(|err| {
                ChroniclerError::config("git.tag_pattern", err.to_string())
            })?;

        let compile = |key: &str, value: &Option<String>| {
            value
                .as_deref()
                .map(Regex::new)
                .transpose()
                .map_err(|err| ChroniclerError::config(key, err.to_string()))
        };

        Ok(Self {
            pattern,
            ignore: compile("git.ignore_tags", &config.ignore_tags)?,
            skip: compile("git.skip_tags", &config.skip_tags)?,
            topo_order: config.topo_order,
        })
    }

    /// Whether the tag takes part in release grouping at all.
    fn accepts(&self, name: &str) -> bool {
        if let Some(pattern) = &self.pattern
            && !pattern.matches(name)
        {
            return false;
        }

        !self.ignore.as_ref().is_some_and(|re| re.is_match(name))
    }

    /// Build the index for a walk of commits, newest first. Tags on commits
    /// outside the walk cannot bound a release and are left out.
    pub fn index(&self, raw_tags: Vec<RawTag>, walk: &[RawCommit]) -> TagIndex {
        // position 0 is the oldest commit of the walk
        let walk_positions: HashMap<&str, usize> = walk
            .iter()
            .rev()
            .enumerate()
            .map(|(position, commit)| (commit.id.as_str(), position))
            .collect();

        let mut entries = vec![];

        for raw in raw_tags {
            if !self.accepts(&raw.name) {
                debug!("ignoring tag: {}", raw.name);
                continue;
            }

            let Some(&walk_position) = walk_positions.get(raw.sha.as_str())
            else {
                debug!("tag {} is outside of the commit range", raw.name);
                continue;
            };

            let skipped = self.skip.as_ref().is_some_and(|re| re.is_match(&raw.name));

            entries.push((
                walk_position,
                Tag {
                    semver: Tag::parse_semver(&raw.name),
                    skipped,
                    name: raw.name,
                    sha: raw.sha,
                    timestamp: raw.timestamp,
                },
            ));
        }

        let topo_order = self.topo_order;
        entries.sort_by(|(pos_a, a), (pos_b, b)| {
            let by_position = if topo_order {
                pos_a.cmp(pos_b)
            } else {
                Ordering::Equal
            };

            by_position
                .then_with(|| a.timestamp.cmp(&b.timestamp))
                .then_with(|| a.semver.cmp(&b.semver))
                .then_with(|| a.name.cmp(&b.name))
        });

        let tags: Vec<Tag> = entries.into_iter().map(|(_, tag)| tag).collect();

        // the newest tag on a commit closes its release
        let by_commit = tags
            .iter()
            .enumerate()
            .map(|(position, tag)| (tag.sha.clone(), position))
            .collect();

        info!("indexed {} tags", tags.len());

        TagIndex { tags, by_commit }
    }
}

/// Release boundary tags ordered oldest to newest.
#[derive(Debug, Default)]
pub struct TagIndex {
    tags: Vec<Tag>,
    by_commit: HashMap<String, usize>,
}

impl TagIndex {
    /// All boundary tags, oldest first.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// The tag closing the release that ends at this commit.
    pub fn tag_for_commit(&self, id: &str) -> Option<&Tag> {
        self.by_commit.get(id).map(|&position| &self.tags[position])
    }

    /// Ordering position of a tag, 0 being the oldest.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.tags.iter().position(|tag| tag.name == name)
    }
}
