//! Buckets processed commits into releases.
//!
//! A commit belongs to the release of the nearest tag that has it in its
//! history. Ancestry is taken from the raw commit walk rather than from the
//! processed commits, so a tag on a commit that was filtered out still
//! closes its release.
use log::*;
use std::collections::{HashMap, HashSet};

use crate::{
    analyzer::Commit,
    config::{ChangelogConfig, GitConfig, ReleaseOrder, RemoteConfig, SortCommits},
    release::{Contributor, Release, Tag},
    source::RawCommit,
    tags::TagIndex,
};

/// Groups commits into releases and derives per release data.
#[derive(Debug, Clone)]
pub struct Grouper {
    sort_commits: SortCommits,
    limit_commits: Option<usize>,
    release_order: ReleaseOrder,
    remote: RemoteConfig,
}

impl Grouper {
    pub fn new(
        git: &GitConfig,
        changelog: &ChangelogConfig,
        remote: &RemoteConfig,
    ) -> Self {
        Self {
            sort_commits: git.sort_commits,
            limit_commits: git.limit_commits,
            release_order: changelog.release_order,
            remote: remote.clone(),
        }
    }

    /// Replace the remote used for release links.
    pub fn set_remote(&mut self, remote: &RemoteConfig) {
        self.remote = remote.clone();
    }

    /// Partition `processed` into releases, returned oldest first with the
    /// unreleased bucket (if any) last. `walk` is the full raw walk, children
    /// before parents, that `processed` was derived from.
    pub fn group(
        &self,
        walk: &[RawCommit],
        processed: Vec<Commit>,
        tags: &TagIndex,
    ) -> Vec<Release> {
        let owners = assign_owners(walk, tags);

        let mut by_id: HashMap<String, Vec<Commit>> = HashMap::new();
        for commit in processed {
            by_id.entry(commit.id.clone()).or_default().push(commit);
        }

        let mut tagged: HashMap<&str, Release> = HashMap::new();
        let mut current = Release::default();

        for raw in walk.iter().rev() {
            let entries = by_id.remove(&raw.id).unwrap_or_default();

            let Some(tag) = owners.get(raw.id.as_str()) else {
                current.commits.extend(entries);
                current.commit_id = Some(raw.id.clone());
                continue;
            };

            let release =
                tagged.entry(tag.name.as_str()).or_insert_with(|| Release {
                    commit_id: Some(tag.sha.clone()),
                    timestamp: tag.timestamp,
                    link: self.remote.release_link(&tag.name),
                    tag: Some((*tag).clone()),
                    ..Release::default()
                });
            release.commits.extend(entries);
        }

        let mut releases: Vec<Release> = tagged.into_values().collect();

        releases.sort_by_key(|release| {
            release
                .version()
                .and_then(|name| tags.position(name))
                .unwrap_or(usize::MAX)
        });

        releases.retain(|release| {
            let skipped = release.tag.as_ref().is_some_and(|tag| tag.skipped);
            if skipped {
                debug!(
                    "skipping release {} with {} commits",
                    release.version().unwrap_or_default(),
                    release.commits.len()
                );
            }
            !skipped
        });

        if !current.commits.is_empty() {
            current.timestamp = 0;
            releases.push(current);
        }

        self.apply_limit(&mut releases);
        releases.retain(|release| !release.commits.is_empty());

        assign_contributors(&mut releases);
        link_previous(&mut releases);

        if self.sort_commits == SortCommits::Newest {
            for release in releases.iter_mut() {
                release.commits.reverse();
            }
        }

        info!("grouped commits into {} releases", releases.len());

        releases
    }

    /// Put chronologically ordered releases into the configured emission
    /// order.
    pub fn emission_order(&self, mut releases: Vec<Release>) -> Vec<Release> {
        if self.release_order == ReleaseOrder::Newest {
            releases.reverse();
        }
        releases
    }

    /// Drop the oldest commits until at most `limit_commits` remain.
    fn apply_limit(&self, releases: &mut [Release]) {
        let Some(limit) = self.limit_commits else {
            return;
        };

        let total: usize = releases.iter().map(|r| r.commits.len()).sum();
        let mut excess = total.saturating_sub(limit);

        if excess > 0 {
            debug!("limiting changelog to {limit} of {total} commits");
        }

        for release in releases.iter_mut() {
            if excess == 0 {
                break;
            }
            let dropped = excess.min(release.commits.len());
            release.commits.drain(..dropped);
            excess -= dropped;
        }
    }
}

/// Map every commit of the walk to the tag whose release it belongs to.
///
/// Tags are visited ancestors first, and each claims the part of its history
/// that no earlier tag claimed. Claimed commits are closed under ancestry, so
/// the search stops at the first one it meets.
fn assign_owners<'a>(
    walk: &'a [RawCommit],
    tags: &'a TagIndex,
) -> HashMap<&'a str, &'a Tag> {
    let parents: HashMap<&str, &[String]> = walk
        .iter()
        .map(|commit| (commit.id.as_str(), commit.parents.as_slice()))
        .collect();

    let mut owners: HashMap<&str, &Tag> = HashMap::new();

    for raw in walk.iter().rev() {
        let Some(tag) = tags.tag_for_commit(&raw.id) else {
            continue;
        };

        let mut pending = vec![raw.id.as_str()];
        while let Some(id) = pending.pop() {
            if owners.contains_key(id) {
                continue;
            }
            let Some(&commit_parents) = parents.get(id) else {
                // outside of the walked range
                continue;
            };

            owners.insert(id, tag);
            pending.extend(commit_parents.iter().map(String::as_str));
        }
    }

    owners
}

/// Fill in contributors, flagging usernames not seen in any earlier release.
fn assign_contributors(releases: &mut [Release]) {
    let mut seen: HashSet<String> = HashSet::new();

    for release in releases.iter_mut() {
        let mut contributors: Vec<Contributor> = vec![];

        for commit in &release.commits {
            let remote = commit.remote.as_ref();
            let username = remote
                .and_then(|r| r.username.clone())
                .unwrap_or_else(|| commit.author_name.clone());
            let pr_number = remote.and_then(|r| r.pr_number);

            if contributors
                .iter()
                .any(|c| c.username == username && c.pr_number == pr_number)
            {
                continue;
            }

            contributors.push(Contributor {
                is_first_time: !seen.contains(&username),
                pr_title: remote.and_then(|r| r.pr_title.clone()),
                pr_number,
                username,
            });
        }

        seen.extend(contributors.iter().map(|c| c.username.clone()));
        release.contributors = contributors;
    }
}

fn link_previous(releases: &mut [Release]) {
    for index in 1..releases.len() {
        let previous = releases[index - 1].summary();
        releases[index].previous = Some(Box::new(previous));
    }
}

#[cfg(test)]
#[path = "./grouper_tests.rs"]
mod tests;
