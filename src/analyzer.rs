//! Commit preprocessing, conventional commit parsing, grouping and filtering.
//!
//! Turns raw commits into the processed [`Commit`] records that end up in the
//! changelog. All regexes are compiled in [`Analyzer::new`] so that a bad
//! configuration fails before any commit is looked at.

use log::*;

use crate::{
    config::{GitConfig, RemoteConfig},
    error::Result,
    processor::{self, Substitution},
    source::RawCommit,
};

pub mod commit;
pub mod group;

pub use commit::Commit;

/// Runs the commit filter pipeline configured by [`GitConfig`].
#[derive(Debug)]
pub struct Analyzer {
    config: GitConfig,
    remote: RemoteConfig,
    preprocessors: Vec<Substitution>,
    group_parser: group::GroupParser,
}

impl Analyzer {
    /// Compile preprocessors and grouping rules.
    pub fn new(config: &GitConfig, remote: &RemoteConfig) -> Result<Self> {
        let preprocessors = Substitution::compile_all(
            "git.commit_preprocessors",
            &config.commit_preprocessors,
        )?;

        let group_parser = group::GroupParser::new(&config.commit_parsers)?;

        Ok(Self {
            config: config.clone(),
            remote: remote.clone(),
            preprocessors,
            group_parser,
        })
    }

    /// Replace the remote used for commit links.
    pub fn set_remote(&mut self, remote: &RemoteConfig) {
        self.remote = remote.clone();
    }

    /// Process raw commits, preserving their order. Split commits appear in
    /// place of the commit they came from, in line order.
    pub fn process(&self, raw_commits: &[RawCommit]) -> Vec<Commit> {
        let mut processed = vec![];

        for raw in raw_commits {
            let message = processor::apply_all(&self.preprocessors, &raw.message);

            for entry in self.split(&message) {
                if let Some(commit) = self.process_entry(raw, entry) {
                    processed.push(commit);
                }
            }
        }

        info!(
            "processed {} commits into {} changelog entries",
            raw_commits.len(),
            processed.len()
        );

        processed
    }

    fn split<'m>(&self, message: &'m str) -> Vec<&'m str> {
        if !self.config.split_commits {
            return vec![message];
        }

        message
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }

    fn process_entry(&self, raw: &RawCommit, message: &str) -> Option<Commit> {
        let mut commit = Commit::new(raw, message);

        if self.config.conventional_commits {
            commit = commit.parse_conventional();

            if self.config.filter_unconventional
                && !commit.conventional
                && !self.is_protected(&commit)
            {
                debug!("skipping unconventional commit: {}", commit.short_id);
                return None;
            }
        }

        match self.group_parser.find(&commit) {
            Some(rule) => {
                if rule.skip && !self.is_protected(&commit) {
                    debug!("skipping commit by rule: {}", commit.short_id);
                    return None;
                }

                commit.group = rule.group.clone();

                if rule.scope.is_some() {
                    commit.scope = rule.scope.clone();
                } else if commit.scope.is_none() {
                    commit.scope = rule.default_scope.clone();
                }
            }
            None => {
                if self.config.filter_commits && !self.is_protected(&commit) {
                    debug!("skipping unmatched commit: {}", commit.short_id);
                    return None;
                }

                commit.group = self.group_parser.fallback().map(str::to_string);
            }
        }

        commit.link = self.remote.commit_link(&commit.id);

        Some(commit)
    }

    fn is_protected(&self, commit: &Commit) -> bool {
        self.config.protect_breaking_commits && commit.breaking
    }
}

#[cfg(test)]
#[path = "./analyzer_tests.rs"]
mod tests;
