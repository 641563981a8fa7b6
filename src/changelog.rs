//! Changelog generation from a commit source.
//!
//! [`Changelog`] compiles every configured pattern and template up front,
//! then fetches commits and tags, runs them through the analyzer and
//! grouper, and renders the result.
use log::*;
use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::Path,
};

use crate::{
    analyzer::Analyzer,
    config::{Config, RemoteConfig, remote::DEFAULT_REMOTE_URL},
    error::Result,
    grouper::Grouper,
    release::{Release, Tag},
    renderer::Renderer,
    source::{self, CommitSource, RemoteMetadata},
    tags::TagFilter,
};

/// Which releases to generate.
#[derive(Debug, Clone, Default)]
pub struct ChangelogOptions {
    /// Revision or `from..to` range to walk, HEAD when unset
    pub range: Option<String>,
    /// Only the commits not yet part of a tagged release
    pub unreleased: bool,
    /// Only the newest tagged release
    pub latest: bool,
    /// Tag name given to the unreleased commits
    pub tag: Option<String>,
}

#[derive(Debug)]
pub struct Changelog {
    remote: RemoteConfig,
    analyzer: Analyzer,
    tag_filter: TagFilter,
    grouper: Grouper,
    renderer: Renderer,
}

impl Changelog {
    /// Validate and compile the configuration.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            remote: config.remote.clone(),
            analyzer: Analyzer::new(&config.git, &config.remote)?,
            tag_filter: TagFilter::new(&config.git)?,
            grouper: Grouper::new(&config.git, &config.changelog, &config.remote),
            renderer: Renderer::new(&config.changelog)?,
        })
    }

    pub fn remote(&self) -> &RemoteConfig {
        &self.remote
    }

    /// Fill in the remote owner and repo from a git remote url when they are
    /// not configured.
    pub fn infer_remote(&mut self, origin_url: Option<&str>) {
        if self.remote.is_configured() {
            return;
        }

        let Some(url) = origin_url else {
            debug!("no origin remote to infer repository from");
            return;
        };

        let inferred = match RemoteConfig::from_git_url(url) {
            Ok(Some(inferred)) => inferred,
            Ok(None) => return,
            Err(err) => {
                warn!("unable to infer remote from {url}: {err}");
                return;
            }
        };

        let mut remote = self.remote.clone();
        if remote.owner.is_empty() {
            remote.owner = inferred.owner;
        }
        if remote.repo.is_empty() {
            remote.repo = inferred.repo;
        }
        if remote.url == DEFAULT_REMOTE_URL {
            remote.url = inferred.url;
        }

        info!(
            "using remote {}/{} at {}",
            remote.owner, remote.repo, remote.url
        );

        self.analyzer.set_remote(&remote);
        self.grouper.set_remote(&remote);
        self.remote = remote;
    }

    /// Build the releases to render, in emission order.
    pub fn releases(
        &self,
        source: &dyn CommitSource,
        metadata: &[&dyn RemoteMetadata],
        options: &ChangelogOptions,
    ) -> Result<Vec<Release>> {
        let mut walk = source.commits(options.range.as_deref())?;
        source::attach_remote_metadata(&mut walk, metadata)?;

        let tags = self.tag_filter.index(source.tags()?, &walk);
        let processed = self.analyzer.process(&walk);
        let mut releases = self.grouper.group(&walk, processed, &tags);

        if options.unreleased {
            releases.retain(|release| release.tag.is_none());
        } else if options.latest {
            let latest = releases.iter().rposition(|release| release.tag.is_some());
            releases = match latest {
                Some(index) => vec![releases.swap_remove(index)],
                None => vec![],
            };
        }

        if let Some(name) = &options.tag {
            self.name_unreleased(&mut releases, name);
        }

        Ok(self.grouper.emission_order(releases))
    }

    /// Give the unreleased commits a tag dated now.
    fn name_unreleased(&self, releases: &mut [Release], name: &str) {
        let Some(release) = releases.last_mut().filter(|r| r.tag.is_none()) else {
            warn!("no unreleased commits to tag as {name}");
            return;
        };

        let timestamp = chrono::Utc::now().timestamp();

        release.tag = Some(Tag {
            name: name.to_string(),
            sha: release.commit_id.clone().unwrap_or_default(),
            semver: Tag::parse_semver(name),
            timestamp,
            skipped: false,
        });
        release.timestamp = timestamp;
        release.link = self.remote.release_link(name);
    }

    /// Render the changelog document.
    pub fn generate(&self, releases: &[Release]) -> Result<String> {
        self.renderer.render(releases, &self.remote)
    }

    /// Release data as pretty printed JSON.
    pub fn context(&self, releases: &[Release]) -> Result<String> {
        Ok(serde_json::to_string_pretty(releases)?)
    }

    /// Render the releases and place them before the existing content of
    /// `path`. A copy of the header already at the top of the file is
    /// replaced rather than repeated.
    pub fn prepend(&self, path: &Path, releases: &[Release]) -> Result<()> {
        let content = self.generate(releases)?;

        let existing = match fs::read_to_string(path) {
            Ok(existing) => existing,
            Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
            Err(err) => return Err(err.into()),
        };

        let header = self.renderer.header(releases, &self.remote)?;
        let existing = match header.as_deref() {
            Some(header) if !header.is_empty() => {
                existing.strip_prefix(header).unwrap_or(existing.as_str())
            }
            _ => existing.as_str(),
        };

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        file.write_all(content.as_bytes())?;
        file.write_all(existing.as_bytes())?;

        info!("prepended changelog to {}", path.display());

        Ok(())
    }
}

#[cfg(test)]
#[path = "./changelog_tests.rs"]
mod tests;
