//! Configuration loading and parsing for `chronicler.toml` files.
//!
//! Every section and key is optional. Regexes, globs and templates are only
//! stored here; they are compiled and validated when the pipeline is built.
use log::*;
use serde::Deserialize;
use std::{fs, io::ErrorKind, path::Path};

use crate::error::{ChroniclerError, Result};

pub mod changelog;
pub mod git;
pub mod remote;

pub use changelog::{ChangelogConfig, ReleaseOrder, TextProcessor};
pub use git::{CommitParser, GitConfig, SortCommits};
pub use remote::RemoteConfig;

/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "chronicler.toml";

/// Root configuration structure for `chronicler.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hosting repository details.
    pub remote: RemoteConfig,
    /// Document templates and postprocessing.
    pub changelog: ChangelogConfig,
    /// Commit and tag processing.
    pub git: GitConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| {
            let Some(span) = err.span() else {
                return ChroniclerError::config(DEFAULT_CONFIG_FILE, err.message());
            };

            // the offending line names the key
            let line = content[..span.start].matches('\n').count() + 1;
            let source = content.lines().nth(line - 1).unwrap_or_default().trim();

            ChroniclerError::config(
                format!("{DEFAULT_CONFIG_FILE}:{line}"),
                format!("{} in `{source}`", err.message()),
            )
        })
    }

    /// Load configuration from a file.
    ///
    /// When `required` is false a missing file yields the default
    /// configuration.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => {
                info!("loading configuration from {}", path.display());
                Self::parse(&content).map_err(|err| match err {
                    ChroniclerError::Config { key, message } => {
                        ChroniclerError::config(
                            key.replacen(
                                DEFAULT_CONFIG_FILE,
                                &path.display().to_string(),
                                1,
                            ),
                            message,
                        )
                    }
                    other => other,
                })
            }
            Err(err) if err.kind() == ErrorKind::NotFound && !required => {
                warn!(
                    "no configuration found at {}: using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(err) => Err(ChroniclerError::config(
                path.display().to_string(),
                err.to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_defaults() {
        let config = Config::default();
        assert!(!config.changelog.body.is_empty());
        assert!(config.git.conventional_commits);
        assert!(!config.remote.is_configured());
    }

    #[test]
    fn parses_full_configuration() {
        let content = r##"
[remote]
owner = "acme"
repo = "widgets"

[changelog]
header = "# Changes\n"
body = "{{ version }}"
footer = "<!-- generated -->"
trim = false
postprocessors = [{ pattern = "<REPO>", replace = "https://github.com/acme/widgets" }]
release_order = "oldest"

[git]
conventional_commits = true
filter_unconventional = false
split_commits = true
commit_preprocessors = [{ pattern = '\((\w+\s)?#([0-9]+)\)', replace = "" }]
commit_parsers = [
  { message = "^feat", group = "Features" },
  { message = "^chore\\(release\\)", skip = true },
]
protect_breaking_commits = true
filter_commits = true
tag_pattern = "v[0-9]*"
skip_tags = "beta"
ignore_tags = "rc"
topo_order = true
sort_commits = "newest"
limit_commits = 42
"##;

        let config = Config::parse(content).unwrap();

        assert_eq!(config.remote.owner, "acme");
        assert_eq!(config.remote.url, remote::DEFAULT_REMOTE_URL);
        assert_eq!(config.changelog.header.as_deref(), Some("# Changes\n"));
        assert!(!config.changelog.trim);
        assert_eq!(config.changelog.postprocessors.len(), 1);
        assert_eq!(config.changelog.release_order, ReleaseOrder::Oldest);
        assert!(config.git.split_commits);
        assert!(!config.git.filter_unconventional);
        assert_eq!(config.git.commit_preprocessors[0].replace, "");
        assert_eq!(config.git.commit_parsers.len(), 2);
        assert!(config.git.commit_parsers[1].skip);
        assert_eq!(config.git.tag_pattern.as_deref(), Some("v[0-9]*"));
        assert_eq!(config.git.sort_commits, SortCommits::Newest);
        assert_eq!(config.git.limit_commits, Some(42));
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config = Config::parse("[git]\nsplit_commits = true\n").unwrap();
        assert!(config.git.split_commits);
        assert!(config.git.conventional_commits);
        assert!(config.changelog.trim);
    }

    #[test]
    fn rejects_unknown_sort_value() {
        let result = Config::parse("[git]\nsort_commits = \"sideways\"\n");
        assert!(matches!(result, Err(ChroniclerError::Config { .. })));
    }

    #[test]
    fn parse_errors_show_the_offending_key() {
        let err = Config::parse("[git]\ntopo_order = \"yes\"\n").unwrap_err();

        match err {
            ChroniclerError::Config { key, message } => {
                assert_eq!(key, format!("{DEFAULT_CONFIG_FILE}:2"));
                assert!(message.contains("topo_order = \"yes\""), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_optional_file_uses_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = Config::load(&tmp.path().join("nope.toml"), false).unwrap();
        assert!(config.changelog.trim);
    }

    #[test]
    fn missing_required_file_is_config_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let result = Config::load(&tmp.path().join("nope.toml"), true);
        assert!(matches!(result, Err(ChroniclerError::Config { .. })));
    }

    #[test]
    fn load_reports_file_path_in_key() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.toml");
        fs::write(&path, "[git]\ntopo_order = \"yes\"\n").unwrap();

        let err = Config::load(&path, true).unwrap_err();
        match err {
            ChroniclerError::Config { key, .. } => {
                assert!(key.contains("broken.toml"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
