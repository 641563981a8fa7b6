//! CLI argument parsing.
use clap::Parser;
use std::path::PathBuf;

use crate::{changelog::ChangelogOptions, config::DEFAULT_CONFIG_FILE};

/// Generate a changelog from git history.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Revision or range of commits to include, e.g. `v1.0.0..HEAD`.
    pub range: Option<String>,

    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    /// Path to the configuration file.
    pub config: PathBuf,

    #[arg(short = 'r', long, default_value = ".")]
    /// Path to the git repository.
    pub repository: PathBuf,

    #[arg(short, long, conflicts_with = "prepend")]
    /// Write the changelog to a file instead of stdout.
    pub output: Option<PathBuf>,

    #[arg(short, long)]
    /// Prepend the changelog to an existing file.
    pub prepend: Option<PathBuf>,

    #[arg(short, long, conflicts_with = "latest")]
    /// Only include commits that are not part of a release yet.
    pub unreleased: bool,

    #[arg(short, long)]
    /// Only include the most recent tagged release.
    pub latest: bool,

    #[arg(short, long)]
    /// Tag name for the unreleased commits.
    pub tag: Option<String>,

    #[arg(long)]
    /// JSON file with pull request metadata keyed by commit id.
    pub remote_metadata: Option<PathBuf>,

    #[arg(short = 'x', long)]
    /// Print the template context as JSON instead of rendering.
    pub context: bool,

    #[arg(long, default_value_t = false)]
    /// Enable debug logging.
    pub debug: bool,
}

impl Args {
    /// Whether the configuration file was given explicitly.
    pub fn config_required(&self) -> bool {
        self.config != PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    pub fn changelog_options(&self) -> ChangelogOptions {
        ChangelogOptions {
            range: self.range.clone(),
            unreleased: self.unreleased,
            latest: self.latest,
            tag: self.tag.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_defaults() {
        let args = Args::try_parse_from(["chronicler"]).unwrap();

        assert!(args.range.is_none());
        assert_eq!(args.config, PathBuf::from(DEFAULT_CONFIG_FILE));
        assert_eq!(args.repository, PathBuf::from("."));
        assert!(!args.config_required());
        assert!(!args.debug);
    }

    #[test]
    fn parses_options() {
        let args = Args::try_parse_from([
            "chronicler",
            "v1.0.0..HEAD",
            "--config",
            "custom.toml",
            "--prepend",
            "CHANGELOG.md",
            "--unreleased",
            "--tag",
            "v1.1.0",
            "--remote-metadata",
            "prs.json",
            "--debug",
        ])
        .unwrap();

        assert!(args.config_required());
        assert_eq!(args.prepend, Some(PathBuf::from("CHANGELOG.md")));
        assert_eq!(args.remote_metadata, Some(PathBuf::from("prs.json")));

        let options = args.changelog_options();
        assert_eq!(options.range.as_deref(), Some("v1.0.0..HEAD"));
        assert!(options.unreleased);
        assert!(!options.latest);
        assert_eq!(options.tag.as_deref(), Some("v1.1.0"));
    }

    #[test]
    fn rejects_conflicting_flags() {
        assert!(
            Args::try_parse_from(["chronicler", "--unreleased", "--latest"])
                .is_err()
        );
        assert!(
            Args::try_parse_from([
                "chronicler",
                "--output",
                "a.md",
                "--prepend",
                "b.md"
            ])
            .is_err()
        );
    }
}
