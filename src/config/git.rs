use serde::Deserialize;

use crate::config::changelog::TextProcessor;

/// Order of commits within a single release.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortCommits {
    /// Reverse chronological
    Newest,
    /// Chronological
    #[default]
    Oldest,
}

/// A grouping rule matched against processed commits. All configured
/// conditions must match for the rule to apply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommitParser {
    /// Regex matched against the full commit message
    pub message: Option<String>,
    /// Regex matched against the commit body
    pub body: Option<String>,
    /// Regex matched against each `token: value` footer
    pub footer: Option<String>,
    /// Only match commits whose breaking flag equals this value
    pub breaking: Option<bool>,
    /// Group assigned to matching commits
    pub group: Option<String>,
    /// Scope that overrides the parsed scope
    pub scope: Option<String>,
    /// Scope used when the commit has none
    pub default_scope: Option<String>,
    /// Drop matching commits from the changelog
    pub skip: bool,
}

/// Commit parsing, filtering and tag settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Parse commit messages as conventional commits
    pub conventional_commits: bool,
    /// Drop commits that are not conventional
    pub filter_unconventional: bool,
    /// Treat each line of a commit message as its own commit
    pub split_commits: bool,
    /// Substitutions applied to commit messages before parsing
    pub commit_preprocessors: Vec<TextProcessor>,
    /// Ordered grouping rules. The built-in table is used when empty
    pub commit_parsers: Vec<CommitParser>,
    /// Never drop breaking commits
    pub protect_breaking_commits: bool,
    /// Drop commits not matched by any grouping rule
    pub filter_commits: bool,
    /// Glob selecting tags that form release boundaries
    pub tag_pattern: Option<String>,
    /// Regex for tags whose releases are left out of the changelog
    pub skip_tags: Option<String>,
    /// Regex for tags that are disregarded entirely
    pub ignore_tags: Option<String>,
    /// Order tags by commit topology instead of creation time
    pub topo_order: bool,
    /// Order of commits within a release
    pub sort_commits: SortCommits,
    /// Maximum number of commits in the changelog
    pub limit_commits: Option<usize>,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            conventional_commits: true,
            filter_unconventional: true,
            split_commits: false,
            commit_preprocessors: vec![],
            commit_parsers: vec![],
            protect_breaking_commits: false,
            filter_commits: false,
            tag_pattern: None,
            skip_tags: None,
            ignore_tags: None,
            topo_order: false,
            sort_commits: SortCommits::default(),
            limit_commits: None,
        }
    }
}
