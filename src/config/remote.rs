use git_url_parse::GitUrl;
use log::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default base url used to build commit and release links.
pub const DEFAULT_REMOTE_URL: &str = "https://github.com";

/// Hosting repository used for link construction in templates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Repository owner or organisation
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Scheme and host of the forge
    pub url: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            owner: "".into(),
            repo: "".into(),
            url: DEFAULT_REMOTE_URL.into(),
        }
    }
}

impl RemoteConfig {
    /// Whether enough is known to build links.
    pub fn is_configured(&self) -> bool {
        !self.owner.is_empty() && !self.repo.is_empty()
    }

    /// Builds a remote from a git remote url such as
    /// `git@github.com:owner/repo.git` or `https://gitlab.com/owner/repo`.
    pub fn from_git_url(git_url: &str) -> Result<Option<Self>> {
        let parsed = GitUrl::parse(git_url)?;

        let (Some(host), Some(owner)) = (parsed.host, parsed.owner) else {
            debug!("remote url has no host or owner: {git_url}");
            return Ok(None);
        };

        // ssh remotes still link to the web ui over https
        let scheme = match parsed.scheme {
            git_url_parse::Scheme::Http => "http",
            _ => "https",
        };

        Ok(Some(Self {
            owner,
            repo: parsed.name,
            url: format!("{scheme}://{host}"),
        }))
    }

    /// Link to a commit on the forge.
    pub fn commit_link(&self, id: &str) -> Option<String> {
        self.is_configured().then(|| {
            format!("{}/{}/{}/commit/{}", self.url, self.owner, self.repo, id)
        })
    }

    /// Link to a tagged release on the forge.
    pub fn release_link(&self, tag: &str) -> Option<String> {
        self.is_configured().then(|| {
            format!(
                "{}/{}/{}/releases/tag/{}",
                self.url, self.owner, self.repo, tag
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_links_when_configured() {
        let remote = RemoteConfig {
            owner: "acme".into(),
            repo: "widgets".into(),
            ..RemoteConfig::default()
        };

        assert_eq!(
            remote.commit_link("abc123"),
            Some("https://github.com/acme/widgets/commit/abc123".to_string())
        );
        assert_eq!(
            remote.release_link("v1.0.0"),
            Some(
                "https://github.com/acme/widgets/releases/tag/v1.0.0"
                    .to_string()
            )
        );
    }

    #[test]
    fn no_links_without_owner_and_repo() {
        let remote = RemoteConfig::default();
        assert!(!remote.is_configured());
        assert!(remote.commit_link("abc123").is_none());
        assert!(remote.release_link("v1.0.0").is_none());
    }

    #[test]
    fn parses_https_remote_url() {
        let remote = RemoteConfig::from_git_url(
            "https://gitlab.example.com/acme/widgets.git",
        )
        .unwrap()
        .unwrap();

        assert_eq!(remote.owner, "acme");
        assert_eq!(remote.repo, "widgets");
        assert_eq!(remote.url, "https://gitlab.example.com");
    }

    #[test]
    fn parses_ssh_remote_url() {
        let remote =
            RemoteConfig::from_git_url("git@github.com:acme/widgets.git")
                .unwrap()
                .unwrap();

        assert_eq!(remote.owner, "acme");
        assert_eq!(remote.repo, "widgets");
        assert_eq!(remote.url, "https://github.com");
    }
}
