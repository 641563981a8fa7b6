use git_conventional::Commit as ConventionalCommit;
use log::*;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::sync::LazyLock;

use crate::source::{RawCommit, RemoteInfo};

/// Matches a `BREAKING CHANGE:` footer line in messages that are not
/// conventional commits
static BREAKING_FOOTER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"^breaking[- ]change:\s*(?<description>.*)$")
        .case_insensitive(true)
        .multi_line(true)
        .build()
        .unwrap()
});

/// Length of the abbreviated commit id
const SHORT_ID_LEN: usize = 7;

/// A `token: value` trailer of a conventional commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Footer {
    pub token: String,
    pub value: String,
}

/// Processed commit with conventional commit information and metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Commit {
    pub id: String,
    pub short_id: String,
    #[serde(rename = "type")]
    pub commit_type: Option<String>,
    pub group: Option<String>,
    pub scope: Option<String>,
    pub message: String,
    pub body: Option<String>,
    pub footers: Vec<Footer>,
    pub breaking: bool,
    pub breaking_description: Option<String>,
    pub conventional: bool,
    pub merge_commit: bool,
    pub timestamp: i64,
    pub author_name: String,
    pub author_email: String,
    pub raw_message: String,
    pub link: Option<String>,
    pub remote: Option<RemoteInfo>,
}

impl Commit {
    /// Build an unparsed commit from a raw commit and its (preprocessed)
    /// message. The first line becomes the message, the rest the body.
    pub fn new(raw: &RawCommit, message: &str) -> Self {
        let message = message.trim();

        let (title, body) = match message.split_once('\n') {
            Some((title, body)) => {
                let body = body.trim();
                (title.trim(), (!body.is_empty()).then(|| body.to_string()))
            }
            None => (message, None),
        };

        let breaking_description = BREAKING_FOOTER_REGEX
            .captures(message)
            .map(|caps| caps["description"].trim().to_string());

        Self {
            id: raw.id.clone(),
            short_id: raw.id.chars().take(SHORT_ID_LEN).collect(),
            commit_type: None,
            group: None,
            scope: None,
            message: title.to_string(),
            body,
            footers: vec![],
            breaking: breaking_description.is_some(),
            breaking_description: breaking_description
                .filter(|d| !d.is_empty()),
            conventional: false,
            merge_commit: raw.merge_commit,
            timestamp: raw.timestamp,
            author_name: raw.author_name.clone(),
            author_email: raw.author_email.clone(),
            raw_message: message.to_string(),
            link: None,
            remote: raw.remote.clone(),
        }
    }

    /// Parse the raw message with the conventional commit grammar. A message
    /// that does not follow the grammar is returned unchanged with
    /// `conventional` left false.
    pub fn parse_conventional(mut self) -> Self {
        match ConventionalCommit::parse(&self.raw_message) {
            Ok(cc) => {
                self.commit_type = Some(cc.type_().to_string());
                self.scope = cc.scope().map(|s| s.to_string());
                self.message = cc.description().to_string();
                self.body = cc.body().map(|b| b.to_string());
                self.footers = cc
                    .footers()
                    .iter()
                    .map(|f| Footer {
                        token: f.token().to_string(),
                        value: f.value().to_string(),
                    })
                    .collect();
                self.breaking = cc.breaking();
                self.breaking_description =
                    cc.breaking_description().map(|d| d.to_string());
                self.conventional = true;
            }
            Err(err) => {
                debug!("commit {} is not conventional: {err}", self.short_id);
            }
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_raw_commit(id: &str, message: &str) -> RawCommit {
        RawCommit {
            id: id.to_string(),
            message: message.to_string(),
            author_name: "John Doe".to_string(),
            author_email: "john@example.com".to_string(),
            timestamp: 1640995200,
            merge_commit: false,
            parents: vec![],
            remote: None,
        }
    }

    fn parse(message: &str) -> Commit {
        let raw = create_raw_commit("abc1234567", message);
        Commit::new(&raw, &raw.message).parse_conventional()
    }

    #[test]
    fn test_parse_conventional_feat_commit() {
        let commit = parse("feat: add new user authentication");

        assert_eq!(commit.id, "abc1234567");
        assert_eq!(commit.short_id, "abc1234");
        assert_eq!(commit.commit_type.as_deref(), Some("feat"));
        assert_eq!(commit.scope, None);
        assert_eq!(commit.message, "add new user authentication");
        assert_eq!(commit.body, None);
        assert!(commit.conventional);
        assert!(!commit.breaking);
        assert_eq!(commit.breaking_description, None);
        assert_eq!(commit.timestamp, 1640995200);
        assert_eq!(commit.author_name, "John Doe");
        assert_eq!(commit.author_email, "john@example.com");
        assert_eq!(commit.raw_message, "feat: add new user authentication");
    }

    #[test]
    fn test_parse_conventional_commit_with_scope() {
        let commit = parse("feat(auth): add OAuth2 support");

        assert_eq!(commit.commit_type.as_deref(), Some("feat"));
        assert_eq!(commit.scope.as_deref(), Some("auth"));
        assert_eq!(commit.message, "add OAuth2 support");
    }

    #[test]
    fn test_parse_breaking_change_commit() {
        let commit = parse(
            "feat!: redesign user API\n\nBREAKING CHANGE: The user API has been completely redesigned",
        );

        assert_eq!(commit.message, "redesign user API");
        assert!(commit.breaking);
        assert_eq!(
            commit.breaking_description.as_deref(),
            Some("The user API has been completely redesigned")
        );
        assert_eq!(commit.footers.len(), 1);
        assert_eq!(commit.footers[0].token, "BREAKING CHANGE");
    }

    #[test]
    fn test_parse_commit_with_body() {
        let commit = parse(
            "feat: add user registration\n\nThis feature allows new users to register\nwith email verification.",
        );

        assert_eq!(commit.message, "add user registration");
        assert_eq!(
            commit.body.as_deref(),
            Some(
                "This feature allows new users to register\nwith email verification."
            )
        );
    }

    #[test]
    fn test_parse_non_conventional_commit() {
        let commit = parse("Update user authentication logic");

        assert!(!commit.conventional);
        assert_eq!(commit.commit_type, None);
        assert_eq!(commit.scope, None);
        assert_eq!(commit.message, "Update user authentication logic");
        assert_eq!(commit.body, None);
        assert!(!commit.breaking);
    }

    #[test]
    fn test_parse_non_conventional_commit_with_body() {
        let commit = parse(
            "Update database schema\n\nAdded new indexes for better performance",
        );

        assert!(!commit.conventional);
        assert_eq!(commit.message, "Update database schema");
        assert_eq!(
            commit.body.as_deref(),
            Some("Added new indexes for better performance")
        );
    }

    #[test]
    fn test_non_conventional_breaking_footer_is_detected() {
        let commit =
            parse("Rewrite storage layer\n\nBREAKING-CHANGE: files moved");

        assert!(!commit.conventional);
        assert!(commit.breaking);
        assert_eq!(commit.breaking_description.as_deref(), Some("files moved"));
    }

    #[test]
    fn test_parse_empty_message() {
        let commit = parse("");

        assert!(!commit.conventional);
        assert_eq!(commit.message, "");
        assert_eq!(commit.body, None);
        assert!(!commit.breaking);
    }

    #[test]
    fn test_merge_commit_and_remote_are_carried_over() {
        let raw = RawCommit {
            merge_commit: true,
            remote: Some(RemoteInfo {
                pr_number: Some(123),
                ..RemoteInfo::default()
            }),
            ..create_raw_commit("vwx234", "Merge pull request #123 from a/b")
        };

        let commit = Commit::new(&raw, &raw.message).parse_conventional();

        assert!(commit.merge_commit);
        assert_eq!(commit.remote.unwrap().pr_number, Some(123));
    }

    #[test]
    fn test_unparsed_commit_keeps_message_as_is() {
        let raw = create_raw_commit("abc", "feat: not parsed\n\nbody");
        let commit = Commit::new(&raw, &raw.message);

        assert!(!commit.conventional);
        assert_eq!(commit.message, "feat: not parsed");
        assert_eq!(commit.body.as_deref(), Some("body"));
    }
}
