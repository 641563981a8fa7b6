use regex::Regex;

use crate::{
    analyzer::commit::Commit,
    config::CommitParser,
    error::{ChroniclerError, Result},
};

/// Built-in commit categories, used when no `commit_parsers` are configured.
/// The html comment prefix keeps groups in this order when sorted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Group {
    Breaking,
    Feat,
    Fix,
    Revert,
    Refactor,
    Perf,
    Doc,
    Style,
    Test,
    Chore,
    Ci,
    #[default]
    Miscellaneous,
}

impl Group {
    /// Label rendered in the changelog.
    pub fn label(&self) -> &'static str {
        match self {
            Group::Breaking => "<!-- 00 -->❌ Breaking",
            Group::Feat => "<!-- 01 -->🚀 Features",
            Group::Fix => "<!-- 02 -->🐛 Bug Fixes",
            Group::Revert => "<!-- 03 -->◀️ Revert",
            Group::Refactor => "<!-- 04 -->🚜 Refactor",
            Group::Perf => "<!-- 05 -->⚡ Performance",
            Group::Doc => "<!-- 06 -->📚 Documentation",
            Group::Style => "<!-- 07 -->🎨 Styling",
            Group::Test => "<!-- 08 -->🧪 Testing",
            Group::Chore => "<!-- 09 -->🧹 Chore",
            Group::Ci => "<!-- 10 -->⏩ CI/CD",
            Group::Miscellaneous => "<!-- 11 -->⚙️ Miscellaneous Tasks",
        }
    }

    /// Commit message prefix selecting this group.
    fn message_pattern(&self) -> Option<&'static str> {
        match self {
            Group::Feat => Some(r"^feat"),
            Group::Fix => Some(r"^fix"),
            Group::Revert => Some(r"^revert"),
            Group::Refactor => Some(r"^refactor"),
            Group::Perf => Some(r"^perf"),
            Group::Doc => Some(r"^doc"),
            Group::Style => Some(r"^style"),
            Group::Test => Some(r"^test"),
            Group::Chore => Some(r"^chore"),
            Group::Ci => Some(r"^ci"),
            Group::Breaking | Group::Miscellaneous => None,
        }
    }

    /// The rule table used when none is configured: breaking changes first,
    /// then each conventional type prefix.
    fn default_parsers() -> Vec<CommitParser> {
        let mut parsers = vec![CommitParser {
            breaking: Some(true),
            group: Some(Group::Breaking.label().to_string()),
            ..CommitParser::default()
        }];

        let typed = [
            Group::Feat,
            Group::Fix,
            Group::Revert,
            Group::Refactor,
            Group::Perf,
            Group::Doc,
            Group::Style,
            Group::Test,
            Group::Chore,
            Group::Ci,
        ];

        parsers.extend(typed.iter().map(|group| CommitParser {
            message: group.message_pattern().map(str::to_string),
            group: Some(group.label().to_string()),
            ..CommitParser::default()
        }));

        parsers
    }
}

/// A compiled [`CommitParser`].
#[derive(Debug)]
pub struct GroupRule {
    message: Option<Regex>,
    body: Option<Regex>,
    footer: Option<Regex>,
    breaking: Option<bool>,
    pub group: Option<String>,
    pub scope: Option<String>,
    pub default_scope: Option<String>,
    pub skip: bool,
}

impl GroupRule {
    fn compile(index: usize, parser: &CommitParser) -> Result<Self> {
        let compile = |field: &str, pattern: &Option<String>| {
            pattern
                .as_deref()
                .map(Regex::new)
                .transpose()
                .map_err(|err| {
                    ChroniclerError::config(
                        format!("git.commit_parsers[{index}].{field}"),
                        err.to_string(),
                    )
                })
        };

        Ok(Self {
            message: compile("message", &parser.message)?,
            body: compile("body", &parser.body)?,
            footer: compile("footer", &parser.footer)?,
            breaking: parser.breaking,
            group: parser.group.clone(),
            scope: parser.scope.clone(),
            default_scope: parser.default_scope.clone(),
            skip: parser.skip,
        })
    }

    fn matches(&self, commit: &Commit) -> bool {
        if let Some(breaking) = self.breaking
            && breaking != commit.breaking
        {
            return false;
        }

        if let Some(re) = &self.message
            && !re.is_match(commit.raw_message.trim())
        {
            return false;
        }

        if let Some(re) = &self.body
            && !commit.body.as_deref().is_some_and(|b| re.is_match(b))
        {
            return false;
        }

        if let Some(re) = &self.footer
            && !commit
                .footers
                .iter()
                .any(|f| re.is_match(&format!("{}: {}", f.token, f.value)))
        {
            return false;
        }

        true
    }
}

/// Determines which changelog category a commit belongs to by evaluating
/// rules in order. The first matching rule wins.
#[derive(Debug)]
pub struct GroupParser {
    rules: Vec<GroupRule>,
    /// Group for commits no rule matched, only set for the built-in table
    fallback: Option<String>,
}

impl GroupParser {
    /// Compile configured rules, or the built-in table when none are given.
    pub fn new(parsers: &[CommitParser]) -> Result<Self> {
        if parsers.is_empty() {
            let rules = Group::default_parsers()
                .iter()
                .enumerate()
                .map(|(i, p)| GroupRule::compile(i, p))
                .collect::<Result<Vec<_>>>()?;

            return Ok(Self {
                rules,
                fallback: Some(Group::default().label().to_string()),
            });
        }

        let rules = parsers
            .iter()
            .enumerate()
            .map(|(i, p)| GroupRule::compile(i, p))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            rules,
            fallback: None,
        })
    }

    /// The first rule matching the commit.
    pub fn find(&self, commit: &Commit) -> Option<&GroupRule> {
        self.rules.iter().find(|rule| rule.matches(commit))
    }

    /// Group assigned to commits that match no rule.
    pub fn fallback(&self) -> Option<&str> {
        self.fallback.as_deref()
    }
}
