use serde::Deserialize;

/// Default changelog header.
pub const DEFAULT_HEADER: &str = r#"# Changelog

All notable changes to this project will be documented in this file.

"#;

/// Default changelog body template, rendered once per release.
pub const DEFAULT_BODY: &str = r#"{% if version -%}
## [{{ version | trim_start_matches(pat="v") }}]{% if link %}({{ link }}){% endif %} - {{ timestamp | date(format="%Y-%m-%d") }}
{% else -%}
## [unreleased]
{% endif %}
{% for group, commits in commits | filter(attribute="merge_commit", value=false) | group_by(attribute="group") -%}
### {{ group | striptags | trim | upper_first }}
{% for commit in commits -%}
- {% if commit.scope %}_({{ commit.scope }})_ {% endif %}{% if commit.breaking %}[**breaking**] {% endif %}{{ commit.message | upper_first }}{% if commit.link %} [_({{ commit.short_id }})_]({{ commit.link }}){% endif %}
{% endfor %}
{% endfor -%}
{% for contributor in contributors | filter(attribute="is_first_time", value=true) -%}
{% if loop.first %}### New Contributors
{% endif -%}
- {{ contributor.username }} made their first contribution{% if contributor.pr_number %} in #{{ contributor.pr_number }}{% endif %}
{% if loop.last %}
{% endif -%}
{% endfor -%}
"#;

/// Order in which releases are emitted in the document.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseOrder {
    /// Most recent release first
    #[default]
    Newest,
    /// Oldest release first
    Oldest,
}

/// A regex substitution applied to commit messages or to the rendered
/// document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TextProcessor {
    /// Regular expression to search for
    pub pattern: String,
    /// Replacement text, may reference capture groups (`$1`, `${name}`)
    pub replace: String,
}

/// Changelog document configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChangelogConfig {
    /// Template rendered once before all releases
    pub header: Option<String>,
    /// Template rendered once per release
    pub body: String,
    /// Template rendered once after all releases
    pub footer: Option<String>,
    /// Strip template indentation and resolve trim markers
    pub trim: bool,
    /// Substitutions applied to the assembled document
    pub postprocessors: Vec<TextProcessor>,
    /// Release emission order
    pub release_order: ReleaseOrder,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            header: Some(DEFAULT_HEADER.into()),
            body: DEFAULT_BODY.into(),
            footer: None,
            trim: true,
            postprocessors: vec![],
            release_order: ReleaseOrder::default(),
        }
    }
}
