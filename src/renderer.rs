//! Renders releases into the changelog document with Tera.
//!
//! Templates are compiled once in [`Renderer::new`]. The body is rendered
//! once per release with the release fields at the top level, the header and
//! footer once with `releases` and `remote`.
use log::*;
use serde_json::Value;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::{
    config::{ChangelogConfig, RemoteConfig},
    error::{ChroniclerError, Result, error_chain},
    processor::{self, Substitution},
    release::Release,
};

const HEADER: &str = "header";
const BODY: &str = "body";
const FOOTER: &str = "footer";

const DELIMITERS: [(&str, &str); 3] = [("{%", "%}"), ("{{", "}}"), ("{#", "#}")];

/// Compiled changelog templates and postprocessors.
pub struct Renderer {
    tera: Tera,
    has_header: bool,
    has_footer: bool,
    postprocessors: Vec<Substitution>,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("has_header", &self.has_header)
            .field("has_footer", &self.has_footer)
            .field("postprocessors", &self.postprocessors.len())
            .finish()
    }
}

impl Renderer {
    pub fn new(config: &ChangelogConfig) -> Result<Self> {
        let mut tera = Tera::default();
        tera.register_filter("upper_first", upper_first);

        let parts = [
            (HEADER, config.header.as_deref()),
            (BODY, Some(config.body.as_str())),
            (FOOTER, config.footer.as_deref()),
        ];

        for (name, template) in parts {
            let Some(template) = template else {
                continue;
            };

            let source = if config.trim {
                trim_template(template)
            } else {
                template.to_string()
            };

            tera.add_raw_template(name, &source).map_err(|err| {
                ChroniclerError::config(
                    format!("changelog.{name}"),
                    error_chain(&err),
                )
            })?;
        }

        let postprocessors = Substitution::compile_all(
            "changelog.postprocessors",
            &config.postprocessors,
        )?;

        Ok(Self {
            tera,
            has_header: config.header.is_some(),
            has_footer: config.footer.is_some(),
            postprocessors,
        })
    }

    /// Render the whole document. Releases are emitted in the given order.
    pub fn render(
        &self,
        releases: &[Release],
        remote: &RemoteConfig,
    ) -> Result<String> {
        let mut document = String::new();
        let context = document_context(releases, remote);

        if self.has_header {
            document.push_str(&self.render_part(HEADER, &context)?);
        }

        for release in releases {
            let mut context = Context::from_serialize(release)
                .map_err(|err| ChroniclerError::render(BODY, error_chain(&err)))?;
            context.insert("remote", remote);

            debug!(
                "rendering release {}",
                release.version().unwrap_or("unreleased")
            );
            document.push_str(&self.render_part(BODY, &context)?);
        }

        if self.has_footer {
            document.push_str(&self.render_part(FOOTER, &context)?);
        }

        Ok(processor::apply_all(&self.postprocessors, &document))
    }

    /// Render only the header, postprocessed as it appears in a full
    /// document.
    pub fn header(
        &self,
        releases: &[Release],
        remote: &RemoteConfig,
    ) -> Result<Option<String>> {
        if !self.has_header {
            return Ok(None);
        }

        let header =
            self.render_part(HEADER, &document_context(releases, remote))?;

        Ok(Some(processor::apply_all(&self.postprocessors, &header)))
    }

    fn render_part(&self, name: &str, context: &Context) -> Result<String> {
        self.tera
            .render(name, context)
            .map_err(|err| ChroniclerError::render(name, error_chain(&err)))
    }
}

fn document_context(releases: &[Release], remote: &RemoteConfig) -> Context {
    let mut context = Context::new();
    context.insert("releases", releases);
    context.insert("remote", remote);
    context
}

/// Uppercase the first character of a string.
fn upper_first(
    value: &Value,
    _: &HashMap<String, Value>,
) -> tera::Result<Value> {
    let text = tera::try_get_value!("upper_first", "value", String, value);

    let mut chars = text.chars();
    let result = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    };

    Ok(Value::String(result))
}

/// Strip every line of surrounding whitespace, then resolve trim markers.
fn trim_template(source: &str) -> String {
    let mut trimmed = source.lines().map(str::trim).collect::<Vec<_>>().join("\n");

    if source.ends_with('\n') {
        trimmed.push('\n');
    }

    resolve_trim_markers(&trimmed)
}

/// Removes `-` trim markers from tag delimiters along with the whitespace on
/// the marked side. The whitespace removed may span one line break plus the
/// spaces and tabs on either side of it. String literals inside tags and the
/// content of `{% raw %}` blocks are left as written.
pub fn resolve_trim_markers(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];

        let Some(&(open, close)) =
            DELIMITERS.iter().find(|(open, _)| rest.starts_with(open))
        else {
            out.push('{');
            rest = &rest[1..];
            continue;
        };

        // unterminated tags are left for Tera to report
        let Some(length) = tag_length(rest, open, close) else {
            break;
        };

        let inner = &rest[open.len()..length - close.len()];
        rest = &rest[length..];

        let (inner, trim_before) = match inner.strip_prefix('-') {
            Some(inner) => (inner, true),
            None => (inner, false),
        };
        let (inner, trim_after) = match inner.strip_suffix('-') {
            Some(inner) => (inner, true),
            None => (inner, false),
        };

        if trim_before {
            trim_end_whitespace(&mut out);
        }
        out.push_str(open);
        out.push_str(inner);
        out.push_str(close);
        if trim_after {
            rest = trim_start_whitespace(rest);
        }

        if open == "{%" && inner.trim() == "raw" {
            let end = endraw_start(rest).unwrap_or(rest.len());
            out.push_str(&rest[..end]);
            rest = &rest[end..];
        }
    }

    out.push_str(rest);
    out
}

/// Byte length of the tag at the start of `source`, skipping over string
/// literals in statements and expressions.
fn tag_length(source: &str, open: &str, close: &str) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut index = open.len();
    let mut quote = None;

    while index < bytes.len() {
        let byte = bytes[index];
        match quote {
            Some(q) if byte == q => quote = None,
            Some(_) => {}
            None if open != "{#" && matches!(byte, b'"' | b'\'' | b'`') => {
                quote = Some(byte)
            }
            None if bytes[index..].starts_with(close.as_bytes()) => {
                return Some(index + close.len());
            }
            None => {}
        }
        index += 1;
    }

    None
}

/// Offset of the `{% endraw %}` tag closing a raw block.
fn endraw_start(source: &str) -> Option<usize> {
    source.match_indices("{%").map(|(index, _)| index).find(|&index| {
        let inner = &source[index + 2..];
        inner
            .strip_prefix('-')
            .unwrap_or(inner)
            .trim_start()
            .starts_with("endraw")
    })
}

fn trim_end_whitespace(out: &mut String) {
    let kept = out.trim_end_matches([' ', '\t']).len();
    out.truncate(kept);

    if out.ends_with('\n') {
        out.pop();
        if out.ends_with('\r') {
            out.pop();
        }
        let kept = out.trim_end_matches([' ', '\t']).len();
        out.truncate(kept);
    }
}

fn trim_start_whitespace(text: &str) -> &str {
    let text = text.trim_start_matches([' ', '\t']);
    match text.strip_prefix("\r\n").or_else(|| text.strip_prefix('\n')) {
        Some(next) => next.trim_start_matches([' ', '\t']),
        None => text,
    }
}
