//! Compiled regex substitutions shared by commit preprocessing and document
//! postprocessing.
use regex::Regex;

use crate::{
    config::TextProcessor,
    error::{ChroniclerError, Result},
};

/// A validated [`TextProcessor`].
#[derive(Debug, Clone)]
pub struct Substitution {
    regex: Regex,
    replace: String,
}

impl Substitution {
    /// Compile every processor, naming the first invalid one as
    /// `{key}[index].pattern`.
    pub fn compile_all(
        key: &str,
        processors: &[TextProcessor],
    ) -> Result<Vec<Self>> {
        processors
            .iter()
            .enumerate()
            .map(|(index, processor)| {
                let regex = Regex::new(&processor.pattern).map_err(|err| {
                    ChroniclerError::config(
                        format!("{key}[{index}].pattern"),
                        err.to_string(),
                    )
                })?;

                Ok(Self {
                    regex,
                    replace: processor.replace.clone(),
                })
            })
            .collect()
    }

    /// Replace every match in `text`.
    pub fn apply(&self, text: &str) -> String {
        self.regex
            .replace_all(text, self.replace.as_str())
            .into_owned()
    }
}

/// Apply substitutions in order, each seeing the output of the previous.
pub fn apply_all(substitutions: &[Substitution], text: &str) -> String {
    substitutions
        .iter()
        .fold(text.to_string(), |acc, sub| sub.apply(&acc))
}
