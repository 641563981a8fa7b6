pub mod analyzer;
pub mod changelog;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod grouper;
pub mod processor;
pub mod release;
pub mod renderer;
pub mod repo;
pub mod source;
pub mod tags;

pub use changelog::{Changelog, ChangelogOptions};
pub use cli::Args;
pub use error::{ChroniclerError, Result};

#[cfg(test)]
pub mod test_helpers;
