//! Runs the changelog command described by the CLI arguments.
use log::*;
use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use crate::{
    changelog::Changelog,
    cli::Args,
    config::Config,
    error::Result,
    repo::Repository,
    source::{JsonMetadata, MessageMetadata, RemoteMetadata},
};

/// Generate the changelog and write it to its destination.
pub fn execute(args: &Args) -> Result<()> {
    let config = Config::load(&args.config, args.config_required())?;
    let mut changelog = Changelog::new(&config)?;

    let repo = Repository::open(&args.repository)?;
    changelog.infer_remote(repo.origin_url().as_deref());

    let json = args
        .remote_metadata
        .as_deref()
        .map(JsonMetadata::load)
        .transpose()?;
    let message = MessageMetadata;

    let mut providers: Vec<&dyn RemoteMetadata> = vec![];
    if let Some(json) = &json {
        providers.push(json);
    }
    providers.push(&message);

    let releases =
        changelog.releases(&repo, &providers, &args.changelog_options())?;

    if args.context {
        let context = changelog.context(&releases)?;
        return write_output(args.output.as_deref(), &context);
    }

    if let Some(path) = &args.prepend {
        return changelog.prepend(path, &releases);
    }

    let content = changelog.generate(&releases)?;
    write_output(args.output.as_deref(), &content)
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, content)?;
            info!("wrote changelog to {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}
