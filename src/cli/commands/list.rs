use anyhow::{Context, Result};

use super::utils::{create_lister, create_token_provider, print_tracks};
use crate::state::{Config, Library};

pub async fn run(config: &Config) -> Result<()> {
    let tokens = create_token_provider(config)?;
    let lister = create_lister(config, tokens);

    let mut library = Library::new();
    let ticket = library.begin_refresh();
    let result = lister.list_audio_files().await;
    library
        .complete(ticket.generation, result)
        .context("Failed to list audio files")?;

    print_tracks(library.tracks());
    Ok(())
}
