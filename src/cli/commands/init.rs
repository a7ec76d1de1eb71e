use anyhow::Result;
use std::path::Path;

use crate::state::Config;

/// Write `config` to `path` so it can be edited. An existing file is kept
/// unless `force` is set.
pub fn run(config: &Config, path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config {:?} already exists. Use --force to overwrite it.",
            path
        );
    }

    config.save(path)?;
    println!("Wrote config to {:?}", path);
    println!("Credentials: {:?}", config.credentials);
    if !config.credentials.exists() {
        println!("Note: the credential file does not exist yet.");
    }
    Ok(())
}
