use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cloudtune - stream the audio files in your Google Drive
///
/// Lists audio files visible to a service credential and plays
/// them through mpv, one track at a time.
#[derive(Parser, Debug)]
#[command(name = "cloudtune")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file (TOML); defaults apply when it does not exist
    #[arg(short, long, global = true, default_value = "cloudtune.toml")]
    pub config: PathBuf,

    /// Service credential file, overriding config and CLOUDTUNE_CREDENTIALS
    #[arg(long, global = true)]
    pub credentials: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List audio files in the drive
    List,
    /// Stream a single file until it ends or Ctrl-C is pressed
    Play {
        /// Drive file ID
        file_id: String,
        /// Display name for the track
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Browse the list interactively and pick tracks to play
    Browse,
    /// Acquire an access token and show its scope and expiry
    Token,
    /// Write the effective configuration to the config file
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
}
