use anyhow::{Context, Result};
use tracing::info;

use super::utils::{create_session_manager, create_token_provider, describe_event};
use crate::drive::TrackRef;
use crate::playback::PlaybackEvent;
use crate::state::Config;

pub async fn run(file_id: &str, name: Option<&str>, config: &Config) -> Result<()> {
    let tokens = create_token_provider(config)?;
    let (mut session, mut events) = create_session_manager(config, tokens);

    let track = TrackRef::new(file_id, name.unwrap_or(file_id));
    let ticket = session.play(track).await;

    println!("Loading {}...", ticket.track().name);
    ticket.outcome().await.context("Playback failed")?;
    println!("Playing. Press Ctrl-C to stop.");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                session.stop().await;
                break;
            }
            event = events.recv() => match event {
                Some(PlaybackEvent::Finished { track }) => {
                    println!("Finished: {}", track.name);
                    break;
                }
                Some(PlaybackEvent::Failed { track, reason }) => {
                    anyhow::bail!("Playback of {} failed: {}", track.name, reason);
                }
                Some(event) => println!("{}", describe_event(&event)),
                None => break,
            },
        }
    }

    Ok(())
}
