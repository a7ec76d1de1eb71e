use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::warn;

use super::utils::{
    create_lister, create_session_manager, create_token_provider, describe_event, print_tracks,
};
use crate::state::{spawn_refresh, Config, Library, RefreshOutcome, RefreshResult};

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Play(usize),
    Refresh,
    List,
    Stop,
    Help,
    Quit,
    Unknown(String),
}

fn parse_input(line: &str) -> Option<Input> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let input = match line {
        "r" | "refresh" => Input::Refresh,
        "l" | "list" => Input::List,
        "s" | "stop" => Input::Stop,
        "h" | "help" | "?" => Input::Help,
        "q" | "quit" | "exit" => Input::Quit,
        other => match other.parse::<usize>() {
            Ok(n) if n > 0 => Input::Play(n),
            _ => Input::Unknown(other.to_string()),
        },
    };
    Some(input)
}

fn print_help() {
    println!("Commands: <n> play track n, r refresh, l list, s stop, h help, q quit");
}

/// Interactive loop. Listing and playback run on worker tasks and report
/// back here; only this loop touches the library.
pub async fn run(config: &Config) -> Result<()> {
    let tokens = create_token_provider(config)?;
    let lister = create_lister(config, tokens.clone());
    let (mut session, mut events) = create_session_manager(config, tokens);

    let mut library = Library::new();
    let (refresh_tx, mut refresh_rx) = mpsc::channel::<RefreshResult>(4);

    spawn_refresh(lister.clone(), library.begin_refresh(), refresh_tx.clone());
    println!("Loading audio files...");
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let Some(input) = parse_input(&line) else { continue };

                match input {
                    Input::Quit => break,
                    Input::Help => print_help(),
                    Input::List => print_tracks(library.tracks()),
                    Input::Refresh => {
                        if library.is_refreshing() {
                            println!("Restarting the refresh in progress...");
                        } else {
                            println!("Refreshing...");
                        }
                        spawn_refresh(lister.clone(), library.begin_refresh(), refresh_tx.clone());
                    }
                    Input::Stop => {
                        if let Some(track) = session.current_track() {
                            println!("Stopping {}", track.name);
                        } else {
                            println!("Nothing is playing ({})", session.current_state());
                        }
                        session.stop().await;
                    }
                    Input::Play(n) => match library.get(n - 1).cloned() {
                        // The outcome also arrives on the event stream.
                        Some(track) => drop(session.play(track).await),
                        None => println!("No track #{} (have {})", n, library.tracks().len()),
                    },
                    Input::Unknown(other) => println!("Unknown command: {}", other),
                }
            }
            Some((generation, result)) = refresh_rx.recv() => {
                match library.complete(generation, result) {
                    Ok(RefreshOutcome::Replaced(_)) => print_tracks(library.tracks()),
                    Ok(RefreshOutcome::Superseded) => {}
                    Err(e) => {
                        warn!("List refresh failed: {}", e);
                        println!("Could not refresh the list ({}). Keeping the previous list.", e);
                    }
                }
            }
            Some(event) = events.recv() => println!("{}", describe_event(&event)),
        }
    }

    session.stop().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("3"), Some(Input::Play(3)));
        assert_eq!(parse_input(" r "), Some(Input::Refresh));
        assert_eq!(parse_input("list"), Some(Input::List));
        assert_eq!(parse_input("s"), Some(Input::Stop));
        assert_eq!(parse_input("q"), Some(Input::Quit));
        assert_eq!(parse_input(""), None);
        assert_eq!(parse_input("0"), Some(Input::Unknown("0".to_string())));
        assert_eq!(parse_input("dance"), Some(Input::Unknown("dance".to_string())));
    }
}
