#[cfg(unix)]
mod unix {
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;
    use std::path::PathBuf;
    use std::process::Stdio;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
    use tokio::net::UnixStream;
    use tokio::process::{Child, Command};
    use tokio::sync::mpsc;
    use tokio::time::{timeout, Duration};
    use tracing::{debug, warn};

    use crate::error::PlaybackError;
    use crate::playback::{EngineEvent, EngineFactory, MediaRequest, PlaybackEngine};

    const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

    #[derive(Debug, Clone, Deserialize)]
    pub struct MpvEvent {
        pub event: String,
        #[serde(default)]
        pub reason: Option<String>,
        #[serde(default)]
        pub file_error: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    enum MpvResponse {
        Event(MpvEvent),
        Reply { error: String },
    }

    /// Translate an mpv IPC event into what the session cares about.
    pub fn engine_event(event: &MpvEvent) -> Option<EngineEvent> {
        match event.event.as_str() {
            "file-loaded" => Some(EngineEvent::Ready),
            "end-file" => match event.reason.as_deref() {
                Some("eof") => Some(EngineEvent::Finished),
                Some("error") => Some(EngineEvent::Failed(
                    event
                        .file_error
                        .clone()
                        .unwrap_or_else(|| "unknown error".to_string()),
                )),
                _ => None,
            },
            _ => None,
        }
    }

    pub async fn check_dependencies(binary: &str) -> Result<(), PlaybackError> {
        if Command::new(binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .is_err()
        {
            return Err(PlaybackError::Spawn(format!(
                "{} not found. Install it:\n\n  \
                 Ubuntu/Debian: sudo apt install mpv\n  \
                 Arch:          sudo pacman -S mpv\n  \
                 Fedora:        sudo dnf install mpv\n  \
                 macOS:         brew install mpv\n",
                binary
            )));
        }
        Ok(())
    }

    /// One mpv process driven over its JSON IPC socket.
    pub struct MpvEngine {
        socket_path: PathBuf,
        process: Child,
        writer: BufWriter<tokio::net::unix::OwnedWriteHalf>,
        event_rx: mpsc::Receiver<MpvEvent>,
        reply_rx: mpsc::Receiver<String>,
        released: bool,
    }

    impl MpvEngine {
        pub async fn spawn(binary: &str) -> Result<Self, PlaybackError> {
            check_dependencies(binary).await?;

            let socket_path = std::env::temp_dir().join(format!(
                "cloudtune-mpv-{}-{:08x}.sock",
                std::process::id(),
                rand::random::<u32>()
            ));
            let _ = std::fs::remove_file(&socket_path);

            let mut process = Command::new(binary)
                .args([
                    "--idle=yes",
                    "--no-video",
                    "--no-terminal",
                    "--really-quiet",
                    "--ytdl=no",
                    &format!("--input-ipc-server={}", socket_path.display()),
                ])
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                // Dropping a half-started engine must not leave mpv behind.
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| PlaybackError::Spawn(format!("Failed to spawn {}: {}", binary, e)))?;

            let mut connected = false;
            for _ in 0..50 {
                if socket_path.exists() {
                    connected = true;
                    break;
                }
                if let Ok(Some(status)) = process.try_wait() {
                    return Err(PlaybackError::Spawn(format!("mpv exited early ({})", status)));
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }

            if !connected {
                let _ = process.kill().await;
                return Err(PlaybackError::Spawn(format!(
                    "mpv socket did not appear at {}",
                    socket_path.display()
                )));
            }

            let stream = match UnixStream::connect(&socket_path).await {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = process.kill().await;
                    let _ = std::fs::remove_file(&socket_path);
                    return Err(PlaybackError::Spawn(format!(
                        "Failed to connect to mpv socket: {}",
                        e
                    )));
                }
            };

            let (reader, writer) = stream.into_split();
            let writer = BufWriter::new(writer);

            let (event_tx, event_rx) = mpsc::channel(32);
            let (reply_tx, reply_rx) = mpsc::channel(32);
            tokio::spawn(Self::read_events(BufReader::new(reader), event_tx, reply_tx));

            debug!(pid = ?process.id(), socket = %socket_path.display(), "mpv started");

            Ok(Self {
                socket_path,
                process,
                writer,
                event_rx,
                reply_rx,
                released: false,
            })
        }

        async fn read_events(
            mut reader: BufReader<tokio::net::unix::OwnedReadHalf>,
            event_tx: mpsc::Sender<MpvEvent>,
            reply_tx: mpsc::Sender<String>,
        ) {
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => break,
                    Ok(_) => {
                        if let Ok(resp) = serde_json::from_str::<MpvResponse>(&line) {
                            match resp {
                                MpvResponse::Event(event) => {
                                    if event_tx.send(event).await.is_err() {
                                        break;
                                    }
                                }
                                MpvResponse::Reply { error } => {
                                    let _ = reply_tx.send(error).await;
                                }
                            }
                        }
                    }
                    Err(_) => break,
                }
            }
        }

        async fn send_command(&mut self, cmd: Vec<serde_json::Value>) -> Result<(), PlaybackError> {
            let msg = json!({ "command": cmd });
            let line = format!("{}\n", msg);
            self.writer.write_all(line.as_bytes()).await?;
            self.writer.flush().await?;
            Ok(())
        }

        /// Send a command and wait for mpv to acknowledge it.
        async fn command(&mut self, cmd: Vec<serde_json::Value>) -> Result<(), PlaybackError> {
            let name = cmd
                .first()
                .and_then(|v| v.as_str())
                .unwrap_or("command")
                .to_string();
            self.send_command(cmd).await?;

            match timeout(REPLY_TIMEOUT, self.reply_rx.recv()).await {
                Ok(Some(error)) if error == "success" => Ok(()),
                Ok(Some(error)) => Err(PlaybackError::Engine(format!("{} failed: {}", name, error))),
                Ok(None) => Err(PlaybackError::EngineGone),
                Err(_) => Err(PlaybackError::Engine(format!("{} was not acknowledged", name))),
            }
        }
    }

    #[async_trait]
    impl PlaybackEngine for MpvEngine {
        async fn load(&mut self, request: &MediaRequest) -> Result<(), PlaybackError> {
            // Passed over IPC so the token never shows up in the process arguments.
            self.command(vec![
                json!("set_property"),
                json!("http-header-fields"),
                json!(request.header_lines()),
            ])
            .await?;
            self.command(vec![
                json!("set_property"),
                json!("user-agent"),
                json!(request.user_agent),
            ])
            .await?;
            self.command(vec![json!("loadfile"), json!(request.url), json!("replace")])
                .await?;
            self.command(vec![json!("set_property"), json!("pause"), json!(false)])
                .await
        }

        async fn next_event(&mut self) -> Option<EngineEvent> {
            loop {
                let event = self.event_rx.recv().await?;
                if let Some(mapped) = engine_event(&event) {
                    return Some(mapped);
                }
            }
        }

        async fn release(&mut self) -> Result<(), PlaybackError> {
            if self.released {
                return Ok(());
            }
            self.released = true;

            if let Err(e) = self.send_command(vec![json!("quit")]).await {
                debug!("mpv quit command failed: {}", e);
            }
            match timeout(REPLY_TIMEOUT, self.process.wait()).await {
                Ok(Ok(status)) => debug!(%status, "mpv exited"),
                Ok(Err(e)) => warn!("Failed to reap mpv: {}", e),
                Err(_) => {
                    if let Err(e) = self.process.kill().await {
                        warn!("Failed to kill mpv: {}", e);
                    }
                }
            }
            let _ = std::fs::remove_file(&self.socket_path);
            debug!("mpv released");
            Ok(())
        }
    }

    impl Drop for MpvEngine {
        fn drop(&mut self) {
            if !self.released {
                let _ = self.process.start_kill();
                let _ = std::fs::remove_file(&self.socket_path);
            }
        }
    }

    pub struct MpvFactory {
        binary: String,
    }

    impl MpvFactory {
        pub fn new(binary: impl Into<String>) -> Self {
            Self {
                binary: binary.into(),
            }
        }
    }

    #[async_trait]
    impl EngineFactory for MpvFactory {
        async fn create(&self) -> Result<Box<dyn PlaybackEngine>, PlaybackError> {
            Ok(Box::new(MpvEngine::spawn(&self.binary).await?))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn parse(line: &str) -> MpvEvent {
            match serde_json::from_str::<MpvResponse>(line).unwrap() {
                MpvResponse::Event(event) => event,
                MpvResponse::Reply { .. } => panic!("expected an event"),
            }
        }

        #[test]
        fn test_file_loaded_is_ready() {
            let event = parse(r#"{"event":"file-loaded"}"#);
            assert_eq!(engine_event(&event), Some(EngineEvent::Ready));
        }

        #[test]
        fn test_end_of_file_is_finished() {
            let event = parse(r#"{"event":"end-file","reason":"eof","playlist_entry_id":1}"#);
            assert_eq!(engine_event(&event), Some(EngineEvent::Finished));
        }

        #[test]
        fn test_error_end_is_failure() {
            let event = parse(
                r#"{"event":"end-file","reason":"error","file_error":"loading failed","playlist_entry_id":1}"#,
            );
            assert_eq!(
                engine_event(&event),
                Some(EngineEvent::Failed("loading failed".to_string()))
            );
        }

        #[test]
        fn test_replaced_file_is_ignored() {
            let event = parse(r#"{"event":"end-file","reason":"stop"}"#);
            assert_eq!(engine_event(&event), None);
            assert_eq!(engine_event(&parse(r#"{"event":"idle"}"#)), None);
        }

        #[test]
        fn test_reply_is_not_an_event() {
            let resp: MpvResponse =
                serde_json::from_str(r#"{"request_id":0,"error":"success","data":null}"#).unwrap();
            assert!(matches!(resp, MpvResponse::Reply { ref error } if error == "success"));
        }

        #[tokio::test]
        async fn test_missing_binary() {
            let err = MpvEngine::spawn("/nonexistent/cloudtune-mpv").await.err().unwrap();
            assert!(matches!(err, PlaybackError::Spawn(_)));
        }

        #[tokio::test]
        async fn test_dependency_check() {
            assert!(check_dependencies("/nonexistent/cloudtune-mpv").await.is_err());
            assert!(check_dependencies("true").await.is_ok());
        }
    }
}

#[cfg(unix)]
pub use unix::*;

#[cfg(not(unix))]
compile_error!("Playback is currently only supported on Unix systems (Linux/macOS).");
