//! Unix domain socket server for IPC
//!
//! Forwards requests to the engine. Subscribed clients also receive session
//! events (best effort) and shell commands (lossless).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::engine::EngineEvent;
use crate::events::SessionEvent;
use crate::platform::{ShellCommand, ShellLink};

use super::protocol::{Notification, Request, Response, MAX_FRAME_LEN};

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: UnixListener,
    engine_tx: mpsc::Sender<EngineEvent>,
    /// Source of push notifications; each subscribed client gets a receiver
    event_tx: broadcast::Sender<SessionEvent>,
    /// Subscribed clients attach here to host the platform speech capabilities
    shell: ShellLink,
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Create a new IPC server
    pub fn new(
        socket_path: &Path,
        engine_tx: mpsc::Sender<EngineEvent>,
        event_tx: broadcast::Sender<SessionEvent>,
        shell: ShellLink,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener,
            engine_tx,
            event_tx,
            shell,
            shutdown_tx,
        })
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let engine_tx = self.engine_tx.clone();
                    let event_tx = self.event_tx.clone();
                    let shell = self.shell.clone();
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, engine_tx, event_tx, shell) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client(
        stream: UnixStream,
        engine_tx: mpsc::Sender<EngineEvent>,
        event_tx: broadcast::Sender<SessionEvent>,
        shell: ShellLink,
    ) -> Result<()> {
        let (reader, mut writer) = stream.into_split();

        // Frames are read on their own task so the select loop stays cancel-safe
        let (frame_tx, frame_rx) = mpsc::channel(16);
        let reader_task = tokio::spawn(Self::read_frames(reader, frame_tx));

        let result = Self::serve_client(&mut writer, frame_rx, &engine_tx, &event_tx, &shell).await;

        reader_task.abort();
        result
    }

    /// Answer requests and push notifications until the client goes away
    async fn serve_client<W: AsyncWrite + Unpin>(
        writer: &mut W,
        mut frame_rx: mpsc::Receiver<Result<Request, String>>,
        engine_tx: &mpsc::Sender<EngineEvent>,
        event_tx: &broadcast::Sender<SessionEvent>,
        shell: &ShellLink,
    ) -> Result<()> {
        let mut events: Option<broadcast::Receiver<SessionEvent>> = None;
        let mut commands: Option<mpsc::UnboundedReceiver<ShellCommand>> = None;

        loop {
            tokio::select! {
                frame = frame_rx.recv() => {
                    let Some(frame) = frame else {
                        debug!("client disconnected");
                        return Ok(());
                    };

                    let response = match frame {
                        Ok(Request::Subscribe) => {
                            if events.is_none() {
                                events = Some(event_tx.subscribe());
                                commands = Some(shell.attach());
                            }
                            debug!("client subscribed to notifications");
                            Response::Subscribed
                        }
                        Ok(request) => Self::forward(request, engine_tx).await,
                        Err(message) => Response::error("bad_request", message),
                    };

                    Self::send_message(writer, &response).await?;
                }

                event = Self::next_event(&mut events) => {
                    match event {
                        Ok(event) => {
                            debug!(%event, "pushing event");
                            Self::send_message(writer, &Notification::Event { event }).await?;
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(skipped = n, "client notification receiver lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            events = None;
                        }
                    }
                }

                command = Self::next_command(&mut commands) => {
                    match command {
                        Some(command) => {
                            debug!(?command, "pushing shell command");
                            Self::send_message(writer, &Notification::Command { command }).await?;
                        }
                        None => commands = None,
                    }
                }
            }
        }
    }

    /// Read length-prefixed frames until EOF or an oversized frame
    async fn read_frames<R: AsyncRead + Unpin>(
        mut reader: R,
        frame_tx: mpsc::Sender<Result<Request, String>>,
    ) -> Result<()> {
        let mut len_buf = [0u8; 4];

        loop {
            // Read message length (4-byte little-endian)
            match reader.read_exact(&mut len_buf).await {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
                Err(e) => return Err(e.into()),
            }

            let len = u32::from_le_bytes(len_buf) as usize;
            if len > MAX_FRAME_LEN {
                warn!(len, "message too large, disconnecting");
                return Ok(());
            }

            // Read message body
            let mut msg_buf = vec![0u8; len];
            reader.read_exact(&mut msg_buf).await?;

            let frame = serde_json::from_slice::<Request>(&msg_buf).map_err(|e| e.to_string());
            if frame_tx.send(frame).await.is_err() {
                return Ok(());
            }
        }
    }

    /// Wait for the next notification, or forever if not subscribed
    async fn next_event(
        events: &mut Option<broadcast::Receiver<SessionEvent>>,
    ) -> Result<SessionEvent, broadcast::error::RecvError> {
        match events {
            Some(rx) => rx.recv().await,
            None => std::future::pending().await,
        }
    }

    /// Wait for the next shell command, or forever if not subscribed
    async fn next_command(
        commands: &mut Option<mpsc::UnboundedReceiver<ShellCommand>>,
    ) -> Option<ShellCommand> {
        match commands {
            Some(rx) => rx.recv().await,
            None => std::future::pending().await,
        }
    }

    /// Hand a request to the engine and wait for its answer.
    ///
    /// Recognizer callbacks join the engine's event stream and are
    /// acknowledged once queued.
    async fn forward(request: Request, engine_tx: &mpsc::Sender<EngineEvent>) -> Response {
        debug!(?request, "received request");

        let request = match request.into_recognizer_callback() {
            Ok(callback) => {
                return match engine_tx.send(EngineEvent::Recognizer(callback)).await {
                    Ok(()) => Response::Ok,
                    Err(_) => Response::error("engine_unavailable", "session engine stopped"),
                };
            }
            Err(request) => request,
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        let event = EngineEvent::Request {
            request,
            reply: Some(reply_tx),
        };

        if engine_tx.send(event).await.is_err() {
            return Response::error("engine_unavailable", "session engine stopped");
        }

        reply_rx
            .await
            .unwrap_or_else(|_| Response::error("engine_unavailable", "session engine dropped request"))
    }

    /// Send a length-prefixed JSON message
    async fn send_message<W, T>(writer: &mut W, msg: &T) -> Result<()>
    where
        W: AsyncWrite + Unpin,
        T: serde::Serialize,
    {
        let msg_bytes = serde_json::to_vec(msg)?;
        let msg_len = (msg_bytes.len() as u32).to_le_bytes();

        writer.write_all(&msg_len).await?;
        writer.write_all(&msg_bytes).await?;

        Ok(())
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;
    use crate::platform::BridgeSynthesizer;
    use crate::recognition::RecognizerCallback;
    use crate::speech::SpeechSynthesizer;

    async fn write_frame(stream: &mut UnixStream, json: &str) {
        stream
            .write_all(&(json.len() as u32).to_le_bytes())
            .await
            .unwrap();
        stream.write_all(json.as_bytes()).await.unwrap();
    }

    async fn read_frame(stream: &mut UnixStream) -> serde_json::Value {
        let mut len_buf = [0u8; 4];
        stream.read_exact(&mut len_buf).await.unwrap();
        let mut body = vec![0u8; u32::from_le_bytes(len_buf) as usize];
        stream.read_exact(&mut body).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    /// Start a server whose engine answers every request with Pong
    fn start_server(
        dir: &TempDir,
        event_capacity: usize,
    ) -> (
        PathBuf,
        broadcast::Sender<SessionEvent>,
        ShellLink,
        mpsc::UnboundedReceiver<RecognizerCallback>,
    ) {
        let path = dir.path().join("daemon.sock");
        let (engine_tx, mut engine_rx) = mpsc::channel(16);
        let (event_tx, _) = broadcast::channel(event_capacity);
        let shell = ShellLink::new();
        let server = Server::new(&path, engine_tx, event_tx.clone(), shell.clone()).unwrap();

        let (callback_tx, callback_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(event) = engine_rx.recv().await {
                match event {
                    EngineEvent::Request { reply: Some(reply), .. } => {
                        let _ = reply.send(Response::Pong);
                    }
                    EngineEvent::Recognizer(callback) => {
                        let _ = callback_tx.send(callback);
                    }
                    _ => {}
                }
            }
        });

        tokio::spawn(async move {
            let _ = server.run().await;
        });

        (path, event_tx, shell, callback_rx)
    }

    #[tokio::test]
    async fn test_forwards_requests_and_pushes_events() {
        let dir = TempDir::new().unwrap();
        let (path, event_tx, _shell, _callbacks) = start_server(&dir, 16);
        let mut client = UnixStream::connect(&path).await.unwrap();

        write_frame(&mut client, r#"{"type":"ping"}"#).await;
        assert_eq!(read_frame(&mut client).await["type"], "pong");

        write_frame(&mut client, r#"{"type":"subscribe"}"#).await;
        assert_eq!(read_frame(&mut client).await["type"], "subscribed");

        event_tx.send(SessionEvent::StatusCleared).unwrap();
        let note = tokio::time::timeout(Duration::from_secs(5), read_frame(&mut client))
            .await
            .unwrap();
        assert_eq!(note["type"], "event");
        assert_eq!(note["event"]["type"], "status_cleared");

        write_frame(&mut client, r#"{"type":"no_such_request"}"#).await;
        let reply = read_frame(&mut client).await;
        assert_eq!(reply["type"], "error");
        assert_eq!(reply["code"], "bad_request");
    }

    #[tokio::test]
    async fn test_recognizer_callbacks_join_engine_stream() {
        let dir = TempDir::new().unwrap();
        let (path, _event_tx, _shell, mut callbacks) = start_server(&dir, 16);
        let mut client = UnixStream::connect(&path).await.unwrap();

        write_frame(
            &mut client,
            r#"{"type":"recognizer_results","results":[{"text":"I need water","is_final":true}]}"#,
        )
        .await;
        assert_eq!(read_frame(&mut client).await["type"], "ok");

        write_frame(&mut client, r#"{"type":"recognizer_ended"}"#).await;
        assert_eq!(read_frame(&mut client).await["type"], "ok");

        assert!(matches!(
            callbacks.recv().await.unwrap(),
            RecognizerCallback::Results(results) if results[0].text == "I need water"
        ));
        assert_eq!(callbacks.recv().await.unwrap(), RecognizerCallback::Ended);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_still_gets_speech() {
        let dir = TempDir::new().unwrap();
        let (path, event_tx, shell, _callbacks) = start_server(&dir, 4);
        let mut client = UnixStream::connect(&path).await.unwrap();

        write_frame(&mut client, r#"{"type":"subscribe"}"#).await;
        assert_eq!(read_frame(&mut client).await["type"], "subscribed");

        // Overrun the event buffer before the client reads anything
        let mut synthesizer = BridgeSynthesizer::new(shell);
        synthesizer.speak("Thank you").unwrap();
        for _ in 0..64 {
            let _ = event_tx.send(SessionEvent::StatusCleared);
        }

        let spoken = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let note = read_frame(&mut client).await;
                if note["type"] == "command" {
                    return note;
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(spoken["command"]["type"], "speak");
        assert_eq!(spoken["command"]["text"], "Thank you");
    }

    #[tokio::test]
    async fn test_speech_fails_once_shell_disconnects() {
        let dir = TempDir::new().unwrap();
        let (path, _event_tx, shell, _callbacks) = start_server(&dir, 16);
        let mut client = UnixStream::connect(&path).await.unwrap();

        write_frame(&mut client, r#"{"type":"subscribe"}"#).await;
        assert_eq!(read_frame(&mut client).await["type"], "subscribed");
        let mut synthesizer = BridgeSynthesizer::new(shell);
        assert!(synthesizer.speak("Hello").is_ok());

        drop(client);
        let gone = tokio::time::timeout(Duration::from_secs(5), async {
            while synthesizer.speak("Hello").is_ok() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(gone.is_ok());
    }
}
