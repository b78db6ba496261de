//! Unix domain socket server for IPC
//!
//! Forwards framework requests to the module and pushes status events to
//! subscribed clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::events::StatusEvent;
use crate::hotkey::Hotkey;
use crate::host::Bridge;

use super::protocol::{ModuleStatus, Notification, Request, Response};

/// Largest accepted message body
const MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    shared: Arc<Shared>,
    shutdown_tx: broadcast::Sender<()>,
}

/// State shared by all client handlers
struct Shared {
    /// All callbacks into the module are serialized through this lock
    bridge: Mutex<Bridge>,
    start_time: Instant,
    event_tx: broadcast::Sender<StatusEvent>,
}

impl Server {
    /// Create a new IPC server serving `bridge`
    pub fn new(
        socket_path: &Path,
        bridge: Bridge,
        event_tx: broadcast::Sender<StatusEvent>,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path)
            .context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        let shared = Arc::new(Shared {
            bridge: Mutex::new(bridge),
            start_time: Instant::now(),
            event_tx,
        });

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener: Some(listener),
            shared,
            shutdown_tx,
        })
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        let listener = self.listener.as_ref()
            .context("server not initialized")?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let shared = Arc::clone(&self.shared);
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, shared) => {
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
    async fn handle_client(mut stream: UnixStream, shared: Arc<Shared>) -> Result<()> {
        let mut len_buf = [0u8; 4];

        loop {
            // Read message length (4-byte little-endian)
            match stream.read_exact(&mut len_buf).await {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    debug!("client disconnected");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }

            let len = u32::from_le_bytes(len_buf) as usize;
            if len > MAX_MESSAGE_LEN {
                warn!(len, "message too large, disconnecting");
                return Ok(());
            }

            // Read message body
            let mut msg_buf = vec![0u8; len];
            stream.read_exact(&mut msg_buf).await?;

            let request: Request = match serde_json::from_slice(&msg_buf) {
                Ok(request) => request,
                Err(e) => {
                    let response = Response::Error {
                        code: "bad_request".to_string(),
                        message: e.to_string(),
                    };
                    Self::send_message(&mut stream, &response).await?;
                    continue;
                }
            };

            debug!(?request, "received request");

            if let Request::Subscribe = request {
                // subscribe before acknowledging so no event falls in between
                let event_rx = shared.event_tx.subscribe();
                Self::send_message(&mut stream, &Response::Subscribed).await?;
                debug!("client subscribed to notifications");
                return Self::push_events(stream, event_rx).await;
            }

            let response = Self::process_request(request, &shared).await;
            Self::send_message(&mut stream, &response).await?;
        }
    }

    /// Forward status events to a subscribed client until it goes away
    async fn push_events(
        mut stream: UnixStream,
        mut event_rx: broadcast::Receiver<StatusEvent>,
    ) -> Result<()> {
        loop {
            match event_rx.recv().await {
                Ok(event) => {
                    let notification = Notification::StatusEvent(event);
                    Self::send_message(&mut stream, &notification).await?;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "status event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(()),
            }
        }
    }

    /// Send a length-prefixed JSON message
    async fn send_message<T: serde::Serialize>(stream: &mut UnixStream, msg: &T) -> Result<()> {
        let msg_bytes = serde_json::to_vec(msg)?;
        let msg_len = (msg_bytes.len() as u32).to_le_bytes();

        stream.write_all(&msg_len).await?;
        stream.write_all(&msg_bytes).await?;

        Ok(())
    }

    /// Process a request and return a response
    async fn process_request(request: Request, shared: &Shared) -> Response {
        let mut bridge = shared.bridge.lock().await;

        match request {
            Request::Ping => Response::Pong,

            Request::GetStatus => {
                let uptime = shared.start_time.elapsed().as_secs();
                Response::Status(ModuleStatus::from_bridge(&bridge, uptime))
            }

            Request::Commit { text } => Response::Committed {
                text: bridge.commit(&text),
            },

            Request::KeyPressed { hotkey } => match Hotkey::parse(&hotkey) {
                Ok(hotkey) => bridge.key_pressed(&hotkey).into(),
                Err(e) => Response::Error {
                    code: "bad_hotkey".to_string(),
                    message: e.to_string(),
                },
            },

            Request::ClickStatus { name } => {
                if bridge.click_status(&name) {
                    let enabled = bridge
                        .registry()
                        .status(&name)
                        .map(|entry| (entry.hook.get)(bridge.state()))
                        .unwrap_or(false);
                    Response::StatusToggled { name, enabled }
                } else {
                    Response::Error {
                        code: "unknown_status".to_string(),
                        message: format!("no status named {:?}", name),
                    }
                }
            }

            Request::SetLanguage { language } => {
                bridge.set_language(language);
                Response::Ok
            }

            Request::SetInputMethod { active } => {
                bridge.set_input_method_active(active);
                Response::Ok
            }

            Request::Reload => {
                if bridge.reload() {
                    Response::Ok
                } else {
                    Response::Error {
                        code: "reload_failed".to_string(),
                        message: "configuration reload failed, previous values kept".to_string(),
                    }
                }
            }

            // handled by the connection loop
            Request::Subscribe => Response::Subscribed,
        }
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
    use tokio_test::assert_ok;

    use super::*;
    use crate::config::FileStore;
    use crate::host::STATUS_NAME;

    const DESC: &str = include_str!("../../data/fcitx-tsundere.desc");

    /// Start a server over a fresh module rooted in `dir`
    fn serve(dir: &Path, config: Option<&str>) -> (Arc<Server>, PathBuf) {
        std::fs::write(dir.join("fcitx-tsundere.desc"), DESC).unwrap();
        if let Some(config) = config {
            std::fs::write(dir.join("fcitx-tsundere.config"), config).unwrap();
        }

        let store = FileStore::new(
            dir.join("fcitx-tsundere.config"),
            dir.join("fcitx-tsundere.desc"),
        );
        let (event_tx, _) = broadcast::channel(16);
        let bridge = Bridge::create(Box::new(store), event_tx.clone()).unwrap();

        let socket_path = dir.join("daemon.sock");
        let server = Arc::new(Server::new(&socket_path, bridge, event_tx).unwrap());
        let runner = Arc::clone(&server);
        tokio::spawn(async move { runner.run().await });

        (server, socket_path)
    }

    async fn read_frame(stream: &mut UnixStream) -> Vec<u8> {
        let mut len_buf = [0u8; 4];
        assert_ok!(stream.read_exact(&mut len_buf).await);
        let mut body = vec![0u8; u32::from_le_bytes(len_buf) as usize];
        assert_ok!(stream.read_exact(&mut body).await);
        body
    }

    async fn request(stream: &mut UnixStream, request: &Request) -> Response {
        assert_ok!(Server::send_message(stream, request).await);
        assert_ok!(serde_json::from_slice(&read_frame(stream).await))
    }

    async fn notification(stream: &mut UnixStream) -> StatusEvent {
        let notification: Notification =
            assert_ok!(serde_json::from_slice(&read_frame(stream).await));
        let Notification::StatusEvent(event) = notification;
        event
    }

    #[tokio::test]
    async fn test_commit_over_socket() {
        let dir = tempfile::tempdir().unwrap();
        let (server, socket_path) =
            serve(dir.path(), Some("[Tsundere]\nEnabled = true\nMarker = \"!\"\n"));

        let mut stream = assert_ok!(UnixStream::connect(&socket_path).await);

        assert!(matches!(request(&mut stream, &Request::Ping).await, Response::Pong));

        request(&mut stream, &Request::SetInputMethod { active: true }).await;
        let resp = request(&mut stream, &Request::Commit { text: "AB".to_string() }).await;
        assert!(matches!(resp, Response::Committed { text } if text == "A!B!"));

        let resp = request(&mut stream, &Request::KeyPressed { hotkey: "CTRL_".to_string() }).await;
        assert!(matches!(resp, Response::Error { code, .. } if code == "bad_hotkey"));

        match request(&mut stream, &Request::GetStatus).await {
            Response::Status(status) => {
                assert!(status.enabled);
                assert_eq!(status.marker, "!");
                assert_eq!(status.hotkey, "CTRL_ALT_T");
            }
            other => panic!("unexpected response: {:?}", other),
        }

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_subscriber_receives_status_events() {
        let dir = tempfile::tempdir().unwrap();
        let (server, socket_path) = serve(dir.path(), None);

        let mut subscriber = assert_ok!(UnixStream::connect(&socket_path).await);
        assert!(matches!(
            request(&mut subscriber, &Request::Subscribe).await,
            Response::Subscribed
        ));

        let mut client = assert_ok!(UnixStream::connect(&socket_path).await);
        let language = Some("zh_CN".to_string());
        request(&mut client, &Request::SetLanguage { language }).await;

        let resp = request(&mut client, &Request::KeyPressed { hotkey: "CTRL_ALT_T".to_string() }).await;
        assert!(matches!(resp, Response::Key { consumed: true }));
        assert_eq!(
            notification(&mut subscriber).await,
            StatusEvent::StatusChanged {
                name: STATUS_NAME.to_string(),
                enabled: true
            }
        );

        let language = Some("en_US".to_string());
        request(&mut client, &Request::SetLanguage { language }).await;
        assert_eq!(
            notification(&mut subscriber).await,
            StatusEvent::VisibilityChanged {
                name: STATUS_NAME.to_string(),
                visible: false
            }
        );

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_failed_reload_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let (server, socket_path) = serve(dir.path(), None);

        let mut stream = assert_ok!(UnixStream::connect(&socket_path).await);
        assert!(matches!(request(&mut stream, &Request::Reload).await, Response::Ok));

        assert_ok!(std::fs::remove_file(dir.path().join("fcitx-tsundere.desc")));
        let resp = request(&mut stream, &Request::Reload).await;
        assert!(matches!(resp, Response::Error { code, .. } if code == "reload_failed"));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_malformed_request_gets_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let (server, socket_path) = serve(dir.path(), None);

        let mut stream = assert_ok!(UnixStream::connect(&socket_path).await);
        let body = b"not json";
        assert_ok!(stream.write_all(&(body.len() as u32).to_le_bytes()).await);
        assert_ok!(stream.write_all(body).await);

        let resp: Response = assert_ok!(serde_json::from_slice(&read_frame(&mut stream).await));
        assert!(matches!(resp, Response::Error { code, .. } if code == "bad_request"));

        // connection stays usable
        assert!(matches!(request(&mut stream, &Request::Ping).await, Response::Pong));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_oversized_message_disconnects() {
        let dir = tempfile::tempdir().unwrap();
        let (server, socket_path) = serve(dir.path(), None);

        let mut stream = assert_ok!(UnixStream::connect(&socket_path).await);
        let len = (MAX_MESSAGE_LEN + 1) as u32;
        assert_ok!(stream.write_all(&len.to_le_bytes()).await);

        let mut buf = [0u8; 1];
        let n = assert_ok!(stream.read(&mut buf).await);
        assert_eq!(n, 0);

        server.shutdown().await;
    }
}
