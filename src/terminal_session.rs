use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use futures::{Sink, SinkExt, Stream, StreamExt};
use log::{debug, error, info, warn};
use tokio::sync::{mpsc, oneshot};

use crate::channel::{self, Inbound, Outbound};
use crate::files::FileBrowser;
use crate::protocol::{ClientMessage, ServerMessage, SystemInfoReply, SystemInfoRequest};
use crate::pty::{PtyProcess, ShellCommand, ShellProcess, spawn_output_pump};
use crate::server::ServerConfig;
use crate::system_info;

const WELCOME: &[u8] = b"\r\n\x1b[1;32mWelcome to Web Terminal!\x1b[0m\r\n\r\n";

/// Server-side state of one live connection: the shell it owns and its
/// file browser. Dropping the session terminates the shell.
pub struct TerminalSession<P: ShellProcess> {
    browser: FileBrowser,
    process: P,
    started: Instant,
}

impl<P: ShellProcess> TerminalSession<P> {
    pub fn new(config: &ServerConfig, process: P) -> Self {
        Self {
            browser: FileBrowser::new(config),
            process,
            started: config.started,
        }
    }

    pub fn browser(&self) -> &FileBrowser {
        &self.browser
    }

    /// Handles one inbound frame and returns the reply, if the frame calls for one.
    pub async fn handle_frame(&mut self, frame: Inbound) -> Option<ServerMessage> {
        match frame {
            Inbound::Raw(data) => {
                if let Err(e) = self.process.write(&data) {
                    warn!("Failed to write {} bytes to shell: {}", data.len(), e);
                }
                None
            }
            Inbound::Control(msg) => self.handle_message(msg).await,
            Inbound::Unrecognized(e) => {
                warn!("{}", e);
                Some(ServerMessage::Error {
                    message: e.to_string(),
                })
            }
        }
    }

    async fn handle_message(&mut self, msg: ClientMessage) -> Option<ServerMessage> {
        match msg {
            ClientMessage::Resize { cols, rows } => {
                debug!("resize: {}x{}", cols, rows);
                if let Err(e) = self.process.resize(cols, rows) {
                    warn!("Failed to resize shell to {}x{}: {}", cols, rows, e);
                }
                None
            }
            ClientMessage::FileSystem(request) => Some(self.browser.handle(request).await),
            ClientMessage::SystemInfo(SystemInfoRequest::GetInfo) => {
                let data = system_info::info_payload(self.started).await;
                Some(ServerMessage::SystemInfo(SystemInfoReply::Info { data }))
            }
        }
    }
}

impl<P: ShellProcess> Drop for TerminalSession<P> {
    fn drop(&mut self) {
        self.process.terminate();
    }
}

/// Worker for one WebSocket connection: spawns the shell, then hands the
/// socket to [`run_session`].
pub async fn serve_connection(socket: WebSocket, config: Arc<ServerConfig>) {
    info!("New terminal connection established");

    let command = ShellCommand {
        program: config.shell.clone(),
        cwd: config.start_dir.clone(),
        cols: config.cols,
        rows: config.rows,
    };
    let (process, reader) = match PtyProcess::spawn(&command) {
        Ok(spawned) => spawned,
        Err(e) => {
            error!("Failed to spawn {}: {}", command.program, e);
            return;
        }
    };

    let (pty_tx, pty_rx) = mpsc::channel::<Bytes>(64);
    spawn_output_pump(reader, pty_tx);

    let session = TerminalSession::new(&config, process);
    let (ws_tx, ws_rx) = socket.split();
    run_session(ws_tx, ws_rx, session, pty_rx, config.banner).await;
    info!("Terminal connection closed");
}

/// Drives one session until the client goes away or the shell exits.
///
/// Control frames are handled one at a time in arrival order on this task.
/// Shell output is forwarded by its own task straight into the outbound
/// queue, so it interleaves freely with replies. The session, and with it
/// the shell, is dropped before this returns.
pub async fn run_session<P, S, R, E>(
    mut sink: S,
    mut inbound: R,
    mut session: TerminalSession<P>,
    mut output: mpsc::Receiver<Bytes>,
    banner: bool,
) where
    P: ShellProcess,
    S: Sink<Message> + Unpin + Send + 'static,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let (out_tx, mut out_rx) = mpsc::channel::<Outbound>(64);
    let (exit_tx, mut exit_rx) = oneshot::channel::<()>();

    // Single writer owns the sink
    let writer = tokio::spawn(async move {
        while let Some(out) = out_rx.recv().await {
            let closing = matches!(out, Outbound::Close);
            if let Some(msg) = out.into_message() {
                if sink.send(msg).await.is_err() {
                    break;
                }
            }
            if closing {
                break;
            }
        }
        let _ = sink.close().await;
    });

    if banner {
        let _ = out_tx.send(Outbound::Raw(Bytes::from_static(WELCOME))).await;
    }

    // Shell output, then Close once the shell is gone
    let forward_tx = out_tx.clone();
    let forwarder = tokio::spawn(async move {
        while let Some(data) = output.recv().await {
            if forward_tx.send(Outbound::Raw(data)).await.is_err() {
                return;
            }
        }
        info!("Shell exited, closing connection");
        let _ = forward_tx.send(Outbound::Close).await;
        let _ = exit_tx.send(());
    });

    loop {
        tokio::select! {
            _ = &mut exit_rx => break,
            msg = inbound.next() => {
                let frame = match msg {
                    Some(Ok(Message::Text(text))) => Bytes::from(text),
                    Some(Ok(Message::Binary(data))) => Bytes::from(data),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        debug!("WebSocket receive failed: {}", e);
                        break;
                    }
                };
                if let Some(reply) = session.handle_frame(channel::classify(frame)).await {
                    if out_tx.send(Outbound::Reply(reply)).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    // Teardown: kill the shell, then let the writer drain
    drop(session);
    drop(out_tx);
    forwarder.abort();
    let _ = writer.await;
}
