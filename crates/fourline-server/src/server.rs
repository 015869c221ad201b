//! WebSocket front-end: accepts connections and bridges them to the
//! engine.
//!
//! Each accepted socket gets two tasks: a reader that decodes client
//! messages into engine commands, and a writer that drains the
//! connection's outbound channel into the socket. The engine itself never
//! touches the network.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use fourline_protocol::{ClientMessage, Codec, JsonCodec};
use fourline_store::{EventSink, Storage};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::engine::{EngineHandle, spawn_engine};
use crate::game::ConnectionId;
use crate::{EngineConfig, ServerError};

/// Counter for generating unique connection ids.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// A bound Fourline server. Call [`run`](Self::run) to start accepting
/// connections.
pub struct Server {
    listener: TcpListener,
    engine: EngineHandle,
}

impl Server {
    /// Binds the listener and spawns the session engine.
    pub async fn bind<S, E>(
        addr: &str,
        config: EngineConfig,
        store: Arc<S>,
        events: Arc<E>,
    ) -> Result<Self, ServerError>
    where
        S: Storage,
        E: EventSink,
    {
        let listener = TcpListener::bind(addr).await?;
        let engine = spawn_engine(config, store, events);
        tracing::info!(addr, "fourline server listening");
        Ok(Self { listener, engine })
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop. Each connection gets its own handler task;
    /// runs until the process is terminated.
    pub async fn run(self) -> Result<(), ServerError> {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let engine = self.engine.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, engine).await {
                            tracing::debug!(%peer, error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Handles a single socket from accept to close.
async fn handle_connection(stream: TcpStream, engine: EngineHandle) -> Result<(), ServerError> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let conn = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
    tracing::debug!(%conn, "websocket connection accepted");

    let (mut sink, mut stream) = ws.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel();
    engine.register(conn, out_tx);

    // Writer: engine → socket. Ends when the engine drops the last sender
    // clone for this connection or the peer goes away.
    let writer = tokio::spawn(async move {
        let codec = JsonCodec;
        while let Some(msg) = out_rx.recv().await {
            let bytes = match codec.encode(&msg) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to encode outbound message");
                    continue;
                }
            };
            if sink.send(Message::Binary(bytes.into())).await.is_err() {
                break;
            }
        }
    });

    // Reader: socket → engine. Malformed frames are logged and skipped,
    // never fatal to the connection.
    let codec = JsonCodec;
    while let Some(frame) = stream.next().await {
        let data = match frame {
            Ok(Message::Binary(data)) => data.to_vec(),
            Ok(Message::Text(text)) => text.as_bytes().to_vec(),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue, // ping/pong
            Err(e) => {
                tracing::debug!(%conn, error = %e, "websocket receive error");
                break;
            }
        };
        match codec.decode::<ClientMessage>(&data) {
            Ok(msg) => engine.inbound(conn, msg),
            Err(e) => {
                tracing::debug!(%conn, error = %e, "undecodable client message, skipping");
            }
        }
    }

    engine.closed(conn);
    writer.abort();
    tracing::debug!(%conn, "connection closed");
    Ok(())
}
