//! Unified error type for the server crate.

use fourline_protocol::ProtocolError;

/// Errors surfaced by the transport front-end.
///
/// Nothing in the session engine itself is fatal: protocol violations turn
/// into `error` replies or silent ignores, and collaborator failures are
/// logged. What remains is the transport's own plumbing.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Binding the listener or accepting a TCP connection failed.
    #[error("transport failed: {0}")]
    Io(#[from] std::io::Error),

    /// The WebSocket handshake or a frame-level operation failed.
    #[error("websocket failure: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Encoding an outbound message failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
