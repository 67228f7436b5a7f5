//! Error types for the chat core.
//!
//! Transport failures are recovered inside the read loop and only surface from
//! the operations that cannot retry on their own (dialing a new session, the
//! handshake in [`Session::connect`](super::session::Session::connect)).
//! Usage errors are returned to the caller of the violating operation.

use thiserror::Error;

/// A raw line could not be turned into a [`ChatMessage`](super::parse::ChatMessage).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty line")]
    Empty,
    #[error("line has no command: {0:?}")]
    MissingCommand(String),
    #[error("malformed line: {0}")]
    Malformed(String),
}

/// Low-level connection failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("failed to dial {url}: {reason}")]
    Dial { url: String, reason: String },
    #[error("read failed: {0}")]
    Read(String),
    #[error("write failed: {0}")]
    Write(String),
    #[error("connection closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("session is already connected")]
    AlreadyConnected,
    #[error("dial failed: {0}")]
    Dial(#[source] TransportError),
    #[error("handshake failed: {0}")]
    Handshake(#[source] TransportError),
}

#[derive(Debug, Error)]
pub enum ListenError {
    #[error("session is not connected")]
    NotConnected,
    #[error("another task is already listening on this session")]
    AlreadyListening,
    #[error("gave up reconnecting after {attempts} attempts")]
    ReconnectExhausted { attempts: u32 },
}

/// Errors returned by `join`, `part` and `send`.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is not connected")]
    NotConnected,
    #[error("not joined to channel {0}")]
    NotJoined(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no account configured; the client is read-only")]
    NoAccount,
    #[error("client has not been started")]
    NotStarted,
    #[error("failed to open session: {0}")]
    Dial(#[source] TransportError),
    #[error(transparent)]
    Connect(#[from] ConnectError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
