//! Line transport: the seam between a session and its socket.
//!
//! A [`Dialer`] opens a connection and hands back its two halves. The
//! session keeps the [`LineSink`] behind its write lock and gives the
//! [`LineStream`] to the read loop, so reads and writes never contend.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use super::error::TransportError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Both halves of one live connection.
pub struct Link {
    pub sink: Box<dyn LineSink>,
    pub stream: Box<dyn LineStream>,
}

#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial(&self, url: &str) -> Result<Link, TransportError>;
}

#[async_trait]
pub trait LineSink: Send {
    async fn send_line(&mut self, line: &str) -> Result<(), TransportError>;
    /// Close with a normal-closure code.
    async fn close(&mut self) -> Result<(), TransportError>;
}

#[async_trait]
pub trait LineStream: Send {
    async fn next_line(&mut self) -> Result<String, TransportError>;
}

/// Dials `ws://` and `wss://` URLs.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsDialer;

#[async_trait]
impl Dialer for WsDialer {
    async fn dial(&self, url: &str) -> Result<Link, TransportError> {
        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| TransportError::Dial {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        let (sink, stream) = ws.split();
        Ok(Link {
            sink: Box::new(WsSink { inner: sink }),
            stream: Box::new(WsLines {
                inner: stream,
                pending: VecDeque::new(),
            }),
        })
    }
}

struct WsSink {
    inner: SplitSink<WsStream, Message>,
}

#[async_trait]
impl LineSink for WsSink {
    async fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
        self.inner
            .send(Message::Text(line.to_owned().into()))
            .await
            .map_err(|e| TransportError::Write(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: String::new().into(),
        };
        self.inner
            .send(Message::Close(Some(frame)))
            .await
            .map_err(|e| TransportError::Write(e.to_string()))?;
        self.inner
            .close()
            .await
            .map_err(|e| TransportError::Write(e.to_string()))
    }
}

struct WsLines {
    inner: SplitStream<WsStream>,
    pending: VecDeque<String>,
}

#[async_trait]
impl LineStream for WsLines {
    async fn next_line(&mut self) -> Result<String, TransportError> {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return Ok(line);
            }
            match self.inner.next().await {
                Some(Ok(Message::Text(text))) => self.pending.extend(split_frame(text.as_str())),
                Some(Ok(Message::Binary(data))) => match std::str::from_utf8(&data) {
                    Ok(text) => self.pending.extend(split_frame(text)),
                    Err(_) => debug!(len = data.len(), "dropping non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| format!("closed by server ({})", f.code))
                        .unwrap_or_else(|| "closed by server".to_string());
                    return Err(TransportError::Read(reason));
                }
                // ping/pong are answered by tungstenite
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(TransportError::Read(e.to_string())),
                None => return Err(TransportError::Closed),
            }
        }
    }
}

/// Split a frame that may carry several CRLF-joined lines.
fn split_frame(frame: &str) -> impl Iterator<Item = String> + '_ {
    frame
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
}
