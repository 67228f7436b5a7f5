//! Transport session: one identity's connection lifecycle.
//!
//! A [`Session`] is shared behind an `Arc`: one task runs [`Session::listen`]
//! while others call `join`, `part`, `send` and `close`. Writes are
//! serialized by an async mutex around the sink, and the membership set is
//! only mutated while that mutex is held, so a rejoin after reconnect cannot
//! interleave with a concurrent `part`.

use std::sync::Arc;

use parking_lot::{Mutex as SyncMutex, RwLock};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::error::{ConnectError, ListenError, SessionError, TransportError};
use super::identity::Identity;
use super::membership::ChannelSet;
use super::outbound;
use super::parse::{parse_line, ChatMessage};
use super::reconnect::ReconnectPolicy;
use super::transport::{Dialer, LineSink, LineStream, Link};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Disconnected,
    Connected,
}

/// Where and how a session connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub url: String,
    pub capabilities: Vec<String>,
    pub reconnect: ReconnectPolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            url: "wss://irc-ws.chat.twitch.tv".to_string(),
            capabilities: vec!["twitch.tv/commands".to_string(), "twitch.tv/tags".to_string()],
            reconnect: ReconnectPolicy::default(),
        }
    }
}

enum Recovery {
    Restored,
    Cancelled,
}

type Writer = Option<Box<dyn LineSink>>;
type Reader = Option<Box<dyn LineStream>>;

pub struct Session {
    identity: Identity,
    settings: SessionSettings,
    dialer: Arc<dyn Dialer>,
    state: RwLock<TransportState>,
    channels: RwLock<ChannelSet>,
    writer: Mutex<Writer>,
    reader: Mutex<Reader>,
    /// Held for the whole of `connect`.
    connecting: Mutex<()>,
    cancel: SyncMutex<CancellationToken>,
}

impl Session {
    /// Dial the server. The session is not authenticated until
    /// [`connect`](Self::connect).
    pub async fn open(
        identity: Identity,
        settings: SessionSettings,
        dialer: Arc<dyn Dialer>,
    ) -> Result<Self, TransportError> {
        let link = dialer.dial(&settings.url).await?;
        debug!(login = %identity.login(), url = %settings.url, "dialed chat server");
        Ok(Self {
            identity,
            settings,
            dialer,
            state: RwLock::new(TransportState::Disconnected),
            channels: RwLock::new(ChannelSet::new()),
            writer: Mutex::new(Some(link.sink)),
            reader: Mutex::new(Some(link.stream)),
            connecting: Mutex::new(()),
            cancel: SyncMutex::new(CancellationToken::new()),
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn state(&self) -> TransportState {
        *self.state.read()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == TransportState::Connected
    }

    pub fn is_joined(&self, channel: &str) -> bool {
        self.channels.read().contains(channel)
    }

    pub fn channels(&self) -> Vec<String> {
        self.channels.read().all()
    }

    /// Authenticate over the dialed connection, re-dialing first if the
    /// session was closed.
    pub async fn connect(&self) -> Result<(), ConnectError> {
        let _connecting = self.connecting.lock().await;
        if self.is_connected() {
            return Err(ConnectError::AlreadyConnected);
        }
        let token = CancellationToken::new();
        *self.cancel.lock() = token.clone();

        // Never wait on the reader lock while holding the writer lock: the read
        // loop takes them in the opposite order.
        let needs_dial = self.writer.lock().await.is_none();
        if needs_dial {
            let link = self
                .dialer
                .dial(&self.settings.url)
                .await
                .map_err(ConnectError::Dial)?;
            *self.reader.lock().await = Some(link.stream);
            *self.writer.lock().await = Some(link.sink);
        }

        let mut writer = self.writer.lock().await;
        if let Err(e) = self.handshake(&mut writer, &token).await {
            writer.take();
            drop(writer);
            self.reader.lock().await.take();
            return Err(ConnectError::Handshake(e));
        }
        drop(writer);

        *self.state.write() = TransportState::Connected;
        info!(login = %self.identity.login(), "session connected");
        Ok(())
    }

    /// Join one or more channels with a single batched request.
    pub async fn join<S: AsRef<str>>(&self, channels: &[S]) -> Result<(), SessionError> {
        self.ensure_connected()?;
        if channels.is_empty() {
            return Ok(());
        }
        let token = self.token();
        let mut writer = self.writer.lock().await;
        write_line(&mut writer, &outbound::join_line(channels), &token).await?;
        let mut set = self.channels.write();
        for channel in channels {
            set.add(channel.as_ref());
        }
        Ok(())
    }

    pub async fn part(&self, channel: &str) -> Result<(), SessionError> {
        self.ensure_connected()?;
        let token = self.token();
        let mut writer = self.writer.lock().await;
        if !self.is_joined(channel) {
            return Err(SessionError::NotJoined(channel.to_string()));
        }
        write_line(&mut writer, &outbound::part_line(channel), &token).await?;
        self.channels.write().remove(channel);
        Ok(())
    }

    /// Post to a channel. Membership is not checked; the server decides.
    pub async fn send(&self, channel: &str, text: &str) -> Result<(), SessionError> {
        self.ensure_connected()?;
        let token = self.token();
        let mut writer = self.writer.lock().await;
        write_line(&mut writer, &outbound::privmsg_line(channel, text), &token).await?;
        Ok(())
    }

    /// Run the read loop until [`close`](Self::close) is called.
    ///
    /// Each line is parsed and handed to `on_message`; malformed lines are
    /// skipped. A transport failure triggers redial, handshake and rejoin of
    /// every channel in the membership set, retried per the reconnect policy.
    /// `on_message` runs on the read loop, so it must not block.
    pub async fn listen<F>(&self, mut on_message: F) -> Result<(), ListenError>
    where
        F: FnMut(ChatMessage) + Send,
    {
        if !self.is_connected() {
            return Err(ListenError::NotConnected);
        }
        let mut reader = self
            .reader
            .try_lock()
            .map_err(|_| ListenError::AlreadyListening)?;
        let token = self.token();

        loop {
            let next = match reader.as_mut() {
                Some(stream) => tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    line = stream.next_line() => line,
                },
                None => Err(TransportError::Closed),
            };

            let line = match next {
                Ok(line) => line,
                Err(e) => {
                    if token.is_cancelled() {
                        break;
                    }
                    warn!(login = %self.identity.login(), error = %e, "transport read failed, reconnecting");
                    match self.recover(&mut *reader, &token).await? {
                        Recovery::Restored => continue,
                        Recovery::Cancelled => break,
                    }
                }
            };

            let message = match parse_line(&line) {
                Ok(message) => message,
                Err(e) => {
                    debug!(error = %e, "skipping malformed line");
                    continue;
                }
            };

            match message.command.as_str() {
                "PING" => {
                    let mut writer = self.writer.lock().await;
                    let pong = outbound::pong_line(&message.channel);
                    if let Err(e) = write_line(&mut writer, &pong, &token).await {
                        warn!(error = %e, "failed to answer PING");
                    }
                }
                "RECONNECT" => {
                    info!(login = %self.identity.login(), "server requested reconnect");
                    match self.recover(&mut *reader, &token).await? {
                        Recovery::Restored => {}
                        Recovery::Cancelled => break,
                    }
                }
                _ => on_message(message),
            }
        }

        reader.take();
        Ok(())
    }

    /// Close the connection and stop the read loop. Safe to call from any
    /// task, any number of times.
    pub async fn close(&self) {
        let previous = std::mem::replace(&mut *self.state.write(), TransportState::Disconnected);
        self.cancel.lock().cancel();

        let sink = self.writer.lock().await.take();
        if let Some(mut sink) = sink {
            if let Err(e) = sink.close().await {
                debug!(error = %e, "error while closing connection");
            }
        }
        // The read loop drops its own stream once it sees the cancellation.
        if let Ok(mut reader) = self.reader.try_lock() {
            reader.take();
        }

        if previous == TransportState::Connected {
            info!(login = %self.identity.login(), "session closed");
        }
    }

    fn ensure_connected(&self) -> Result<(), SessionError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(SessionError::NotConnected)
        }
    }

    fn token(&self) -> CancellationToken {
        self.cancel.lock().clone()
    }

    async fn handshake(
        &self,
        writer: &mut Writer,
        token: &CancellationToken,
    ) -> Result<(), TransportError> {
        for line in outbound::handshake_lines(&self.identity, &self.settings.capabilities) {
            write_line(writer, &line, token).await?;
        }
        Ok(())
    }

    /// Replace the dead connection, retrying until it works, the policy gives
    /// up, or the session is closed.
    async fn recover(
        &self,
        reader: &mut Reader,
        token: &CancellationToken,
    ) -> Result<Recovery, ListenError> {
        let mut attempt: u32 = 0;
        loop {
            if token.is_cancelled() {
                return Ok(Recovery::Cancelled);
            }
            attempt += 1;
            reader.take();
            self.writer.lock().await.take();

            match self.reestablish(token).await {
                Ok(stream) => {
                    *reader = Some(stream);
                    info!(login = %self.identity.login(), attempt, "session restored");
                    return Ok(Recovery::Restored);
                }
                Err(e) => {
                    if token.is_cancelled() {
                        return Ok(Recovery::Cancelled);
                    }
                    warn!(login = %self.identity.login(), attempt, error = %e, "reconnect attempt failed");
                }
            }

            if self.settings.reconnect.is_exhausted(attempt) {
                self.writer.lock().await.take();
                *self.state.write() = TransportState::Disconnected;
                return Err(ListenError::ReconnectExhausted { attempts: attempt });
            }

            tokio::select! {
                biased;
                () = token.cancelled() => return Ok(Recovery::Cancelled),
                () = tokio::time::sleep(self.settings.reconnect.delay()) => {}
            }
        }
    }

    /// Dial, authenticate and rejoin. The write lock is held from handshake
    /// through rejoin so membership cannot change under the snapshot.
    async fn reestablish(
        &self,
        token: &CancellationToken,
    ) -> Result<Box<dyn LineStream>, TransportError> {
        let Link { sink, stream } = tokio::select! {
            biased;
            () = token.cancelled() => return Err(TransportError::Closed),
            link = self.dialer.dial(&self.settings.url) => link?,
        };

        let mut writer = self.writer.lock().await;
        if token.is_cancelled() {
            return Err(TransportError::Closed);
        }
        *writer = Some(sink);

        let result = self.rejoin_all(&mut writer, token).await;
        if result.is_err() {
            writer.take();
        }
        result.map(|()| stream)
    }

    async fn rejoin_all(
        &self,
        writer: &mut Writer,
        token: &CancellationToken,
    ) -> Result<(), TransportError> {
        self.handshake(writer, token).await?;
        let channels = self.channels.read().all();
        if !channels.is_empty() {
            debug!(count = channels.len(), "rejoining channels");
            write_line(writer, &outbound::join_line(&channels), token).await?;
        }
        Ok(())
    }
}

/// Write one line, giving up as soon as the session is closed.
async fn write_line(
    writer: &mut Writer,
    line: &str,
    token: &CancellationToken,
) -> Result<(), TransportError> {
    let sink = writer.as_mut().ok_or(TransportError::Closed)?;
    trace!(command = outbound::verb(line), "write");
    tokio::select! {
        biased;
        () = token.cancelled() => Err(TransportError::Closed),
        result = sink.send_line(line) => result,
    }
}
