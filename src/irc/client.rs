//! Chat controller pairing a read session with an optional write session.
//!
//! Followed channels are joined on an anonymous session whose messages are
//! routed through a [`Dispatcher`]. Posting goes through a second session
//! authenticated with the user's account, so the read side keeps working
//! without one.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, trace};

use super::dispatch::Dispatcher;
use super::error::ClientError;
use super::factory::SessionFactory;
use super::identity::Identity;
use super::parse::ChatMessage;
use super::session::Session;

pub struct ChatClient {
    factory: SessionFactory,
    account: Option<Identity>,
    dispatcher: Arc<Dispatcher>,
    reader: Option<Arc<Session>>,
    writer: Option<Arc<Session>>,
    tasks: Vec<JoinHandle<()>>,
}

impl ChatClient {
    pub fn new(factory: SessionFactory, account: Option<Identity>) -> Self {
        Self {
            factory,
            account,
            dispatcher: Arc::new(Dispatcher::new()),
            reader: None,
            writer: None,
            tasks: Vec::new(),
        }
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        self.dispatcher.clone()
    }

    pub fn has_account(&self) -> bool {
        self.account.is_some()
    }

    /// Open both sessions, join every followed channel and start listening.
    ///
    /// Either both sessions come up or neither is kept, so a failed start
    /// can simply be retried.
    pub async fn start(&mut self) -> Result<(), ClientError> {
        if self.reader.is_some() {
            return Ok(());
        }

        let reader = self.open_session(Identity::anonymous()).await?;
        let followed = self.dispatcher.channels();
        if let Err(e) = reader.join(followed.as_slice()).await {
            reader.close().await;
            return Err(e.into());
        }

        let writer = match self.account.clone() {
            Some(account) => match self.open_session(account).await {
                Ok(writer) => Some(writer),
                Err(e) => {
                    reader.close().await;
                    return Err(e);
                }
            },
            None => None,
        };

        let dispatcher = self.dispatcher.clone();
        self.tasks.push(spawn_listener(reader.clone(), move |msg| {
            dispatcher.route(msg);
        }));
        self.reader = Some(reader);

        if let Some(writer) = writer {
            // Only keeps keepalives answered and the session self-healing.
            self.tasks.push(spawn_listener(writer.clone(), |msg| {
                trace!(command = %msg.command, "ignoring message on write session");
            }));
            self.writer = Some(writer);
        }

        info!(channels = followed.len(), "chat client started");
        Ok(())
    }

    /// Route `channel`'s messages to `handler`, joining it if the client is
    /// running. A failed join leaves the channel unfollowed.
    pub async fn follow<F>(&self, channel: &str, handler: F) -> Result<(), ClientError>
    where
        F: Fn(ChatMessage) + Send + Sync + 'static,
    {
        self.dispatcher.register(channel, handler);
        if let Some(reader) = self.reader.as_ref().filter(|r| r.is_connected()) {
            if !reader.is_joined(channel) {
                if let Err(e) = reader.join(&[channel]).await {
                    self.dispatcher.unregister(channel);
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }

    pub async fn unfollow(&self, channel: &str) -> Result<(), ClientError> {
        self.dispatcher.unregister(channel);
        if let Some(reader) = self.reader.as_ref().filter(|r| r.is_connected()) {
            if reader.is_joined(channel) {
                reader.part(channel).await?;
            }
        }
        Ok(())
    }

    pub async fn send_message(&self, channel: &str, text: &str) -> Result<(), ClientError> {
        if self.account.is_none() {
            return Err(ClientError::NoAccount);
        }
        let writer = self.writer.as_ref().ok_or(ClientError::NotStarted)?;
        writer.send(channel, text).await?;
        Ok(())
    }

    pub fn is_channel_joined(&self, channel: &str) -> bool {
        self.reader
            .as_ref()
            .is_some_and(|r| r.is_connected() && r.is_joined(channel))
    }

    /// Close both sessions and wait for their read loops to finish.
    pub async fn shutdown(&mut self) {
        for session in [self.reader.take(), self.writer.take()].into_iter().flatten() {
            session.close().await;
        }
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                error!(error = %e, "listen task panicked");
            }
        }
    }

    async fn open_session(&self, identity: Identity) -> Result<Arc<Session>, ClientError> {
        let session = self
            .factory
            .new_session(identity)
            .await
            .map_err(ClientError::Dial)?;
        session.connect().await?;
        Ok(Arc::new(session))
    }
}

fn spawn_listener<F>(session: Arc<Session>, on_message: F) -> JoinHandle<()>
where
    F: FnMut(ChatMessage) + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = session.listen(on_message).await {
            error!(login = %session.identity().login(), error = %e, "listen loop ended");
        }
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::*;
    use crate::irc::reconnect::ReconnectPolicy;
    use crate::irc::session::SessionSettings;
    use crate::irc::transport::mock::MockDialer;

    fn factory(dialer: &MockDialer) -> SessionFactory {
        let settings = SessionSettings {
            url: "ws://test".to_string(),
            reconnect: ReconnectPolicy::fixed(Duration::from_millis(5)),
            ..SessionSettings::default()
        };
        SessionFactory::new(settings, Arc::new(dialer.clone()))
    }

    async fn wait_until(mut cond: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !cond() {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_start_joins_followed_channels_anonymously() {
        let dialer = MockDialer::new();
        let mut client = ChatClient::new(factory(&dialer), None);
        client.follow("foo", |_| {}).await.unwrap();
        client.follow("bar", |_| {}).await.unwrap();
        assert!(!client.is_channel_joined("foo"));
        assert!(dialer.written().is_empty());

        client.start().await.unwrap();
        let lines = dialer.written_on(0);
        assert_eq!(lines[1], "PASS SCHMOOPIIE");
        assert!(lines[2].starts_with("NICK justinfan"));
        assert_eq!(lines[3], "JOIN #bar,#foo");
        assert!(client.is_channel_joined("foo"));
        assert_eq!(dialer.connections(), 1);

        client.shutdown().await;
        assert!(!client.is_channel_joined("foo"));
    }

    #[tokio::test]
    async fn test_messages_reach_followed_channel() {
        let dialer = MockDialer::new();
        let mut client = ChatClient::new(factory(&dialer), None);
        client.start().await.unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        client
            .follow("bar", move |msg| sink.lock().push(msg))
            .await
            .unwrap();
        assert_eq!(dialer.written_on(0).last().map(String::as_str), Some("JOIN #bar"));

        dialer.push_line(0, ":user PRIVMSG #other :ignored");
        dialer.push_line(0, ":user PRIVMSG #bar :hello");
        wait_until(|| !seen.lock().is_empty()).await;

        let seen_now = seen.lock().clone();
        assert_eq!(seen_now.len(), 1);
        assert_eq!(seen_now[0].author, "user");
        assert_eq!(seen_now[0].text, "hello");

        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_unfollow_parts() {
        let dialer = MockDialer::new();
        let mut client = ChatClient::new(factory(&dialer), None);
        client.follow("foo", |_| {}).await.unwrap();
        client.start().await.unwrap();

        client.unfollow("foo").await.unwrap();
        assert!(!client.is_channel_joined("foo"));
        assert!(!client.dispatcher().is_registered("foo"));
        assert_eq!(dialer.written_on(0).last().map(String::as_str), Some("PART #foo"));

        // unfollowing twice is harmless
        client.unfollow("foo").await.unwrap();
        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_send_requires_account() {
        let dialer = MockDialer::new();
        let mut client = ChatClient::new(factory(&dialer), None);
        client.start().await.unwrap();
        assert!(matches!(
            client.send_message("foo", "hi").await,
            Err(ClientError::NoAccount)
        ));
        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_send_before_start() {
        let dialer = MockDialer::new();
        let client = ChatClient::new(factory(&dialer), Some(Identity::new("me", "tok")));
        assert!(matches!(
            client.send_message("foo", "hi").await,
            Err(ClientError::NotStarted)
        ));
    }

    #[tokio::test]
    async fn test_send_goes_through_write_session() {
        let dialer = MockDialer::new();
        let mut client = ChatClient::new(factory(&dialer), Some(Identity::new("me", "tok")));
        client.start().await.unwrap();
        assert_eq!(dialer.connections(), 2);
        assert_eq!(dialer.written_on(1)[1], "PASS oauth:tok");

        client.send_message("foo", "hello chat").await.unwrap();
        assert_eq!(
            dialer.written_on(1).last().map(String::as_str),
            Some("PRIVMSG #foo :hello chat")
        );
        assert!(!dialer.written_on(0).iter().any(|l| l.starts_with("PRIVMSG")));

        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_failed_follow_is_not_registered() {
        let dialer = MockDialer::new();
        let mut client = ChatClient::new(factory(&dialer), None);
        client.start().await.unwrap();

        // link stays down while the read loop keeps redialing
        dialer.fail_next_dials(usize::MAX);
        dialer.break_connection(0);
        wait_until(|| dialer.dial_attempts() >= 2).await;

        assert!(client.follow("bar", |_| {}).await.is_err());
        assert!(!client.dispatcher().is_registered("bar"));
        assert!(!client.is_channel_joined("bar"));

        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_failed_write_session_can_restart() {
        let dialer = MockDialer::new();
        dialer.fail_dial_at(1);
        let mut client = ChatClient::new(factory(&dialer), Some(Identity::new("me", "tok")));
        client.follow("foo", |_| {}).await.unwrap();

        assert!(matches!(client.start().await, Err(ClientError::Dial(_))));
        assert!(!client.is_channel_joined("foo"));
        assert!(dialer.is_closed(0));
        assert!(matches!(
            client.send_message("foo", "hi").await,
            Err(ClientError::NotStarted)
        ));

        client.start().await.unwrap();
        assert_eq!(dialer.connections(), 3);
        assert!(client.is_channel_joined("foo"));
        client.send_message("foo", "hi").await.unwrap();
        assert_eq!(
            dialer.written_on(2).last().map(String::as_str),
            Some("PRIVMSG #foo :hi")
        );

        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_read_session_recovers() {
        let dialer = MockDialer::new();
        let mut client = ChatClient::new(factory(&dialer), None);
        client.follow("foo", |_| {}).await.unwrap();
        client.start().await.unwrap();

        dialer.break_connection(0);
        wait_until(|| dialer.written_on(1).len() == 4).await;
        assert_eq!(dialer.written_on(1)[3], "JOIN #foo");
        assert!(client.is_channel_joined("foo"));

        client.shutdown().await;
    }
}
