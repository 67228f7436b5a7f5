//! Per-channel routing of inbound messages.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::parse::ChatMessage;

/// Callback invoked on the read loop for every message of one channel.
pub type Handler = Arc<dyn Fn(ChatMessage) + Send + Sync>;

/// Maps channel names to exactly one handler each.
#[derive(Default)]
pub struct Dispatcher {
    handlers: RwLock<HashMap<String, Handler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `channel`, replacing any previous one.
    pub fn register<F>(&self, channel: &str, handler: F)
    where
        F: Fn(ChatMessage) + Send + Sync + 'static,
    {
        self.handlers
            .write()
            .insert(channel.to_string(), Arc::new(handler));
    }

    /// Returns `true` if a handler was registered.
    pub fn unregister(&self, channel: &str) -> bool {
        self.handlers.write().remove(channel).is_some()
    }

    pub fn is_registered(&self, channel: &str) -> bool {
        self.handlers.read().contains_key(channel)
    }

    pub fn channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self.handlers.read().keys().cloned().collect();
        channels.sort();
        channels
    }

    /// Hand `msg` to its channel's handler. Messages for channels nobody
    /// follows are dropped; returns whether a handler ran.
    pub fn route(&self, msg: ChatMessage) -> bool {
        // Don't hold the lock while the handler runs; it may register or
        // unregister channels itself.
        let handler = self.handlers.read().get(&msg.channel).cloned();
        match handler {
            Some(handler) => {
                handler(msg);
                true
            }
            None => {
                debug!(channel = %msg.channel, command = %msg.command, "no handler for channel");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use super::*;
    use crate::irc::parse::parse_line;

    fn recorder() -> (Arc<Mutex<Vec<ChatMessage>>>, impl Fn(ChatMessage) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |msg| sink.lock().push(msg))
    }

    #[test]
    fn test_parse_and_route() {
        let dispatcher = Dispatcher::new();
        let (seen, handler) = recorder();
        dispatcher.register("bar", handler);

        let msg = parse_line(":user PRIVMSG #bar :hello").unwrap();
        assert!(dispatcher.route(msg));

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0],
            ChatMessage {
                channel: "bar".into(),
                command: "PRIVMSG".into(),
                author: "user".into(),
                text: "hello".into(),
                tags: Default::default(),
            }
        );
    }

    #[test]
    fn test_unknown_channel_dropped() {
        let dispatcher = Dispatcher::new();
        let (seen, handler) = recorder();
        dispatcher.register("bar", handler);

        let msg = parse_line(":user PRIVMSG #nobody :hello").unwrap();
        assert!(!dispatcher.route(msg));
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_second_register_replaces() {
        let dispatcher = Dispatcher::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let f = first.clone();
        dispatcher.register("bar", move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        });
        let s = second.clone();
        dispatcher.register("bar", move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });

        dispatcher.route(parse_line(":u PRIVMSG #bar :x").unwrap());
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.channels(), vec!["bar"]);
    }

    #[test]
    fn test_unregister() {
        let dispatcher = Dispatcher::new();
        let (seen, handler) = recorder();
        dispatcher.register("bar", handler);
        assert!(dispatcher.unregister("bar"));
        assert!(!dispatcher.unregister("bar"));
        assert!(!dispatcher.is_registered("bar"));
        assert!(!dispatcher.route(parse_line(":u PRIVMSG #bar :x").unwrap()));
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_handler_may_unregister_itself() {
        let dispatcher = Arc::new(Dispatcher::new());
        let d = dispatcher.clone();
        dispatcher.register("bar", move |msg| {
            d.unregister(&msg.channel);
        });
        assert!(dispatcher.route(parse_line(":u PRIVMSG #bar :bye").unwrap()));
        assert!(!dispatcher.is_registered("bar"));
    }
}
