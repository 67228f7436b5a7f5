//! Channels a session intends to be joined to.
//!
//! Names are matched byte-for-byte; no case folding or sigil handling happens
//! here.

use std::collections::HashSet;

#[derive(Debug, Default, Clone)]
pub struct ChannelSet {
    channels: HashSet<String>,
}

impl ChannelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, channel: &str) {
        self.channels.insert(channel.to_string());
    }

    /// Returns `true` if the channel was present.
    pub fn remove(&mut self, channel: &str) -> bool {
        self.channels.remove(channel)
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.channels.contains(channel)
    }

    /// Snapshot of every channel, sorted so rejoin requests are deterministic.
    pub fn all(&self) -> Vec<String> {
        let mut all: Vec<String> = self.channels.iter().cloned().collect();
        all.sort();
        all
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
