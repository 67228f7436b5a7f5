use std::collections::BTreeSet;

/// What the terminal front end tracks between events.
#[derive(Debug, Default)]
pub struct AppState {
    /// Channel plain text is posted to; the most recently joined.
    pub current: Option<String>,
    pub followed: BTreeSet<String>,
    pub can_send: bool,
    /// Lines waiting to be printed.
    pub output: Vec<String>,
}

impl AppState {
    pub fn new(can_send: bool) -> Self {
        Self {
            can_send,
            ..Self::default()
        }
    }

    pub fn follow(&mut self, channel: &str) {
        self.followed.insert(channel.to_string());
        self.current = Some(channel.to_string());
    }

    pub fn unfollow(&mut self, channel: &str) {
        self.followed.remove(channel);
        if self.current.as_deref() == Some(channel) {
            self.current = self.followed.iter().next_back().cloned();
        }
    }

    pub fn system(&mut self, text: impl Into<String>) {
        self.output.push(format!("*** {}", text.into()));
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.output.push(format!("!!! {}", text.into()));
    }

    pub fn welcome(&mut self) {
        self.system("Connected. Type /help for commands.");
        if self.followed.is_empty() {
            self.system("Follow a channel with /join <channel>");
        } else {
            let list: Vec<&str> = self.followed.iter().map(String::as_str).collect();
            self.system(format!("Following: {}", list.join(", ")));
        }
        if !self.can_send {
            self.system("No account configured; chat is read-only.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unfollow_moves_current() {
        let mut state = AppState::new(true);
        state.follow("a");
        state.follow("b");
        assert_eq!(state.current.as_deref(), Some("b"));
        state.unfollow("b");
        assert_eq!(state.current.as_deref(), Some("a"));
        state.unfollow("a");
        assert_eq!(state.current, None);
    }

    #[test]
    fn test_welcome_mentions_read_only() {
        let mut state = AppState::new(false);
        state.welcome();
        assert!(state.output.iter().any(|l| l.contains("read-only")));
    }
}
