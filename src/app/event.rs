use crabline::irc::ChatMessage;

#[derive(Debug)]
pub enum AppEvent {
    /// A line typed by the user
    Input(String),
    /// Stdin reached EOF
    InputClosed,
    /// Message routed from a followed channel
    Chat(ChatMessage),
}
