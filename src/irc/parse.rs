//! Inbound line parser.
//!
//! Turns one raw protocol line of the form
//! `[@tags ][:prefix ]command[ param ...][ :trailing]` into a [`ChatMessage`].

use std::collections::HashMap;

use ::irc::proto::Message;

use super::error::ParseError;

/// Marks a parameter as a channel name rather than a user target.
pub const CHANNEL_SIGIL: char = '#';

/// One parsed inbound protocol line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatMessage {
    /// Target channel with the sigil stripped, or the raw first parameter for
    /// user-scoped targets. Empty when the line has no parameters.
    pub channel: String,
    pub command: String,
    /// Nickname from a user prefix. Empty for server-originated lines.
    pub author: String,
    /// Every parameter after the first, joined with single spaces.
    pub text: String,
    pub tags: HashMap<String, String>,
}

impl ChatMessage {
    /// Tag value by key, e.g. `display-name`.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// Parse a single protocol line.
///
/// Tags and the source nickname come from the `irc` crate's message parser;
/// command and parameters are split here so every verb keeps its raw
/// parameter list.
pub fn parse_line(raw: &str) -> Result<ChatMessage, ParseError> {
    let line = raw.trim_end_matches(['\r', '\n']).trim_start_matches(' ');
    if line.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let (command, params) = split_command(line);
    if command.is_empty() {
        return Err(ParseError::MissingCommand(line.to_string()));
    }

    let message = line
        .parse::<Message>()
        .map_err(|e| ParseError::Malformed(e.to_string()))?;
    let author = message.source_nickname().unwrap_or_default().to_string();
    let tags = message
        .tags
        .unwrap_or_default()
        .into_iter()
        .map(|tag| (tag.0, tag.1.unwrap_or_default()))
        .collect();

    let channel = match params.first() {
        Some(first) => first.strip_prefix(CHANNEL_SIGIL).unwrap_or(first).to_string(),
        None => String::new(),
    };
    let text = params.get(1..).map(|p| p.join(" ")).unwrap_or_default();

    Ok(ChatMessage {
        channel,
        command: command.to_string(),
        author,
        text,
        tags,
    })
}

/// Skip tags and prefix, then return the command and its parameters with the
/// trailing parameter kept verbatim.
fn split_command(line: &str) -> (&str, Vec<&str>) {
    let mut rest = line;
    if rest.starts_with('@') {
        rest = split_token(rest).1;
    }
    rest = rest.trim_start_matches(' ');
    if rest.starts_with(':') {
        rest = split_token(rest).1;
    }

    let (command, mut rest) = split_token(rest);
    let mut params = Vec::new();
    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            break;
        }
        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing);
            break;
        }
        let (param, tail) = split_token(rest);
        params.push(param);
        rest = tail;
    }
    (command, params)
}

/// Split off the next space-delimited token, skipping leading spaces.
fn split_token(input: &str) -> (&str, &str) {
    let input = input.trim_start_matches(' ');
    match input.find(' ') {
        Some(idx) => (&input[..idx], &input[idx + 1..]),
        None => (input, ""),
    }
}
