//! User slash-command parser.
//!
//! Parses `/command arg1 arg2 ...` input lines into typed [`ParsedCommand`]
//! values that the event handler can act on.

/// A parsed user command. Each variant corresponds to a `/command`.
#[derive(Debug, PartialEq, Eq)]
pub enum ParsedCommand {
    Join { channel: String },
    Part { channel: Option<String> },
    Msg { channel: String, text: String },
    Channels,
    Help,
    Quit,
}

/// Parse a slash-command string into a [`ParsedCommand`].
///
/// Returns `None` if the input does not start with `/`, is not a recognized
/// command, or lacks a required argument. Commands are case-insensitive.
pub fn parse_command(input: &str) -> Option<ParsedCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let (cmd, args) = match rest.split_once(char::is_whitespace) {
        Some((cmd, args)) => (cmd, args.trim()),
        None => (rest, ""),
    };

    match cmd.to_lowercase().as_str() {
        "join" | "j" => {
            let channel = args.split_whitespace().next()?.to_string();
            Some(ParsedCommand::Join { channel })
        }
        "part" | "leave" => {
            let channel = args.split_whitespace().next().map(str::to_string);
            Some(ParsedCommand::Part { channel })
        }
        "msg" | "say" => {
            let (channel, text) = args.split_once(char::is_whitespace)?;
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            Some(ParsedCommand::Msg {
                channel: channel.to_string(),
                text: text.to_string(),
            })
        }
        "channels" | "list" => Some(ParsedCommand::Channels),
        "help" | "?" => Some(ParsedCommand::Help),
        "quit" | "exit" => Some(ParsedCommand::Quit),
        _ => None,
    }
}

pub const HELP: &[&str] = &[
    "/join <channel>        follow a channel and make it current",
    "/part [channel]        stop following (default: current channel)",
    "/msg <channel> <text>  post to a channel",
    "/channels              list followed channels",
    "/quit                  exit",
    "Anything else is posted to the current channel.",
];
