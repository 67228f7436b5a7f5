use crate::app::action::Action;
use crate::app::commands::{self, ParsedCommand};
use crate::app::event::AppEvent;
use crate::app::state::AppState;
use chrono::Local;
use crabline::irc::ChatMessage;

pub fn handle_event(state: &mut AppState, event: AppEvent) -> Vec<Action> {
    match event {
        AppEvent::Chat(msg) => {
            let timestamp = Local::now().format("%H:%M").to_string();
            state.output.push(format_message(&msg, &timestamp));
            vec![]
        }
        AppEvent::Input(line) => handle_input(state, &line),
        AppEvent::InputClosed => vec![Action::Quit],
    }
}

fn handle_input(state: &mut AppState, line: &str) -> Vec<Action> {
    let line = line.trim();
    if line.is_empty() {
        return vec![];
    }

    if !line.starts_with('/') {
        return match state.current.clone() {
            Some(channel) => vec![Action::SendMessage {
                channel,
                text: line.to_string(),
            }],
            None => {
                state.error("Join a channel first with /join <channel>");
                vec![]
            }
        };
    }

    let Some(cmd) = commands::parse_command(line) else {
        state.error(format!("Unknown command or missing argument: {}", line));
        return vec![];
    };

    match cmd {
        ParsedCommand::Join { channel } => {
            let channel = normalize_channel(&channel);
            if state.followed.contains(&channel) {
                state.current = Some(channel.clone());
                state.system(format!("Now talking in #{}", channel));
                return vec![];
            }
            state.follow(&channel);
            state.system(format!("Following #{}", channel));
            vec![Action::Follow { channel }]
        }
        ParsedCommand::Part { channel } => {
            let channel = match channel.map(|c| normalize_channel(&c)).or_else(|| state.current.clone()) {
                Some(channel) => channel,
                None => {
                    state.error("No channel to leave");
                    return vec![];
                }
            };
            if !state.followed.contains(&channel) {
                state.error(format!("Not following #{}", channel));
                return vec![];
            }
            state.unfollow(&channel);
            state.system(format!("Stopped following #{}", channel));
            vec![Action::Unfollow { channel }]
        }
        ParsedCommand::Msg { channel, text } => vec![Action::SendMessage {
            channel: normalize_channel(&channel),
            text,
        }],
        ParsedCommand::Channels => {
            if state.followed.is_empty() {
                state.system("Not following any channels");
            } else {
                let list: Vec<String> = state
                    .followed
                    .iter()
                    .map(|c| {
                        if state.current.as_deref() == Some(c.as_str()) {
                            format!("#{} (current)", c)
                        } else {
                            format!("#{}", c)
                        }
                    })
                    .collect();
                state.system(format!("Following: {}", list.join(", ")));
            }
            vec![]
        }
        ParsedCommand::Help => {
            for line in commands::HELP {
                state.system(*line);
            }
            vec![]
        }
        ParsedCommand::Quit => vec![Action::Quit],
    }
}

/// `#Forsen` and `forsen` name the same channel.
pub fn normalize_channel(input: &str) -> String {
    let trimmed = input.trim();
    trimmed.strip_prefix('#').unwrap_or(trimmed).to_lowercase()
}

pub fn format_message(msg: &ChatMessage, timestamp: &str) -> String {
    if msg.command == "PRIVMSG" {
        let author = msg
            .tag("display-name")
            .filter(|name| !name.is_empty())
            .unwrap_or(msg.author.as_str());
        format!("[{}] #{} <{}> {}", timestamp, msg.channel, author, msg.text)
    } else if msg.text.is_empty() {
        format!("[{}] #{} -{}-", timestamp, msg.channel, msg.command)
    } else {
        format!("[{}] #{} -{}- {}", timestamp, msg.channel, msg.command, msg.text)
    }
}
