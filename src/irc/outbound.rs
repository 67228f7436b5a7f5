//! Outbound protocol lines.
//!
//! Lines carry no terminator; the WebSocket transport frames each one.

use super::identity::Identity;
use super::parse::CHANNEL_SIGIL;

/// The lines written right after dialing, in order: capability request,
/// credential, login.
pub fn handshake_lines(identity: &Identity, capabilities: &[String]) -> Vec<String> {
    let mut lines = Vec::with_capacity(3);
    if !capabilities.is_empty() {
        lines.push(format!("CAP REQ :{}", capabilities.join(" ")));
    }
    lines.push(format!("PASS {}", identity.credential().pass_value()));
    lines.push(format!("NICK {}", identity.login()));
    lines
}

/// One batched `JOIN` naming every channel.
pub fn join_line<S: AsRef<str>>(channels: &[S]) -> String {
    let targets: Vec<String> = channels
        .iter()
        .map(|c| format!("{}{}", CHANNEL_SIGIL, c.as_ref()))
        .collect();
    format!("JOIN {}", targets.join(","))
}

pub fn part_line(channel: &str) -> String {
    format!("PART {}{}", CHANNEL_SIGIL, channel)
}

pub fn privmsg_line(channel: &str, text: &str) -> String {
    // No line injection through the message body
    let clean = text.replace(['\r', '\n'], " ");
    format!("PRIVMSG {}{} :{}", CHANNEL_SIGIL, channel, clean)
}

pub fn pong_line(token: &str) -> String {
    format!("PONG :{}", token)
}

/// Command verb of an outbound line, for logging without leaking arguments.
pub fn verb(line: &str) -> &str {
    line.split(' ').next().unwrap_or_default()
}
