//! Self-healing chat client for IRC carried over WebSocket.
//!
//! [`irc::Session`] owns one connection: handshake, read loop, automatic
//! reconnect with channel rejoin. [`irc::ChatClient`] pairs an anonymous read
//! session with an authenticated write session and routes messages to
//! per-channel handlers.

pub mod config;
pub mod irc;
pub mod logging;
