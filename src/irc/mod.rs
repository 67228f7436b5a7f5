//! Chat protocol core: line parsing, channel membership, the self-healing
//! transport session and per-channel dispatch.

pub mod client;
pub mod dispatch;
pub mod error;
pub mod factory;
pub mod identity;
pub mod membership;
pub mod outbound;
pub mod parse;
pub mod reconnect;
pub mod session;
pub mod transport;

pub use client::ChatClient;
pub use dispatch::Dispatcher;
pub use error::{ClientError, ConnectError, ListenError, ParseError, SessionError, TransportError};
pub use factory::SessionFactory;
pub use identity::Identity;
pub use parse::{parse_line, ChatMessage};
pub use reconnect::ReconnectPolicy;
pub use session::{Session, SessionSettings, TransportState};
