use std::sync::Arc;

use super::error::TransportError;
use super::identity::Identity;
use super::session::{Session, SessionSettings};
use super::transport::{Dialer, WsDialer};

/// Builds sessions that share one server, capability set and reconnect
/// policy.
#[derive(Clone)]
pub struct SessionFactory {
    settings: SessionSettings,
    dialer: Arc<dyn Dialer>,
}

impl SessionFactory {
    pub fn new(settings: SessionSettings, dialer: Arc<dyn Dialer>) -> Self {
        Self { settings, dialer }
    }

    /// Factory over real WebSocket connections.
    pub fn websocket(settings: SessionSettings) -> Self {
        Self::new(settings, Arc::new(WsDialer))
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Dial a new session bound to `identity`. Authentication happens on
    /// [`Session::connect`].
    pub async fn new_session(&self, identity: Identity) -> Result<Session, TransportError> {
        Session::open(identity, self.settings.clone(), self.dialer.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::irc::session::TransportState;
    use crate::irc::transport::mock::MockDialer;

    #[tokio::test]
    async fn test_sessions_are_bound_to_identity() {
        let dialer = MockDialer::new();
        let factory = SessionFactory::new(SessionSettings::default(), Arc::new(dialer.clone()));

        let reader = factory.new_session(Identity::anonymous()).await.unwrap();
        let writer = factory.new_session(Identity::new("me", "tok")).await.unwrap();
        assert!(reader.identity().is_anonymous());
        assert_eq!(writer.identity().login(), "me");
        assert_eq!(writer.state(), TransportState::Disconnected);
        assert_eq!(dialer.connections(), 2);

        writer.connect().await.unwrap();
        assert_eq!(dialer.written_on(1)[1], "PASS oauth:tok");
        assert!(dialer.written_on(0).is_empty());
    }

    #[tokio::test]
    async fn test_dial_error_is_returned() {
        let dialer = MockDialer::new();
        dialer.fail_next_dials(1);
        let factory = SessionFactory::new(SessionSettings::default(), Arc::new(dialer.clone()));
        assert!(factory.new_session(Identity::anonymous()).await.is_err());
        // no retry at this layer
        assert_eq!(dialer.dial_attempts(), 1);
    }
}
