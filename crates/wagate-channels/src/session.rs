//! Session lifecycle state machine.
//!
//! ```text
//! uninitialized ──qr──▶ qr-pending ──authenticated──▶ authenticated ──ready──▶ ready
//!       │                   │  ▲ qr                                             │
//!       │                   └──┘                                         disconnected
//!       │                   │                                                   ▼
//!       │                   └──auth_failure──▶ auth-failure               disconnected
//!       └──authenticated (restored session)──▶ authenticated
//! ```
//!
//! A disconnect triggers a full reconnect, after which the relay resets the
//! machine to `uninitialized`. A fresh QR from any state starts pairing over:
//! the client may restart its session on its own, without a disconnect.

use serde::Serialize;
use wagate_core::message::ClientEvent;

/// Where the session currently is.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Uninitialized,
    QrPending,
    Authenticated,
    Ready,
    AuthFailure,
    Disconnected,
}

impl SessionState {
    /// The state reached by applying `event`, or `None` if the transition is
    /// not part of the lifecycle. Inbound messages never change state.
    pub fn on(self, event: &ClientEvent) -> Option<SessionState> {
        use SessionState::*;
        match (self, event) {
            (_, ClientEvent::Qr { .. }) => Some(QrPending),
            (Uninitialized | QrPending, ClientEvent::Authenticated) => Some(Authenticated),
            (Authenticated, ClientEvent::Ready) => Some(Ready),
            (Uninitialized | QrPending, ClientEvent::AuthFailure { .. }) => Some(AuthFailure),
            (QrPending | Authenticated | Ready, ClientEvent::Disconnected { .. }) => {
                Some(Disconnected)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::QrPending => "qr-pending",
            Self::Authenticated => "authenticated",
            Self::Ready => "ready",
            Self::AuthFailure => "auth-failure",
            Self::Disconnected => "disconnected",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qr() -> ClientEvent {
        ClientEvent::Qr {
            code: "2@abc".into(),
        }
    }

    fn disconnected() -> ClientEvent {
        ClientEvent::Disconnected {
            reason: "NAVIGATION".into(),
        }
    }

    #[test]
    fn test_happy_path() {
        let s = SessionState::default();
        let s = s.on(&qr()).unwrap();
        assert_eq!(s, SessionState::QrPending);
        let s = s.on(&ClientEvent::Authenticated).unwrap();
        assert_eq!(s, SessionState::Authenticated);
        let s = s.on(&ClientEvent::Ready).unwrap();
        assert_eq!(s, SessionState::Ready);
        let s = s.on(&disconnected()).unwrap();
        assert_eq!(s, SessionState::Disconnected);
    }

    #[test]
    fn test_qr_rotation_stays_pending() {
        assert_eq!(
            SessionState::QrPending.on(&qr()),
            Some(SessionState::QrPending)
        );
    }

    #[test]
    fn test_new_qr_restarts_pairing_from_any_state() {
        for state in [
            SessionState::Authenticated,
            SessionState::Ready,
            SessionState::AuthFailure,
            SessionState::Disconnected,
        ] {
            assert_eq!(state.on(&qr()), Some(SessionState::QrPending), "{state}");
        }
    }

    #[test]
    fn test_restored_session_skips_qr() {
        assert_eq!(
            SessionState::Uninitialized.on(&ClientEvent::Authenticated),
            Some(SessionState::Authenticated)
        );
    }

    #[test]
    fn test_auth_failure_from_pending() {
        let ev = ClientEvent::AuthFailure {
            reason: "bad".into(),
        };
        assert_eq!(
            SessionState::QrPending.on(&ev),
            Some(SessionState::AuthFailure)
        );
        assert_eq!(SessionState::Ready.on(&ev), None);
    }

    #[test]
    fn test_rejected_transitions() {
        assert_eq!(SessionState::Uninitialized.on(&ClientEvent::Ready), None);
        assert_eq!(SessionState::Uninitialized.on(&disconnected()), None);
        assert_eq!(SessionState::AuthFailure.on(&ClientEvent::Ready), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(SessionState::QrPending.to_string(), "qr-pending");
        assert_eq!(SessionState::AuthFailure.as_str(), "auth-failure");
    }
}
