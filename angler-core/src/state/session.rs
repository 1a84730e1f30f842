//! Session phase tracking.
//!
//! Separate from [`ConnectionStatus`](super::ConnectionStatus): the
//! link can be up while the server still waits for credentials.

/// Where the session stands with respect to authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Not connected.
    #[default]
    Idle,
    /// Link is up; the server has not accepted credentials yet.
    AwaitingCredential,
    /// Authenticated; the action loop may run.
    Active,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::AwaitingCredential => write!(f, "AwaitingCredential"),
            Self::Active => write!(f, "Active"),
        }
    }
}

impl SessionPhase {
    /// Transport came up. A session that authenticated before resumes
    /// straight into `Active`.
    pub fn on_connected(&mut self, authenticated_before: bool) {
        *self = if authenticated_before {
            Self::Active
        } else {
            Self::AwaitingCredential
        };
    }

    /// The invitation code was sent.
    pub fn on_credential_sent(&mut self) {
        *self = Self::Active;
    }

    pub fn on_disconnected(&mut self) {
        *self = Self::Idle;
    }
}
