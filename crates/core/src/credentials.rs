//! Values produced while resolving credentials for one connection attempt.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::config::{SslMode, Strategy};
use crate::error::Stage;

/// AWS session credentials obtained through AssumeRole.
#[derive(Clone, PartialEq)]
pub struct SessionCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    pub expiration: Option<DateTime<Utc>>,
}

impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Identity returned by the identity service. Lives for one attempt only.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedIdentity {
    pub arn: String,
    pub account: Option<String>,
    pub user_id: Option<String>,
    /// Present when the identity came from AssumeRole; the credential
    /// issuing call must then be signed with these instead of the default chain.
    pub session: Option<SessionCredentials>,
}

impl ResolvedIdentity {
    pub fn is_assumed(&self) -> bool {
        self.session.is_some()
    }
}

/// Short-lived, cluster-scoped database login. Minted fresh per attempt.
#[derive(Clone, PartialEq)]
pub struct TemporaryCredential {
    pub username: String,
    pub password: String,
    pub expiry: Option<DateTime<Utc>>,
}

impl fmt::Debug for TemporaryCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporaryCredential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("expiry", &self.expiry)
            .finish()
    }
}

/// Everything needed to open a database connection.
#[derive(Clone, PartialEq, Serialize)]
pub struct Credentials {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    #[serde(skip)]
    pub password: String,
    pub ssl_mode: SslMode,
    pub strategy: Strategy,
    pub expires_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("ssl_mode", &self.ssl_mode)
            .field("strategy", &self.strategy)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

// ── Attempt state machine ─────────────────────────────────────

/// Progress of a single connection attempt.
///
/// `Unresolved → CredentialsResolved → (IdentityResolved →)? CredentialsMinted
/// → Connected | Failed(stage)`. The static strategy goes straight from
/// `CredentialsResolved` to `Connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttemptState {
    Unresolved,
    CredentialsResolved,
    IdentityResolved,
    CredentialsMinted,
    Connected,
    Failed(Stage),
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Connected | Self::Failed(_))
    }

    fn allows(&self, next: AttemptState) -> bool {
        use AttemptState::*;
        match (self, next) {
            (Connected | Failed(_), _) => false,
            (_, Failed(_)) => true,
            (Unresolved, CredentialsResolved) => true,
            (CredentialsResolved, IdentityResolved | CredentialsMinted | Connected) => true,
            (IdentityResolved, CredentialsMinted) => true,
            (CredentialsMinted, Connected) => true,
            _ => false,
        }
    }
}

/// Records the transitions of one attempt and logs them.
#[derive(Debug, Clone)]
pub struct ConnectAttempt {
    state: AttemptState,
    history: Vec<AttemptState>,
}

impl Default for ConnectAttempt {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectAttempt {
    pub fn new() -> Self {
        Self {
            state: AttemptState::Unresolved,
            history: vec![AttemptState::Unresolved],
        }
    }

    pub fn state(&self) -> AttemptState {
        self.state
    }

    pub fn history(&self) -> &[AttemptState] {
        &self.history
    }

    /// Move to `next`. Out-of-order transitions are ignored and logged; the
    /// state machine never moves backwards or out of a terminal state.
    pub fn advance(&mut self, next: AttemptState) {
        if !self.state.allows(next) {
            debug!(from = ?self.state, to = ?next, "ignoring invalid attempt transition");
            return;
        }
        debug!(from = ?self.state, to = ?next, "connection attempt transition");
        self.state = next;
        self.history.push(next);
    }

    pub fn fail(&mut self, stage: Stage) {
        self.advance(AttemptState::Failed(stage));
    }
}
