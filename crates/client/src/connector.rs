//! Database driver seam and its sqlx/Postgres-wire implementation.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgSslMode};
use sqlx::{ConnectOptions, Connection as _};
use tracing::debug;

use redshift_core::{Credentials, ProviderError, SslMode};

/// An open database session.
#[async_trait]
pub trait Session: Send {
    /// Run `sql` and return the first column of the first row, if any.
    async fn query_scalar(&mut self, sql: &str) -> Result<Option<String>, ProviderError>;

    /// Terminate the session on the server.
    async fn close(self) -> Result<(), ProviderError>;
}

/// Opens one session per call. No pooling.
#[async_trait]
pub trait Connector: Send + Sync {
    type Session: Session;

    /// Implementations report every dial or handshake failure as
    /// [`ProviderError::Connection`] and must not leak a half-open session.
    async fn open(&self, credentials: &Credentials) -> Result<Self::Session, ProviderError>;
}

// ── sqlx ──────────────────────────────────────────────────────

pub const DEFAULT_APPLICATION_NAME: &str = "redshift-provider";

#[derive(Debug, Clone)]
pub struct PgConnector {
    application_name: String,
}

impl Default for PgConnector {
    fn default() -> Self {
        Self {
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
        }
    }
}

impl PgConnector {
    /// Connection options for `credentials`. Ignores `~/.pgpass` so only the
    /// resolved password is ever used.
    pub fn options(&self, credentials: &Credentials) -> PgConnectOptions {
        PgConnectOptions::new_without_pgpass()
            .host(&credentials.host)
            .port(credentials.port)
            .username(&credentials.username)
            .password(&credentials.password)
            .database(&credentials.database)
            .ssl_mode(pg_ssl_mode(credentials.ssl_mode))
            .application_name(&self.application_name)
    }
}

fn pg_ssl_mode(mode: SslMode) -> PgSslMode {
    match mode {
        SslMode::Disable => PgSslMode::Disable,
        SslMode::Require => PgSslMode::Require,
        SslMode::VerifyCa => PgSslMode::VerifyCa,
        SslMode::VerifyFull => PgSslMode::VerifyFull,
    }
}

pub struct PgSession {
    conn: PgConnection,
}

#[async_trait]
impl Connector for PgConnector {
    type Session = PgSession;

    async fn open(&self, credentials: &Credentials) -> Result<PgSession, ProviderError> {
        debug!(
            host = %credentials.host,
            port = credentials.port,
            database = %credentials.database,
            username = %credentials.username,
            "Opening database connection"
        );
        let conn = self.options(credentials).connect().await.map_err(|e| {
            ProviderError::connection(format!(
                "connect to {}:{}/{} as {} failed: {e}",
                credentials.host, credentials.port, credentials.database, credentials.username
            ))
        })?;
        Ok(PgSession { conn })
    }
}

#[async_trait]
impl Session for PgSession {
    async fn query_scalar(&mut self, sql: &str) -> Result<Option<String>, ProviderError> {
        sqlx::query_scalar::<_, Option<String>>(sql)
            .fetch_optional(&mut self.conn)
            .await
            .map(Option::flatten)
            .map_err(|e| ProviderError::Query(format!("{sql}: {e}")))
    }

    async fn close(self) -> Result<(), ProviderError> {
        self.conn
            .close()
            .await
            .map_err(|e| ProviderError::connection(format!("closing connection failed: {e}")))
    }
}
