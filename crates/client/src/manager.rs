use std::panic::AssertUnwindSafe;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, info, warn};

use redshift_core::{Credentials, Deadline, ProviderError, Stage, Strategy};

use crate::connector::{Connector, Session};

/// An open database connection owned exclusively by its holder.
///
/// Release it with [`Connection::close`]. Dropping it without closing still
/// tears down the socket, but skips the orderly server-side termination and
/// logs a warning.
pub struct Connection<S: Session> {
    session: Option<S>,
    username: String,
    host: String,
    strategy: Strategy,
    expires_at: Option<DateTime<Utc>>,
}

impl<S: Session> Connection<S> {
    fn new(session: S, credentials: &Credentials) -> Self {
        Self {
            session: Some(session),
            username: credentials.username.clone(),
            host: credentials.host.clone(),
            strategy: credentials.strategy,
            expires_at: credentials.expires_at,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// When the temporary login used for this connection stops being valid
    /// for new logins. `None` for static credentials.
    pub fn credentials_expire_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub async fn query_scalar(&mut self, sql: &str) -> Result<Option<String>, ProviderError> {
        match self.session.as_mut() {
            Some(session) => session.query_scalar(sql).await,
            None => Err(ProviderError::connection("connection already closed")),
        }
    }

    pub async fn close(mut self) -> Result<(), ProviderError> {
        match self.session.take() {
            Some(session) => {
                debug!(host = %self.host, username = %self.username, "Closing database connection");
                session.close().await
            }
            None => Ok(()),
        }
    }
}

impl<S: Session> Drop for Connection<S> {
    fn drop(&mut self) {
        if self.session.is_some() {
            warn!(
                host = %self.host,
                username = %self.username,
                "Database connection dropped without close"
            );
        }
    }
}

/// Opens and releases single connections.
pub struct ConnectionManager<C: Connector> {
    connector: C,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    /// Open exactly one connection. On failure nothing is left open: a dial
    /// cut short by the deadline drops its half-open session.
    pub async fn connect(
        &self,
        credentials: &Credentials,
        deadline: &Deadline,
    ) -> Result<Connection<C::Session>, ProviderError> {
        let session = deadline
            .run(Stage::Connection, "database connect", self.connector.open(credentials))
            .await?;
        info!(
            host = %credentials.host,
            username = %credentials.username,
            strategy = %credentials.strategy,
            "Database connection established"
        );
        Ok(Connection::new(session, credentials))
    }

    pub async fn close(&self, connection: Connection<C::Session>) -> Result<(), ProviderError> {
        connection.close().await
    }

    /// Run `body` with `connection` and close it again.
    ///
    /// The connection is closed exactly once whether `body` succeeds, fails
    /// or panics; a panic is resumed after the close. An error from `body`
    /// takes precedence over an error from closing.
    pub async fn scoped<T, F>(
        &self,
        mut connection: Connection<C::Session>,
        body: F,
    ) -> Result<T, ProviderError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut Connection<C::Session>) -> BoxFuture<'c, Result<T, ProviderError>>,
    {
        let outcome = AssertUnwindSafe(body(&mut connection)).catch_unwind().await;
        let closed = connection.close().await;

        match outcome {
            Err(panic) => std::panic::resume_unwind(panic),
            Ok(Err(e)) => {
                if let Err(close_err) = closed {
                    warn!(error = %close_err, "Closing connection after failure also failed");
                }
                Err(e)
            }
            Ok(Ok(value)) => closed.map(|_| value),
        }
    }
}
