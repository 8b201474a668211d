//! The client object handed to resource and data-source code.
//!
//! Every [`Client::connect`] is an independent attempt: credentials are
//! resolved (and minted, for temporary strategies) from scratch, and one
//! connection is opened under the configured connect timeout.

use futures::future::BoxFuture;
use tracing::warn;
use uuid::Uuid;

use redshift_auth::CredentialResolver;
use redshift_core::{
    AttemptState, ConnectAttempt, Credentials, Deadline, ProviderConfig, ProviderError,
};

use crate::connector::{Connector, PgConnector};
use crate::manager::{Connection, ConnectionManager};
use crate::namespace::read_namespace;

pub struct Client<C: Connector = PgConnector> {
    config: ProviderConfig,
    resolver: CredentialResolver,
    manager: ConnectionManager<C>,
}

impl Client<PgConnector> {
    /// Client backed by AWS STS/Redshift and a sqlx connection.
    pub fn new(config: ProviderConfig) -> Self {
        let resolver = CredentialResolver::aws(&config);
        Self::with_parts(config, resolver, PgConnector::default())
    }

    pub fn from_env() -> Result<Self, ProviderError> {
        ProviderConfig::from_env().map(Self::new)
    }
}

impl<C: Connector> Client<C> {
    pub fn with_parts(config: ProviderConfig, resolver: CredentialResolver, connector: C) -> Self {
        Self {
            config,
            resolver,
            manager: ConnectionManager::new(connector),
        }
    }

    pub fn manager(&self) -> &ConnectionManager<C> {
        &self.manager
    }

    /// Resolve credentials without connecting.
    pub async fn credentials(&self) -> Result<Credentials, ProviderError> {
        self.resolver.resolve(&self.config).await
    }

    pub async fn connect(&self) -> Result<Connection<C::Session>, ProviderError> {
        let mut attempt = ConnectAttempt::new();
        self.connect_tracked(&mut attempt).await
    }

    /// Like [`Client::connect`], recording each stage in `attempt`.
    pub async fn connect_tracked(
        &self,
        attempt: &mut ConnectAttempt,
    ) -> Result<Connection<C::Session>, ProviderError> {
        let deadline = Deadline::after(self.config.connect_timeout);
        let credentials = self
            .resolver
            .resolve_tracked(&self.config, attempt, &deadline)
            .await?;

        match self.manager.connect(&credentials, &deadline).await {
            Ok(connection) => {
                attempt.advance(AttemptState::Connected);
                Ok(connection)
            }
            Err(e) => {
                warn!(stage = %e.stage(), error = %e, "Connection attempt failed");
                attempt.fail(e.stage());
                Err(e)
            }
        }
    }

    /// Resolve, connect, run `body`, and close on every path.
    pub async fn with_connection<T, F>(&self, body: F) -> Result<T, ProviderError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut Connection<C::Session>) -> BoxFuture<'c, Result<T, ProviderError>>,
    {
        let mut attempt = ConnectAttempt::new();
        self.with_connection_tracked(&mut attempt, body).await
    }

    /// Like [`Client::with_connection`], recording each stage in `attempt`.
    pub async fn with_connection_tracked<T, F>(
        &self,
        attempt: &mut ConnectAttempt,
        body: F,
    ) -> Result<T, ProviderError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut Connection<C::Session>) -> BoxFuture<'c, Result<T, ProviderError>>,
    {
        let connection = self.connect_tracked(attempt).await?;
        self.manager.scoped(connection, body).await
    }

    /// Read the cluster namespace (`SELECT current_namespace`).
    pub async fn namespace(&self) -> Result<Uuid, ProviderError> {
        self.with_connection(|conn| Box::pin(read_namespace(conn))).await
    }
}
