//! Credential strategy selection and resolution.
//!
//! [`CredentialResolver`] turns a validated [`ProviderConfig`] into
//! [`Credentials`] ready for the connection manager:
//!
//! - `Static`: the configured user (normalized) and password.
//! - `Temporary`: caller identity → minted cluster credentials.
//! - `TemporaryAssumeRole`: caller identity → AssumeRole → minted cluster
//!   credentials signed with the assumed session.
//!
//! Each stage reports its own error kind, so an unreachable identity service
//! ([`ProviderError::Authentication`]) is never confused with a rejected
//! database login.

use std::sync::Arc;

use tracing::{info, warn};

use redshift_core::{
    normalize_username, AttemptState, ConnectAttempt, CredentialSource, Credentials, Deadline,
    ProviderConfig, ProviderError, ResolvedIdentity, Stage, TemporaryCredentialsConfig,
};

use crate::aws::AwsSdkLoader;
use crate::generator::TemporaryCredentialsGenerator;
use crate::identity::{validate_identity, IdentityClient};
use crate::issuer::{ClusterCredentialsIssuer, RedshiftCredentialsIssuer};
use crate::sts::StsIdentityClient;

#[derive(Clone)]
pub struct CredentialResolver {
    identity: Arc<dyn IdentityClient>,
    generator: TemporaryCredentialsGenerator,
}

impl CredentialResolver {
    pub fn new(
        identity: Arc<dyn IdentityClient>,
        issuer: Arc<dyn ClusterCredentialsIssuer>,
    ) -> Self {
        Self {
            identity,
            generator: TemporaryCredentialsGenerator::new(issuer),
        }
    }

    /// Resolver backed by AWS STS and Redshift, using the region from the
    /// temporary credentials block when one is configured.
    pub fn aws(config: &ProviderConfig) -> Self {
        let region = match &config.credentials {
            CredentialSource::Temporary(t) => t.region.clone(),
            CredentialSource::Static { .. } => None,
        };
        let sdk = Arc::new(AwsSdkLoader::new(region));
        Self::new(
            Arc::new(StsIdentityClient::new(sdk.clone())),
            Arc::new(RedshiftCredentialsIssuer::new(sdk)),
        )
    }

    /// Resolve credentials with a fresh attempt record and the configured timeout.
    pub async fn resolve(&self, config: &ProviderConfig) -> Result<Credentials, ProviderError> {
        let mut attempt = ConnectAttempt::new();
        let deadline = Deadline::after(config.connect_timeout);
        self.resolve_tracked(config, &mut attempt, &deadline).await
    }

    /// Resolve credentials, recording progress in `attempt`.
    pub async fn resolve_tracked(
        &self,
        config: &ProviderConfig,
        attempt: &mut ConnectAttempt,
        deadline: &Deadline,
    ) -> Result<Credentials, ProviderError> {
        attempt.advance(AttemptState::CredentialsResolved);
        let result = match &config.credentials {
            CredentialSource::Static { username, password } => Ok(Credentials {
                host: config.host.clone(),
                port: config.port,
                database: config.database.clone(),
                username: normalize_username(username),
                password: password.clone(),
                ssl_mode: config.ssl_mode,
                strategy: config.strategy(),
                expires_at: None,
            }),
            CredentialSource::Temporary(temporary) => {
                self.resolve_temporary(config, temporary, attempt, deadline).await
            }
        };

        match &result {
            Ok(creds) => info!(
                strategy = %creds.strategy,
                username = %creds.username,
                host = %creds.host,
                "Credentials resolved"
            ),
            Err(e) => {
                warn!(stage = %e.stage(), error = %e, "Credential resolution failed");
                attempt.fail(e.stage());
            }
        }
        result
    }

    async fn resolve_temporary(
        &self,
        config: &ProviderConfig,
        temporary: &TemporaryCredentialsConfig,
        attempt: &mut ConnectAttempt,
        deadline: &Deadline,
    ) -> Result<Credentials, ProviderError> {
        let identity = self.resolve_identity(temporary, deadline).await?;
        attempt.advance(AttemptState::IdentityResolved);

        let minted = self
            .generator
            .generate(&identity, temporary, &config.database, deadline)
            .await?;
        attempt.advance(AttemptState::CredentialsMinted);

        Ok(Credentials {
            host: config.host.clone(),
            port: config.port,
            database: config.database.clone(),
            username: minted.username,
            password: minted.password,
            ssl_mode: config.ssl_mode,
            strategy: config.strategy(),
            expires_at: minted.expiry,
        })
    }

    /// Caller identity, then AssumeRole when an ARN is configured.
    async fn resolve_identity(
        &self,
        temporary: &TemporaryCredentialsConfig,
        deadline: &Deadline,
    ) -> Result<ResolvedIdentity, ProviderError> {
        let caller = deadline
            .run(
                Stage::Authentication,
                "GetCallerIdentity",
                self.identity.get_caller_identity(),
            )
            .await?;
        let caller = validate_identity(caller, "GetCallerIdentity", false)?;
        info!(arn = %caller.arn, account = ?caller.account, "Resolved caller identity");

        let Some(role) = &temporary.assume_role else {
            return Ok(caller);
        };

        let assumed = deadline
            .run(Stage::Authentication, "AssumeRole", self.identity.assume_role(role))
            .await?;
        let assumed = validate_identity(assumed, "AssumeRole", true)?;
        info!(
            role_arn = %role.arn,
            assumed_arn = %assumed.arn,
            "Assumed role for temporary credentials"
        );
        Ok(assumed)
    }
}
