use std::sync::Arc;

use tracing::info;

use redshift_core::{
    normalize_username, Deadline, ProviderError, ResolvedIdentity, Stage, TemporaryCredential,
    TemporaryCredentialsConfig,
};

use crate::issuer::{ClusterCredentialsIssuer, ClusterCredentialsRequest};

/// Mints a fresh cluster-scoped login for every connection attempt.
///
/// Nothing is cached: two attempts always produce two calls to the issuer.
#[derive(Clone)]
pub struct TemporaryCredentialsGenerator {
    issuer: Arc<dyn ClusterCredentialsIssuer>,
}

impl TemporaryCredentialsGenerator {
    pub fn new(issuer: Arc<dyn ClusterCredentialsIssuer>) -> Self {
        Self { issuer }
    }

    /// The normalized database user for `identity`.
    ///
    /// A configured username wins; otherwise the user or role name in the
    /// identity ARN is used.
    pub fn database_user(
        identity: &ResolvedIdentity,
        config: &TemporaryCredentialsConfig,
    ) -> Result<String, ProviderError> {
        let (raw, derived) = match &config.username {
            Some(name) => (name.as_str(), false),
            None => (identity.arn.as_str(), true),
        };
        let user = normalize_username(raw);
        if user.is_empty() {
            return Err(ProviderError::credential_mint("database user is empty"));
        }
        if derived && user.contains([':', '/']) {
            return Err(ProviderError::credential_mint(format!(
                "cannot derive a database user from identity {}; set username explicitly",
                identity.arn
            )));
        }
        Ok(user)
    }

    pub async fn generate(
        &self,
        identity: &ResolvedIdentity,
        config: &TemporaryCredentialsConfig,
        database: &str,
        deadline: &Deadline,
    ) -> Result<TemporaryCredential, ProviderError> {
        let request = ClusterCredentialsRequest {
            cluster_identifier: config.cluster_identifier.clone(),
            db_user: Self::database_user(identity, config)?,
            db_name: database.to_string(),
            auto_create: config.auto_create_user,
            db_groups: config.db_groups.clone(),
            duration_seconds: config.duration_seconds,
        };

        let minted = deadline
            .run(
                Stage::CredentialMint,
                "GetClusterCredentials",
                self.issuer.get_cluster_credentials(identity, &request),
            )
            .await?;

        if minted.username.is_empty() || minted.password.is_empty() {
            return Err(ProviderError::credential_mint(format!(
                "GetClusterCredentials for cluster {} returned an empty user or password",
                request.cluster_identifier
            )));
        }

        info!(
            cluster_identifier = %request.cluster_identifier,
            db_user = %minted.username,
            expiry = ?minted.expiry,
            "Minted temporary cluster credentials"
        );
        Ok(minted)
    }
}
