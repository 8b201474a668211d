//! Cluster credential-issuing boundary and its Redshift implementation.

use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use aws_credential_types::Credentials as AwsCredentials;
use aws_sdk_redshift::error::DisplayErrorContext;
use tracing::debug;

use redshift_core::{ProviderError, ResolvedIdentity, TemporaryCredential};

use crate::aws::{to_chrono, AwsSdkLoader};

/// Parameters of one `GetClusterCredentials` call.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterCredentialsRequest {
    pub cluster_identifier: String,
    /// Already normalized database user.
    pub db_user: String,
    pub db_name: String,
    pub auto_create: bool,
    pub db_groups: Vec<String>,
    pub duration_seconds: Option<i32>,
}

/// Mints short-lived database logins scoped to one cluster.
#[async_trait]
pub trait ClusterCredentialsIssuer: Send + Sync {
    /// Implementations report rejections as [`ProviderError::CredentialMint`].
    async fn get_cluster_credentials(
        &self,
        identity: &ResolvedIdentity,
        request: &ClusterCredentialsRequest,
    ) -> Result<TemporaryCredential, ProviderError>;
}

pub struct RedshiftCredentialsIssuer {
    sdk: Arc<AwsSdkLoader>,
}

impl RedshiftCredentialsIssuer {
    pub fn new(sdk: Arc<AwsSdkLoader>) -> Self {
        Self { sdk }
    }

    /// Assumed-role identities sign with their session; everything else uses
    /// the default chain.
    async fn client_for(&self, identity: &ResolvedIdentity) -> aws_sdk_redshift::Client {
        let mut builder = aws_sdk_redshift::config::Builder::from(self.sdk.sdk_config().await);
        if let Some(session) = &identity.session {
            let creds = AwsCredentials::new(
                &session.access_key_id,
                &session.secret_access_key,
                session.session_token.clone(),
                session.expiration.map(SystemTime::from),
                "redshift-assume-role",
            );
            builder = builder.credentials_provider(creds);
        }
        aws_sdk_redshift::Client::from_conf(builder.build())
    }
}

#[async_trait]
impl ClusterCredentialsIssuer for RedshiftCredentialsIssuer {
    async fn get_cluster_credentials(
        &self,
        identity: &ResolvedIdentity,
        request: &ClusterCredentialsRequest,
    ) -> Result<TemporaryCredential, ProviderError> {
        debug!(
            cluster_identifier = %request.cluster_identifier,
            db_user = %request.db_user,
            assumed = identity.is_assumed(),
            "Calling redshift:GetClusterCredentials"
        );

        let db_groups = (!request.db_groups.is_empty()).then(|| request.db_groups.clone());
        let resp = self
            .client_for(identity)
            .await
            .get_cluster_credentials()
            .cluster_identifier(&request.cluster_identifier)
            .db_user(&request.db_user)
            .db_name(&request.db_name)
            .auto_create(request.auto_create)
            .set_db_groups(db_groups)
            .set_duration_seconds(request.duration_seconds)
            .send()
            .await
            .map_err(|e| {
                ProviderError::credential_mint(format!(
                    "GetClusterCredentials for cluster {} failed: {}",
                    request.cluster_identifier,
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(TemporaryCredential {
            username: resp.db_user().unwrap_or_default().to_string(),
            password: resp.db_password().unwrap_or_default().to_string(),
            expiry: resp.expiration().and_then(to_chrono),
        })
    }
}
