//! AWS STS backed [`IdentityClient`].

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_sts::error::DisplayErrorContext;
use aws_sdk_sts::operation::assume_role::builders::AssumeRoleFluentBuilder;
use tracing::{debug, info};

use redshift_core::{AssumeRoleConfig, ProviderError, ResolvedIdentity, SessionCredentials};

use crate::aws::{to_chrono, AwsSdkLoader};
use crate::identity::IdentityClient;

pub struct StsIdentityClient {
    sdk: Arc<AwsSdkLoader>,
}

impl StsIdentityClient {
    pub fn new(sdk: Arc<AwsSdkLoader>) -> Self {
        Self { sdk }
    }

    async fn client(&self) -> aws_sdk_sts::Client {
        aws_sdk_sts::Client::new(self.sdk.sdk_config().await)
    }
}

/// The AssumeRole call for `role`, with every optional parameter that is set.
fn assume_role_request(client: &aws_sdk_sts::Client, role: &AssumeRoleConfig) -> AssumeRoleFluentBuilder {
    client
        .assume_role()
        .role_arn(&role.arn)
        .role_session_name(&role.session_name)
        .set_external_id(role.external_id.clone())
        .set_duration_seconds(role.duration_seconds)
}

#[async_trait]
impl IdentityClient for StsIdentityClient {
    async fn get_caller_identity(&self) -> Result<ResolvedIdentity, ProviderError> {
        debug!("Calling sts:GetCallerIdentity");

        let resp = self
            .client()
            .await
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| {
                ProviderError::authentication(format!(
                    "GetCallerIdentity failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let arn = resp
            .arn()
            .ok_or_else(|| ProviderError::authentication("GetCallerIdentity returned no ARN"))?;

        Ok(ResolvedIdentity {
            arn: arn.to_string(),
            account: resp.account().map(str::to_string),
            user_id: resp.user_id().map(str::to_string),
            session: None,
        })
    }

    async fn assume_role(&self, role: &AssumeRoleConfig) -> Result<ResolvedIdentity, ProviderError> {
        info!(
            role_arn = %role.arn,
            session_name = %role.session_name,
            duration_seconds = ?role.duration_seconds,
            "Calling sts:AssumeRole"
        );

        let client = self.client().await;
        let resp = assume_role_request(&client, role)
            .send()
            .await
            .map_err(|e| {
                ProviderError::authentication(format!(
                    "AssumeRole {} failed: {}",
                    role.arn,
                    DisplayErrorContext(&e)
                ))
            })?;

        let creds = resp.credentials().ok_or_else(|| {
            ProviderError::authentication(format!("AssumeRole {} returned empty credentials", role.arn))
        })?;
        let user = resp.assumed_role_user().ok_or_else(|| {
            ProviderError::authentication(format!("AssumeRole {} returned no assumed role user", role.arn))
        })?;

        Ok(ResolvedIdentity {
            arn: user.arn().to_string(),
            account: None,
            user_id: Some(user.assumed_role_id().to_string()),
            session: Some(SessionCredentials {
                access_key_id: creds.access_key_id().to_string(),
                secret_access_key: creds.secret_access_key().to_string(),
                session_token: Some(creds.session_token().to_string()),
                expiration: to_chrono(creds.expiration()),
            }),
        })
    }
}
