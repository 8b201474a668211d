//! In-memory identity service and credential issuer sharing one call log.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use redshift_auth::{
    ClusterCredentialsIssuer, ClusterCredentialsRequest, CredentialResolver, IdentityClient,
};
use redshift_core::{
    AssumeRoleConfig, ProviderError, ResolvedIdentity, SessionCredentials, TemporaryCredential,
};

pub type CallLog = Arc<Mutex<Vec<String>>>;

pub const CALLER_ARN: &str = "arn:aws:iam::123456789012:user/Alice";

#[derive(Default)]
pub struct FakeIdentity {
    pub log: CallLog,
    pub caller_arn: Option<String>,
    pub fail_caller: Option<String>,
    pub fail_assume: Option<String>,
    pub delay: Option<Duration>,
    pub assumed: Mutex<Vec<AssumeRoleConfig>>,
}

#[async_trait]
impl IdentityClient for FakeIdentity {
    async fn get_caller_identity(&self) -> Result<ResolvedIdentity, ProviderError> {
        self.log.lock().unwrap().push("GetCallerIdentity".into());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = &self.fail_caller {
            return Err(ProviderError::authentication(reason.clone()));
        }
        Ok(ResolvedIdentity {
            arn: self.caller_arn.clone().unwrap_or_else(|| CALLER_ARN.to_string()),
            account: Some("123456789012".into()),
            user_id: Some("AIDAEXAMPLE".into()),
            session: None,
        })
    }

    async fn assume_role(&self, role: &AssumeRoleConfig) -> Result<ResolvedIdentity, ProviderError> {
        self.log.lock().unwrap().push(format!("AssumeRole:{}", role.arn));
        self.assumed.lock().unwrap().push(role.clone());
        if let Some(reason) = &self.fail_assume {
            return Err(ProviderError::authentication(reason.clone()));
        }
        let role_name = role.arn.rsplit('/').next().unwrap_or("role");
        Ok(ResolvedIdentity {
            arn: format!(
                "arn:aws:sts::123456789012:assumed-role/{role_name}/{}",
                role.session_name
            ),
            account: None,
            user_id: Some("AROAEXAMPLE:session".into()),
            session: Some(SessionCredentials {
                access_key_id: "ASIAEXAMPLE".into(),
                secret_access_key: "assumed-secret".into(),
                session_token: Some("assumed-token".into()),
                expiration: Some(Utc::now() + chrono::Duration::hours(1)),
            }),
        })
    }
}

#[derive(Default)]
pub struct FakeIssuer {
    pub log: CallLog,
    pub fail: Option<String>,
    pub empty_password: bool,
    pub requests: Mutex<Vec<(ClusterCredentialsRequest, bool)>>,
    pub minted: AtomicUsize,
}

#[async_trait]
impl ClusterCredentialsIssuer for FakeIssuer {
    async fn get_cluster_credentials(
        &self,
        identity: &ResolvedIdentity,
        request: &ClusterCredentialsRequest,
    ) -> Result<TemporaryCredential, ProviderError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("GetClusterCredentials:{}", request.db_user));
        self.requests
            .lock()
            .unwrap()
            .push((request.clone(), identity.is_assumed()));
        if let Some(reason) = &self.fail {
            return Err(ProviderError::credential_mint(reason.clone()));
        }
        let n = self.minted.fetch_add(1, Ordering::SeqCst);
        Ok(TemporaryCredential {
            username: format!("IAM:{}", request.db_user),
            password: if self.empty_password { String::new() } else { format!("minted-{n}") },
            expiry: Some(Utc::now() + chrono::Duration::minutes(15)),
        })
    }
}

/// A resolver wired to fakes, plus handles to inspect them.
pub struct Harness {
    pub log: CallLog,
    pub identity: Arc<FakeIdentity>,
    pub issuer: Arc<FakeIssuer>,
    pub resolver: CredentialResolver,
}

impl Harness {
    pub fn new(identity: FakeIdentity, issuer: FakeIssuer) -> Self {
        let log = CallLog::default();
        let identity = Arc::new(FakeIdentity { log: log.clone(), ..identity });
        let issuer = Arc::new(FakeIssuer { log: log.clone(), ..issuer });
        let resolver = CredentialResolver::new(identity.clone(), issuer.clone());
        Self {
            log,
            identity,
            issuer,
            resolver,
        }
    }

    pub fn healthy() -> Self {
        Self::new(FakeIdentity::default(), FakeIssuer::default())
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}
