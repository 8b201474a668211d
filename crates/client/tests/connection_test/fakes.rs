//! In-memory cloud services and database driver.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use redshift_auth::{
    ClusterCredentialsIssuer, ClusterCredentialsRequest, CredentialResolver, IdentityClient,
};
use redshift_client::{Client, Connector, Session};
use redshift_core::{
    AssumeRoleConfig, Credentials, ProviderConfig, ProviderError, ResolvedIdentity,
    SessionCredentials, TemporaryCredential,
};

pub const NAMESPACE: &str = "3c1e5a0b-9d7f-4e2a-8b6c-1f0e2d3c4b5a";

pub type CallLog = Arc<Mutex<Vec<String>>>;

#[derive(Default)]
pub struct FakeIdentity {
    pub log: CallLog,
}

#[async_trait]
impl IdentityClient for FakeIdentity {
    async fn get_caller_identity(&self) -> Result<ResolvedIdentity, ProviderError> {
        self.log.lock().unwrap().push("GetCallerIdentity".into());
        Ok(ResolvedIdentity {
            arn: "arn:aws:iam::123456789012:user/Alice".into(),
            account: Some("123456789012".into()),
            user_id: Some("AIDAEXAMPLE".into()),
            session: None,
        })
    }

    async fn assume_role(&self, role: &AssumeRoleConfig) -> Result<ResolvedIdentity, ProviderError> {
        self.log.lock().unwrap().push(format!("AssumeRole:{}", role.arn));
        Ok(ResolvedIdentity {
            arn: format!(
                "arn:aws:sts::123456789012:assumed-role/deployer/{}",
                role.session_name
            ),
            account: None,
            user_id: None,
            session: Some(SessionCredentials {
                access_key_id: "ASIAEXAMPLE".into(),
                secret_access_key: "assumed-secret".into(),
                session_token: Some("assumed-token".into()),
                expiration: None,
            }),
        })
    }
}

#[derive(Default)]
pub struct FakeIssuer {
    pub log: CallLog,
    pub minted: AtomicUsize,
}

#[async_trait]
impl ClusterCredentialsIssuer for FakeIssuer {
    async fn get_cluster_credentials(
        &self,
        identity: &ResolvedIdentity,
        request: &ClusterCredentialsRequest,
    ) -> Result<TemporaryCredential, ProviderError> {
        let via = if identity.is_assumed() { "assumed" } else { "direct" };
        self.log
            .lock()
            .unwrap()
            .push(format!("GetClusterCredentials:{}:{via}", request.db_user));
        let n = self.minted.fetch_add(1, Ordering::SeqCst);
        Ok(TemporaryCredential {
            username: format!("IAM:{}", request.db_user),
            password: format!("minted-{n}"),
            expiry: Some(Utc::now() + chrono::Duration::minutes(15)),
        })
    }
}

/// Counters shared between a [`FakeConnector`] and its sessions.
#[derive(Default)]
pub struct DbStats {
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub logins: Mutex<Vec<(String, String)>>,
}

impl DbStats {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct FakeConnector {
    pub stats: Arc<DbStats>,
    pub refuse: bool,
    pub dial_delay: Option<Duration>,
    pub namespace: Option<String>,
}

pub struct FakeSession {
    stats: Arc<DbStats>,
    namespace: Option<String>,
}

#[async_trait]
impl Connector for FakeConnector {
    type Session = FakeSession;

    async fn open(&self, credentials: &Credentials) -> Result<FakeSession, ProviderError> {
        if let Some(delay) = self.dial_delay {
            tokio::time::sleep(delay).await;
        }
        if self.refuse {
            return Err(ProviderError::connection(format!(
                "password authentication failed for user \"{}\"",
                credentials.username
            )));
        }
        self.stats.opens.fetch_add(1, Ordering::SeqCst);
        self.stats
            .logins
            .lock()
            .unwrap()
            .push((credentials.username.clone(), credentials.password.clone()));
        Ok(FakeSession {
            stats: self.stats.clone(),
            namespace: self.namespace.clone(),
        })
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn query_scalar(&mut self, sql: &str) -> Result<Option<String>, ProviderError> {
        match sql {
            "SELECT current_namespace" => Ok(self.namespace.clone()),
            "SELECT 1" => Ok(Some("1".into())),
            other => Err(ProviderError::Query(format!("syntax error at or near \"{other}\""))),
        }
    }

    async fn close(self) -> Result<(), ProviderError> {
        self.stats.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A client wired to fakes, plus handles to inspect them.
pub struct Harness {
    pub log: CallLog,
    pub stats: Arc<DbStats>,
    pub client: Client<FakeConnector>,
}

impl Harness {
    pub fn new(config: ProviderConfig, connector: FakeConnector) -> Self {
        let log = CallLog::default();
        let resolver = CredentialResolver::new(
            Arc::new(FakeIdentity { log: log.clone() }),
            Arc::new(FakeIssuer {
                log: log.clone(),
                ..Default::default()
            }),
        );
        let stats = connector.stats.clone();
        let client = Client::with_parts(config, resolver, connector);
        Self { log, stats, client }
    }

    pub fn healthy(config: ProviderConfig) -> Self {
        Self::new(
            config,
            FakeConnector {
                namespace: Some(NAMESPACE.into()),
                ..Default::default()
            },
        )
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn logins(&self) -> Vec<(String, String)> {
        self.stats.logins.lock().unwrap().clone()
    }
}
