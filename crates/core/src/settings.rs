//! Loosely typed provider settings as they arrive at the process boundary.
//!
//! Settings come from environment variables (optionally profiled), a JSON
//! document, or CLI flags. Nothing here is validated; see
//! [`ProviderConfig`](crate::config::ProviderConfig) for the checked form.

use std::env;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ProviderError, Result};

/// Env var naming the active profile.
pub const PROFILE_ENV: &str = "REDSHIFT_PROFILE";

pub const HOST_ENV: &str = "REDSHIFT_HOST";
pub const PORT_ENV: &str = "REDSHIFT_PORT";
pub const USER_ENV: &str = "REDSHIFT_USER";
pub const PASSWORD_ENV: &str = "REDSHIFT_PASSWORD";
pub const DATABASE_ENV: &str = "REDSHIFT_DB";
pub const SSLMODE_ENV: &str = "REDSHIFT_SSLMODE";
pub const CONNECT_TIMEOUT_ENV: &str = "REDSHIFT_CONNECT_TIMEOUT";
pub const CLUSTER_IDENTIFIER_ENV: &str = "REDSHIFT_TEMPORARY_CREDENTIALS_CLUSTER_IDENTIFIER";
pub const REGION_ENV: &str = "REDSHIFT_TEMPORARY_CREDENTIALS_REGION";
pub const AUTO_CREATE_USER_ENV: &str = "REDSHIFT_TEMPORARY_CREDENTIALS_AUTO_CREATE_USER";
pub const DB_GROUPS_ENV: &str = "REDSHIFT_TEMPORARY_CREDENTIALS_DB_GROUPS";
pub const DURATION_SECONDS_ENV: &str = "REDSHIFT_TEMPORARY_CREDENTIALS_DURATION_SECONDS";
pub const ASSUME_ROLE_ARN_ENV: &str = "REDSHIFT_TEMPORARY_CREDENTIALS_ASSUME_ROLE_ARN";
pub const ASSUME_ROLE_EXTERNAL_ID_ENV: &str = "REDSHIFT_TEMPORARY_CREDENTIALS_ASSUME_ROLE_EXTERNAL_ID";
pub const ASSUME_ROLE_SESSION_NAME_ENV: &str =
    "REDSHIFT_TEMPORARY_CREDENTIALS_ASSUME_ROLE_SESSION_NAME";
pub const ASSUME_ROLE_DURATION_SECONDS_ENV: &str =
    "REDSHIFT_TEMPORARY_CREDENTIALS_ASSUME_ROLE_DURATION_SECONDS";

/// Every env key read by [`ProviderSettings::from_env`].
pub const ENV_KEYS: &[&str] = &[
    HOST_ENV,
    PORT_ENV,
    USER_ENV,
    PASSWORD_ENV,
    DATABASE_ENV,
    SSLMODE_ENV,
    CONNECT_TIMEOUT_ENV,
    CLUSTER_IDENTIFIER_ENV,
    REGION_ENV,
    AUTO_CREATE_USER_ENV,
    DB_GROUPS_ENV,
    DURATION_SECONDS_ENV,
    ASSUME_ROLE_ARN_ENV,
    ASSUME_ROLE_EXTERNAL_ID_ENV,
    ASSUME_ROLE_SESSION_NAME_ENV,
    ASSUME_ROLE_DURATION_SECONDS_ENV,
];

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries `{PROFILE}_{KEY}` first, falls back to `{KEY}`.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str) -> Option<T> {
    let raw = profiled_env_opt(profile, key)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable env value");
            None
        }
    }
}

fn profiled_env_bool(profile: &str, key: &str) -> Option<bool> {
    profiled_env_opt(profile, key).map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1"))
}

fn profiled_env_list(profile: &str, key: &str) -> Vec<String> {
    profiled_env_opt(profile, key)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

// ── Settings ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    #[serde(alias = "user")]
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub sslmode: Option<String>,
    /// Seconds.
    pub connect_timeout: Option<u64>,
    pub temporary_credentials: Option<TemporaryCredentialsSettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemporaryCredentialsSettings {
    pub cluster_identifier: Option<String>,
    pub region: Option<String>,
    pub auto_create_user: Option<bool>,
    pub db_groups: Vec<String>,
    pub duration_seconds: Option<i32>,
    pub assume_role: Option<AssumeRoleSettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssumeRoleSettings {
    pub arn: Option<String>,
    pub external_id: Option<String>,
    pub session_name: Option<String>,
    pub duration_seconds: Option<i32>,
}

impl ProviderSettings {
    /// Build settings from environment variables (call [`load_dotenv`] first).
    ///
    /// The profile is read from `REDSHIFT_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_opt(PROFILE_ENV).unwrap_or_default().to_uppercase();
        Self::from_env_profiled(&profile)
    }

    pub fn from_env_profiled(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            host: profiled_env_opt(p, HOST_ENV),
            port: profiled_env_parse(p, PORT_ENV),
            username: profiled_env_opt(p, USER_ENV),
            password: profiled_env_opt(p, PASSWORD_ENV),
            database: profiled_env_opt(p, DATABASE_ENV),
            sslmode: profiled_env_opt(p, SSLMODE_ENV),
            connect_timeout: profiled_env_parse(p, CONNECT_TIMEOUT_ENV),
            temporary_credentials: TemporaryCredentialsSettings::from_env_profiled(p),
        }
    }

    /// Parse settings from a JSON document such as a provider block.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| ProviderError::configuration(format!("invalid settings document: {e}")))
    }

    /// Layer `other` on top of `self`: every field set in `other` wins.
    pub fn overlay(self, other: ProviderSettings) -> Self {
        let temporary_credentials = match (self.temporary_credentials, other.temporary_credentials) {
            (Some(base), Some(top)) => Some(base.overlay(top)),
            (base, top) => top.or(base),
        };
        Self {
            host: other.host.or(self.host),
            port: other.port.or(self.port),
            username: other.username.or(self.username),
            password: other.password.or(self.password),
            database: other.database.or(self.database),
            sslmode: other.sslmode.or(self.sslmode),
            connect_timeout: other.connect_timeout.or(self.connect_timeout),
            temporary_credentials,
        }
    }
}

impl TemporaryCredentialsSettings {
    /// The block exists as soon as any of its keys is set, so a block without
    /// a cluster identifier is reported rather than silently ignored.
    fn from_env_profiled(p: &str) -> Option<Self> {
        let assume_role = AssumeRoleSettings::from_env_profiled(p);
        let block = Self {
            cluster_identifier: profiled_env_opt(p, CLUSTER_IDENTIFIER_ENV),
            region: profiled_env_opt(p, REGION_ENV),
            auto_create_user: profiled_env_bool(p, AUTO_CREATE_USER_ENV),
            db_groups: profiled_env_list(p, DB_GROUPS_ENV),
            duration_seconds: profiled_env_parse(p, DURATION_SECONDS_ENV),
            assume_role,
        };
        (block != Self::default()).then_some(block)
    }

    fn overlay(self, other: TemporaryCredentialsSettings) -> Self {
        let assume_role = match (self.assume_role, other.assume_role) {
            (Some(base), Some(top)) => Some(AssumeRoleSettings {
                arn: top.arn.or(base.arn),
                external_id: top.external_id.or(base.external_id),
                session_name: top.session_name.or(base.session_name),
                duration_seconds: top.duration_seconds.or(base.duration_seconds),
            }),
            (base, top) => top.or(base),
        };
        Self {
            cluster_identifier: other.cluster_identifier.or(self.cluster_identifier),
            region: other.region.or(self.region),
            auto_create_user: other.auto_create_user.or(self.auto_create_user),
            db_groups: if other.db_groups.is_empty() { self.db_groups } else { other.db_groups },
            duration_seconds: other.duration_seconds.or(self.duration_seconds),
            assume_role,
        }
    }
}

impl AssumeRoleSettings {
    fn from_env_profiled(p: &str) -> Option<Self> {
        let block = Self {
            arn: profiled_env_opt(p, ASSUME_ROLE_ARN_ENV),
            external_id: profiled_env_opt(p, ASSUME_ROLE_EXTERNAL_ID_ENV),
            session_name: profiled_env_opt(p, ASSUME_ROLE_SESSION_NAME_ENV),
            duration_seconds: profiled_env_parse(p, ASSUME_ROLE_DURATION_SECONDS_ENV),
        };
        (block != Self::default()).then_some(block)
    }
}
