use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::{ProviderError, Result};
use crate::settings::{AssumeRoleSettings, ProviderSettings, TemporaryCredentialsSettings};

pub const DEFAULT_PORT: u16 = 5439;
pub const DEFAULT_DATABASE: &str = "redshift";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 180;
pub const MAX_CONNECT_TIMEOUT_SECS: u64 = 86_400;
pub const DEFAULT_SESSION_NAME: &str = "terraform-provider-redshift";

/// Bounds accepted by `GetClusterCredentials`.
pub const MIN_DURATION_SECONDS: i32 = 900;
pub const MAX_DURATION_SECONDS: i32 = 3600;

/// Bounds accepted by `AssumeRole`.
pub const MIN_ROLE_DURATION_SECONDS: i32 = 900;
pub const MAX_ROLE_DURATION_SECONDS: i32 = 43_200;

// ── SSL mode ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SslMode {
    Disable,
    #[default]
    Require,
    VerifyCa,
    VerifyFull,
}

impl FromStr for SslMode {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "disable" => Ok(Self::Disable),
            "require" => Ok(Self::Require),
            "verify-ca" => Ok(Self::VerifyCa),
            "verify-full" => Ok(Self::VerifyFull),
            other => Err(ProviderError::configuration(format!(
                "unsupported sslmode {other:?} (expected disable, require, verify-ca or verify-full)"
            ))),
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disable => "disable",
            Self::Require => "require",
            Self::VerifyCa => "verify-ca",
            Self::VerifyFull => "verify-full",
        })
    }
}

// ── Validated config ──────────────────────────────────────────

/// Validated provider configuration with exactly one credential strategy.
#[derive(Clone, PartialEq, Serialize)]
pub struct ProviderConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub ssl_mode: SslMode,
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,
    pub credentials: CredentialSource,
}

#[derive(Clone, PartialEq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum CredentialSource {
    Static {
        username: String,
        #[serde(skip)]
        password: String,
    },
    Temporary(TemporaryCredentialsConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporaryCredentialsConfig {
    pub cluster_identifier: String,
    /// Database user to mint for. Derived from the caller identity when unset.
    pub username: Option<String>,
    pub region: Option<String>,
    pub auto_create_user: bool,
    pub db_groups: Vec<String>,
    pub duration_seconds: Option<i32>,
    pub assume_role: Option<AssumeRoleConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssumeRoleConfig {
    pub arn: String,
    pub external_id: Option<String>,
    pub session_name: String,
    /// Lifetime of the assumed session. STS default when unset.
    pub duration_seconds: Option<i32>,
}

/// Which strategy a config selects, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Static,
    Temporary,
    TemporaryAssumeRole,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Static => "static",
            Self::Temporary => "temporary",
            Self::TemporaryAssumeRole => "temporary_assume_role",
        })
    }
}

impl CredentialSource {
    pub fn strategy(&self) -> Strategy {
        match self {
            Self::Static { .. } => Strategy::Static,
            Self::Temporary(t) if t.assume_role.is_some() => Strategy::TemporaryAssumeRole,
            Self::Temporary(_) => Strategy::Temporary,
        }
    }
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static { username, .. } => f
                .debug_struct("Static")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::Temporary(t) => f.debug_tuple("Temporary").field(t).finish(),
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("ssl_mode", &self.ssl_mode)
            .field("connect_timeout", &self.connect_timeout)
            .field("credentials", &self.credentials)
            .finish()
    }
}

fn required(value: Option<String>, what: &str) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ProviderError::configuration(format!("{what} is required"))),
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl ProviderConfig {
    /// Load settings from the environment and validate them.
    pub fn from_env() -> Result<Self> {
        Self::try_from(ProviderSettings::from_env())
    }

    pub fn strategy(&self) -> Strategy {
        self.credentials.strategy()
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!(
            host = %self.host,
            port = self.port,
            database = %self.database,
            ssl_mode = %self.ssl_mode,
            strategy = %self.strategy(),
            "Provider config loaded"
        );
        if let CredentialSource::Temporary(t) = &self.credentials {
            tracing::info!(
                cluster_identifier = %t.cluster_identifier,
                region = t.region.as_deref().unwrap_or("(default chain)"),
                assume_role = t.assume_role.as_ref().map(|r| r.arn.as_str()).unwrap_or("(none)"),
                "Temporary credentials enabled"
            );
        }
    }

    /// Return a redacted view safe for printing (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl TryFrom<ProviderSettings> for ProviderConfig {
    type Error = ProviderError;

    fn try_from(settings: ProviderSettings) -> Result<Self> {
        let host = required(settings.host, "host")?;
        let ssl_mode = match optional(settings.sslmode) {
            Some(raw) => raw.parse()?,
            None => SslMode::default(),
        };
        let connect_timeout = match settings.connect_timeout {
            Some(0) => {
                return Err(ProviderError::configuration("connect_timeout must be positive"))
            }
            Some(secs) if secs > MAX_CONNECT_TIMEOUT_SECS => {
                return Err(ProviderError::configuration(format!(
                    "connect_timeout must be at most {MAX_CONNECT_TIMEOUT_SECS} seconds, got {secs}"
                )))
            }
            Some(secs) => Duration::from_secs(secs),
            None => Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        // A temporary_credentials block always wins over static user/password.
        let credentials = match settings.temporary_credentials {
            Some(block) => CredentialSource::Temporary(TemporaryCredentialsConfig::from_settings(
                block,
                optional(settings.username),
            )?),
            None => CredentialSource::Static {
                username: required(settings.username, "username")?,
                password: settings
                    .password
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| {
                        ProviderError::configuration(
                            "password is required unless temporary_credentials is configured",
                        )
                    })?,
            },
        };

        Ok(Self {
            host,
            port: settings.port.unwrap_or(DEFAULT_PORT),
            database: optional(settings.database).unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            ssl_mode,
            connect_timeout,
            credentials,
        })
    }
}

impl TemporaryCredentialsConfig {
    fn from_settings(block: TemporaryCredentialsSettings, username: Option<String>) -> Result<Self> {
        let cluster_identifier = required(
            block.cluster_identifier,
            "temporary_credentials.cluster_identifier",
        )?;
        if let Some(secs) = block.duration_seconds {
            if !(MIN_DURATION_SECONDS..=MAX_DURATION_SECONDS).contains(&secs) {
                return Err(ProviderError::configuration(format!(
                    "temporary_credentials.duration_seconds must be between {MIN_DURATION_SECONDS} and {MAX_DURATION_SECONDS}, got {secs}"
                )));
            }
        }
        let assume_role = block.assume_role.map(AssumeRoleConfig::from_settings).transpose()?;

        Ok(Self {
            cluster_identifier,
            username,
            region: optional(block.region),
            auto_create_user: block.auto_create_user.unwrap_or(false),
            db_groups: block.db_groups,
            duration_seconds: block.duration_seconds,
            assume_role,
        })
    }
}

impl AssumeRoleConfig {
    fn from_settings(block: AssumeRoleSettings) -> Result<Self> {
        let arn = required(block.arn, "temporary_credentials.assume_role.arn")?;
        if !arn.starts_with("arn:") {
            return Err(ProviderError::configuration(format!(
                "temporary_credentials.assume_role.arn {arn:?} is not an ARN"
            )));
        }
        if let Some(secs) = block.duration_seconds {
            if !(MIN_ROLE_DURATION_SECONDS..=MAX_ROLE_DURATION_SECONDS).contains(&secs) {
                return Err(ProviderError::configuration(format!(
                    "temporary_credentials.assume_role.duration_seconds must be between {MIN_ROLE_DURATION_SECONDS} and {MAX_ROLE_DURATION_SECONDS}, got {secs}"
                )));
            }
        }
        Ok(Self {
            arn,
            duration_seconds: block.duration_seconds,
            external_id: optional(block.external_id),
            session_name: optional(block.session_name)
                .unwrap_or_else(|| DEFAULT_SESSION_NAME.to_string()),
        })
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }
}
