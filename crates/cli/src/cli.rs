use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use redshift_core::{AssumeRoleSettings, ProviderSettings, TemporaryCredentialsSettings};

/// Resolve Redshift credentials and check connectivity.
///
/// Settings come from `REDSHIFT_*` environment variables (and `.env`), then
/// an optional JSON settings file, then the flags below, later sources
/// winning. Passwords are only ever read from the environment or the file.
#[derive(Parser, Debug)]
#[command(name = "redshift-cli", version, about = "Redshift credential and connection checks")]
pub struct CliArgs {
    /// Read `{PROFILE}_REDSHIFT_*` variables before the plain ones.
    #[arg(long, env = "REDSHIFT_PROFILE", global = true)]
    pub profile: Option<String>,

    /// JSON file with a provider settings block.
    #[arg(long, env = "REDSHIFT_SETTINGS_FILE", global = true)]
    pub settings: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Resolve credentials, open one connection and close it.
    Check,
    /// Resolve credentials and show who the database will see.
    Whoami,
    /// Print the cluster namespace UUID.
    Namespace,
}

#[derive(Args, Debug, Default)]
pub struct Overrides {
    #[arg(long, global = true)]
    pub host: Option<String>,

    #[arg(long, global = true)]
    pub port: Option<u16>,

    #[arg(long, global = true)]
    pub user: Option<String>,

    #[arg(long, global = true)]
    pub database: Option<String>,

    /// disable, require, verify-ca or verify-full
    #[arg(long, global = true)]
    pub sslmode: Option<String>,

    /// Connect timeout in seconds.
    #[arg(long, global = true)]
    pub connect_timeout: Option<u64>,

    /// Use temporary credentials for this cluster.
    #[arg(long, global = true)]
    pub cluster_identifier: Option<String>,

    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Assume this role before requesting cluster credentials.
    #[arg(long, global = true, requires = "cluster_identifier")]
    pub assume_role_arn: Option<String>,
}

impl Overrides {
    pub fn into_settings(self) -> ProviderSettings {
        let assume_role = self.assume_role_arn.map(|arn| AssumeRoleSettings {
            arn: Some(arn),
            ..Default::default()
        });
        let temporary_credentials = (self.cluster_identifier.is_some()
            || self.region.is_some()
            || assume_role.is_some())
        .then(|| TemporaryCredentialsSettings {
            cluster_identifier: self.cluster_identifier,
            region: self.region,
            assume_role,
            ..Default::default()
        });
        ProviderSettings {
            host: self.host,
            port: self.port,
            username: self.user,
            database: self.database,
            sslmode: self.sslmode,
            connect_timeout: self.connect_timeout,
            temporary_credentials,
            ..Default::default()
        }
    }
}
