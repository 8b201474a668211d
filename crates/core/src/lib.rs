pub mod config;
pub mod credentials;
pub mod deadline;
pub mod error;
pub mod settings;
pub mod username;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::{
    AssumeRoleConfig, CredentialSource, ProviderConfig, SslMode, Strategy,
    TemporaryCredentialsConfig,
};
pub use credentials::{
    AttemptState, ConnectAttempt, Credentials, ResolvedIdentity, SessionCredentials,
    TemporaryCredential,
};
pub use deadline::Deadline;
pub use error::{ProviderError, Result, Stage};
pub use settings::{load_dotenv, AssumeRoleSettings, ProviderSettings, TemporaryCredentialsSettings};
pub use username::{normalize_username, permanent_username};
