//! Identity service boundary.

use async_trait::async_trait;

use redshift_core::{AssumeRoleConfig, ProviderError, ResolvedIdentity};

/// The two identity operations credential resolution depends on.
///
/// Each call is one round trip to the identity service. Implementations do
/// not retry and report every failure as [`ProviderError::Authentication`].
#[async_trait]
pub trait IdentityClient: Send + Sync {
    /// Who the ambient credentials belong to.
    async fn get_caller_identity(&self) -> Result<ResolvedIdentity, ProviderError>;

    /// Exchange the caller identity for a session of `role`.
    ///
    /// The returned identity carries the session credentials in
    /// [`ResolvedIdentity::session`].
    async fn assume_role(&self, role: &AssumeRoleConfig) -> Result<ResolvedIdentity, ProviderError>;
}

/// Reject identities that are empty or missing the parts later stages need.
pub(crate) fn validate_identity(
    identity: ResolvedIdentity,
    operation: &str,
    expect_session: bool,
) -> Result<ResolvedIdentity, ProviderError> {
    if identity.arn.trim().is_empty() {
        return Err(ProviderError::authentication(format!(
            "{operation} returned an empty identity"
        )));
    }
    if expect_session && identity.session.is_none() {
        return Err(ProviderError::authentication(format!(
            "{operation} returned no session credentials for {}",
            identity.arn
        )));
    }
    Ok(identity)
}
