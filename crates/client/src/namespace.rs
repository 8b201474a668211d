//! The `redshift_namespace` data source: the cluster's namespace UUID.

use uuid::Uuid;

use redshift_core::ProviderError;

use crate::connector::Session;
use crate::manager::Connection;

pub const NAMESPACE_QUERY: &str = "SELECT current_namespace";

pub fn parse_namespace(raw: Option<String>) -> Result<Uuid, ProviderError> {
    let value = raw.ok_or_else(|| ProviderError::InvalidNamespace {
        value: String::new(),
        reason: "query returned no namespace".into(),
    })?;
    Uuid::parse_str(value.trim()).map_err(|e| ProviderError::InvalidNamespace {
        reason: e.to_string(),
        value,
    })
}

pub async fn read_namespace<S: Session>(connection: &mut Connection<S>) -> Result<Uuid, ProviderError> {
    parse_namespace(connection.query_scalar(NAMESPACE_QUERY).await?)
}
