//! Shared AWS SDK configuration.

use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_sts::primitives::DateTime as SmithyDateTime;
use aws_types::region::Region;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::info;

/// Loads the default AWS config chain once, with an optional region override.
///
/// Loading is deferred until the first identity or minting call so that the
/// static strategy never touches AWS configuration.
#[derive(Debug, Default)]
pub struct AwsSdkLoader {
    region: Option<String>,
    config: OnceCell<SdkConfig>,
}

impl AwsSdkLoader {
    pub fn new(region: Option<String>) -> Self {
        Self {
            region,
            config: OnceCell::new(),
        }
    }

    pub async fn sdk_config(&self) -> &SdkConfig {
        self.config
            .get_or_init(|| async {
                let mut loader = aws_config::defaults(BehaviorVersion::latest());
                if let Some(region) = &self.region {
                    loader = loader.region(Region::new(region.clone()));
                }
                let cfg = loader.load().await;
                info!(
                    region = cfg.region().map(|r| r.as_ref()).unwrap_or("(unset)"),
                    "AWS SDK config loaded"
                );
                cfg
            })
            .await
    }
}

pub(crate) fn to_chrono(dt: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}
