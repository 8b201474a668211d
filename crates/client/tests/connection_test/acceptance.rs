//! Live runs against a real cluster. Opt in with `cargo test -- --ignored`
//! and the `REDSHIFT_*` variables set; tests skip when the environment does
//! not provide what they need.

use redshift_client::Client;
use redshift_core::settings::{
    ASSUME_ROLE_ARN_ENV, CLUSTER_IDENTIFIER_ENV, HOST_ENV, PASSWORD_ENV, USER_ENV,
};
use redshift_core::testing::ScopedEnv;
use redshift_core::{permanent_username, ProviderConfig, ProviderError, Strategy};

fn skip(reason: impl std::fmt::Display) {
    eprintln!("skipping: {reason}");
}

/// Swap the static password for temporary credentials, keeping the
/// configured user in its permanent lowercase form.
fn prepare_temporary(env: &mut ScopedEnv) -> Option<()> {
    if env.get(HOST_ENV).is_none() || env.get(USER_ENV).is_none() {
        skip("REDSHIFT_HOST and REDSHIFT_USER must be set");
        return None;
    }
    if env.get(CLUSTER_IDENTIFIER_ENV).is_none() {
        skip(format!("{CLUSTER_IDENTIFIER_ENV} must be set"));
        return None;
    }
    let user = permanent_username(&env.get(USER_ENV)?).to_lowercase();
    env.remove(PASSWORD_ENV).set(USER_ENV, &user);
    Some(())
}

async fn connect_or_skip(config: ProviderConfig) -> Result<(), ProviderError> {
    let client = Client::new(config);
    match client.connect().await {
        Ok(conn) => conn.close().await,
        Err(e) if e.is_environment_unavailable() => {
            skip(format!("no usable AWS identity: {e}"));
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[tokio::test]
#[ignore]
async fn temporary_credentials_connect() {
    let mut env = ScopedEnv::acquire();
    env.remove(ASSUME_ROLE_ARN_ENV);
    if prepare_temporary(&mut env).is_none() {
        return;
    }

    let config = ProviderConfig::from_env().unwrap();
    assert_eq!(config.strategy(), Strategy::Temporary);
    connect_or_skip(config).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn temporary_credentials_assume_role_connect() {
    let mut env = ScopedEnv::acquire();
    if env.get(ASSUME_ROLE_ARN_ENV).is_none() {
        skip(format!("{ASSUME_ROLE_ARN_ENV} must be set"));
        return;
    }
    if prepare_temporary(&mut env).is_none() {
        return;
    }

    let config = ProviderConfig::from_env().unwrap();
    assert_eq!(config.strategy(), Strategy::TemporaryAssumeRole);
    connect_or_skip(config).await.unwrap();
}

#[tokio::test]
#[ignore]
async fn namespace_data_source() {
    let env = ScopedEnv::acquire();
    if env.get(HOST_ENV).is_none() {
        skip("REDSHIFT_HOST must be set");
        return;
    }

    let client = Client::from_env().unwrap();
    match client.namespace().await {
        Ok(namespace) => assert!(!namespace.is_nil()),
        Err(e) if e.is_environment_unavailable() => skip(format!("no usable AWS identity: {e}")),
        Err(e) => panic!("namespace lookup failed: {e}"),
    }
}
