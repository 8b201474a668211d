//! End-to-end attempts through the client with fake cloud services.

use redshift_core::{
    AssumeRoleSettings, AttemptState, ConnectAttempt, ProviderConfig, ProviderError,
    ProviderSettings, Strategy, TemporaryCredentialsSettings,
};

use crate::fakes::{FakeConnector, Harness, NAMESPACE};

fn temporary_settings(assume_role: Option<&str>) -> ProviderSettings {
    ProviderSettings {
        host: Some("c1.example.redshift.amazonaws.com".into()),
        temporary_credentials: Some(TemporaryCredentialsSettings {
            cluster_identifier: Some("c1".into()),
            assume_role: assume_role.map(|arn| AssumeRoleSettings {
                arn: Some(arn.into()),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[tokio::test]
async fn static_login_uses_lowercased_user_and_verbatim_password() {
    let config = ProviderConfig::try_from(ProviderSettings {
        host: Some("h".into()),
        username: Some("ALICE".into()),
        password: Some("S3cret!".into()),
        ..Default::default()
    })
    .unwrap();
    let harness = Harness::healthy(config);

    let mut attempt = ConnectAttempt::new();
    let conn = harness.client.connect_tracked(&mut attempt).await.unwrap();
    assert_eq!(conn.username(), "alice");
    assert_eq!(conn.strategy(), Strategy::Static);
    assert!(conn.credentials_expire_at().is_none());
    conn.close().await.unwrap();

    assert_eq!(harness.logins(), vec![("alice".to_string(), "S3cret!".to_string())]);
    assert!(harness.calls().is_empty());
    assert_eq!(attempt.state(), AttemptState::Connected);
}

#[tokio::test]
async fn direct_identity_connects_with_minted_credential() {
    let config = ProviderConfig::try_from(temporary_settings(None)).unwrap();
    let harness = Harness::healthy(config);

    let mut attempt = ConnectAttempt::new();
    let conn = harness.client.connect_tracked(&mut attempt).await.unwrap();
    assert_eq!(conn.strategy(), Strategy::Temporary);
    assert!(conn.credentials_expire_at().is_some());
    conn.close().await.unwrap();

    assert_eq!(
        harness.calls(),
        vec!["GetCallerIdentity", "GetClusterCredentials:alice:direct"]
    );
    assert_eq!(
        harness.logins(),
        vec![("IAM:alice".to_string(), "minted-0".to_string())]
    );
    assert!(attempt.history().ends_with(&[
        AttemptState::CredentialsResolved,
        AttemptState::IdentityResolved,
        AttemptState::CredentialsMinted,
        AttemptState::Connected,
    ]));
}

#[tokio::test]
async fn assume_role_runs_before_minting() {
    let config =
        ProviderConfig::try_from(temporary_settings(Some("arn:aws:iam::123:role/deployer"))).unwrap();
    let harness = Harness::healthy(config);

    let conn = harness.client.connect().await.unwrap();
    assert_eq!(conn.strategy(), Strategy::TemporaryAssumeRole);
    assert_eq!(conn.username(), "IAM:deployer");
    conn.close().await.unwrap();

    assert_eq!(
        harness.calls(),
        vec![
            "GetCallerIdentity",
            "AssumeRole:arn:aws:iam::123:role/deployer",
            "GetClusterCredentials:deployer:assumed",
        ]
    );
}

#[tokio::test]
async fn every_attempt_mints_a_new_password() {
    let config = ProviderConfig::try_from(temporary_settings(None)).unwrap();
    let harness = Harness::healthy(config);

    for _ in 0..2 {
        harness.client.connect().await.unwrap().close().await.unwrap();
    }

    let passwords: Vec<String> = harness.logins().into_iter().map(|(_, p)| p).collect();
    assert_eq!(passwords, vec!["minted-0", "minted-1"]);
}

#[tokio::test]
async fn refused_login_is_a_connection_error() {
    let config = ProviderConfig::try_from(temporary_settings(None)).unwrap();
    let harness = Harness::new(
        config,
        FakeConnector {
            refuse: true,
            ..Default::default()
        },
    );

    let mut attempt = ConnectAttempt::new();
    let err = harness
        .client
        .connect_tracked(&mut attempt)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, ProviderError::Connection(_)));
    assert_eq!(
        attempt.state(),
        AttemptState::Failed(redshift_core::Stage::Connection)
    );
    assert_eq!(harness.stats.opens(), 0);
}

#[tokio::test]
async fn namespace_is_read_and_connection_released() {
    let config = ProviderConfig::try_from(temporary_settings(None)).unwrap();
    let harness = Harness::healthy(config);

    let namespace = harness.client.namespace().await.unwrap();

    assert_eq!(namespace.to_string(), NAMESPACE);
    assert_eq!(harness.stats.opens(), 1);
    assert_eq!(harness.stats.closes(), 1);
}

#[tokio::test]
async fn non_uuid_namespace_is_rejected() {
    let config = ProviderConfig::try_from(temporary_settings(None)).unwrap();
    let harness = Harness::new(
        config,
        FakeConnector {
            namespace: Some("not-a-namespace".into()),
            ..Default::default()
        },
    );

    let err = harness.client.namespace().await.unwrap_err();

    assert!(matches!(err, ProviderError::InvalidNamespace { .. }));
    assert_eq!(harness.stats.closes(), 1);
}
