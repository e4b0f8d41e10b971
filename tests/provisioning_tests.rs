use portfolio_api::provisioning::{
    IdentityAdmin, InMemoryIdentityAdmin, ProvisionError, provision_admin,
};

#[tokio::test]
async fn test_provision_creates_admin() {
    let admin = InMemoryIdentityAdmin::new();
    let outcome = provision_admin(&admin, "owner@example.com", "hunter22")
        .await
        .unwrap();

    assert!(outcome.created);
    assert_eq!(outcome.email, "owner@example.com");

    let users = admin.users();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].uid, outcome.uid);
    assert!(users[0].admin);
}

#[tokio::test]
async fn test_provision_is_idempotent() {
    let admin = InMemoryIdentityAdmin::new();
    let first = provision_admin(&admin, "owner@example.com", "hunter22")
        .await
        .unwrap();
    let second = provision_admin(&admin, "Owner@Example.com", "hunter22")
        .await
        .unwrap();

    assert!(!second.created);
    assert_eq!(first.uid, second.uid);
    assert_eq!(admin.users().len(), 1);
    assert!(admin.users()[0].admin);
}

#[tokio::test]
async fn test_provision_promotes_existing_account() {
    let admin = InMemoryIdentityAdmin::new();
    let existing = admin.create_user("owner@example.com", "pw").await.unwrap();
    assert!(!existing.admin);

    let outcome = provision_admin(&admin, "owner@example.com", "pw")
        .await
        .unwrap();

    assert!(!outcome.created);
    assert_eq!(outcome.uid, existing.uid);
    assert!(admin.users()[0].admin);
}

#[tokio::test]
async fn test_provision_requires_credentials() {
    let admin = InMemoryIdentityAdmin::new();

    for (email, password) in [("", "pw"), ("owner@example.com", ""), ("   ", "pw")] {
        let err = provision_admin(&admin, email, password).await.unwrap_err();
        assert!(matches!(err, ProvisionError::MissingCredentials));
    }
    assert!(admin.users().is_empty());
}

#[tokio::test]
async fn test_provision_surfaces_provider_failure() {
    let admin = InMemoryIdentityAdmin::new_failing();
    let err = provision_admin(&admin, "owner@example.com", "pw")
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisionError::Provider(_)));
}
