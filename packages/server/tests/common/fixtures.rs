//! Test fixtures for creating test data.
//!
//! Accounts and vaults are created through the HTTP API so every fixture
//! exercises the same path a client would.

use serde_json::json;
use uuid::Uuid;
use vault_server::common::{UserId, VaultId};

use super::TestHarness;

pub const TEST_PASSWORD: &str = "correct horse battery";

/// A registered user and their bearer token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub token: String,
}

impl TestUser {
    pub fn token(&self) -> Option<&str> {
        Some(&self.token)
    }
}

/// Email that is unique across the shared test database
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, Uuid::new_v4().simple())
}

/// Register a fresh user
pub async fn create_user(harness: &TestHarness, name: &str) -> TestUser {
    let email = unique_email(&name.to_lowercase().replace(' ', "."));
    let res = harness
        .api()
        .post(
            "/auth/register",
            None,
            json!({ "email": email, "password": TEST_PASSWORD, "name": name }),
        )
        .await;
    let data = res.data();

    TestUser {
        id: data["user"]["id"].as_str().unwrap().parse().unwrap(),
        email,
        name: name.to_string(),
        token: data["token"].as_str().unwrap().to_string(),
    }
}

/// Create a vault owned by `owner`
pub async fn create_vault(harness: &TestHarness, owner: &TestUser, name: &str) -> VaultId {
    let res = harness
        .api()
        .post("/vaults", owner.token(), json!({ "name": name }))
        .await;
    res.data()["id"].as_str().unwrap().parse().unwrap()
}

/// Add `user` to a vault with the given role ("CONTRIBUTOR" / "VIEWER")
pub async fn add_member(
    harness: &TestHarness,
    owner: &TestUser,
    vault_id: VaultId,
    user: &TestUser,
    role: &str,
) {
    let res = harness
        .api()
        .post(
            &format!("/vaults/{}/members", vault_id),
            owner.token(),
            json!({ "email": user.email, "role": role }),
        )
        .await;
    res.data();
}

/// Add a NOTE source and return its id
pub async fn add_note(harness: &TestHarness, user: &TestUser, vault_id: VaultId, title: &str) -> String {
    let res = harness
        .api()
        .post(
            &format!("/vaults/{}/sources", vault_id),
            user.token(),
            json!({ "type": "NOTE", "title": title, "content": "Reading notes" }),
        )
        .await;
    res.data()["id"].as_str().unwrap().to_string()
}

/// A vault with an owner, a contributor and a viewer
pub struct VaultFixture {
    pub vault_id: VaultId,
    pub owner: TestUser,
    pub contributor: TestUser,
    pub viewer: TestUser,
}

pub async fn vault_with_members(harness: &TestHarness) -> VaultFixture {
    let owner = create_user(harness, "Owner").await;
    let contributor = create_user(harness, "Contributor").await;
    let viewer = create_user(harness, "Viewer").await;

    let vault_id = create_vault(harness, &owner, "Literature Review").await;
    add_member(harness, &owner, vault_id, &contributor, "CONTRIBUTOR").await;
    add_member(harness, &owner, vault_id, &viewer, "VIEWER").await;

    VaultFixture {
        vault_id,
        owner,
        contributor,
        viewer,
    }
}
