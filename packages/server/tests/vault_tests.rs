//! Integration tests for vault CRUD, RBAC and the vault-list cache.

mod common;

use axum::http::StatusCode;
use common::{add_note, create_user, create_vault, vault_with_members, TestHarness};
use serde_json::json;
use test_context::test_context;
use vault_server::kernel::cache::vault_list_key;
use vault_server::kernel::BaseCache;

#[test_context(TestHarness)]
#[tokio::test]
async fn create_vault_makes_caller_owner(ctx: &TestHarness) {
    let owner = create_user(ctx, "Owner").await;

    let res = ctx
        .api()
        .post(
            "/vaults",
            owner.token(),
            json!({ "name": "  Protein Folding  ", "description": "AlphaFold papers" }),
        )
        .await;

    assert_eq!(res.status, StatusCode::CREATED);
    let vault = res.data();
    assert_eq!(vault["name"], "Protein Folding");
    assert_eq!(vault["description"], "AlphaFold papers");
    assert_eq!(vault["role"], "OWNER");
    assert_eq!(vault["ownerId"], owner.id.to_string());
    assert_eq!(vault["memberCount"], 1);
    assert_eq!(vault["sourceCount"], 0);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn create_vault_without_name_is_bad_request(ctx: &TestHarness) {
    let owner = create_user(ctx, "Owner").await;

    let res = ctx
        .api()
        .post("/vaults", owner.token(), json!({ "description": "no name" }))
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error(), "name is required");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn vault_routes_require_auth(ctx: &TestHarness) {
    let api = ctx.api();
    assert_eq!(api.get("/vaults", None).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        api.post("/vaults", None, json!({ "name": "x" })).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn list_vaults_shows_only_memberships(ctx: &TestHarness) {
    let fixture = vault_with_members(ctx).await;
    let outsider = create_user(ctx, "Outsider").await;
    create_vault(ctx, &outsider, "Private Notes").await;

    let api = ctx.api();

    let viewer_list = api.get("/vaults", fixture.viewer.token()).await.data();
    let viewer_vaults = viewer_list.as_array().unwrap();
    assert_eq!(viewer_vaults.len(), 1);
    assert_eq!(viewer_vaults[0]["id"], fixture.vault_id.to_string());
    assert_eq!(viewer_vaults[0]["role"], "VIEWER");
    assert_eq!(viewer_vaults[0]["memberCount"], 3);

    let outsider_list = api.get("/vaults", outsider.token()).await.data();
    assert_eq!(outsider_list.as_array().unwrap().len(), 1);
    assert_eq!(outsider_list[0]["name"], "Private Notes");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn vault_list_is_cached_and_invalidated(ctx: &TestHarness) {
    let owner = create_user(ctx, "Owner").await;
    let vault_id = create_vault(ctx, &owner, "Cached").await;
    let key = vault_list_key(owner.id);
    let api = ctx.api();

    assert!(ctx.cache.get(&key).await.unwrap().is_none());
    let first = api.get("/vaults", owner.token()).await.data();
    assert_eq!(first[0]["sourceCount"], 0);
    assert!(ctx.cache.get(&key).await.unwrap().is_some());

    // Adding a source changes the counts, so the list entry is dropped
    add_note(ctx, &owner, vault_id, "Fresh note").await;
    assert!(ctx.cache.get(&key).await.unwrap().is_none());

    let second = api.get("/vaults", owner.token()).await.data();
    assert_eq!(second[0]["sourceCount"], 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn get_vault_checks_membership(ctx: &TestHarness) {
    let fixture = vault_with_members(ctx).await;
    let outsider = create_user(ctx, "Outsider").await;
    let api = ctx.api();
    let path = format!("/vaults/{}", fixture.vault_id);

    let viewer = api.get(&path, fixture.viewer.token()).await;
    assert_eq!(viewer.status, StatusCode::OK);
    assert_eq!(viewer.data()["role"], "VIEWER");

    let outsider_res = api.get(&path, outsider.token()).await;
    assert_eq!(outsider_res.status, StatusCode::FORBIDDEN);

    let missing = api
        .get(&format!("/vaults/{}", uuid::Uuid::now_v7()), fixture.owner.token())
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let malformed = api.get("/vaults/not-a-uuid", fixture.owner.token()).await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.json()["success"], false);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn only_owner_updates_vault(ctx: &TestHarness) {
    let fixture = vault_with_members(ctx).await;
    let api = ctx.api();
    let path = format!("/vaults/{}", fixture.vault_id);

    let denied = api
        .patch(&path, fixture.contributor.token(), json!({ "name": "Hijacked" }))
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let empty = api.patch(&path, fixture.owner.token(), json!({})).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let renamed = api
        .patch(
            &path,
            fixture.owner.token(),
            json!({ "name": "Systematic Review", "description": null }),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK);
    let data = renamed.data();
    assert_eq!(data["name"], "Systematic Review");
    assert!(data["description"].is_null());
    assert_eq!(data["role"], "OWNER");
    assert_eq!(data["memberCount"], 3);
    assert_eq!(data["sourceCount"], 0);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn delete_vault_cascades_and_removes_files(ctx: &TestHarness) {
    let fixture = vault_with_members(ctx).await;
    let api = ctx.api();
    let path = format!("/vaults/{}", fixture.vault_id);

    let upload = api
        .post_multipart(
            &format!("{}/sources/upload", path),
            fixture.owner.token(),
            &[common::Part::file("data.csv", "text/csv", b"a,b\n1,2\n")],
        )
        .await;
    assert_eq!(upload.status, StatusCode::CREATED);
    assert_eq!(ctx.file_store.len(), 1);

    let denied = api.delete(&path, fixture.contributor.token()).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let deleted = api.delete(&path, fixture.owner.token()).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(ctx.file_store.len(), 0);

    let gone = api.get(&path, fixture.owner.token()).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);

    let viewer_list = api.get("/vaults", fixture.viewer.token()).await.data();
    assert!(viewer_list.as_array().unwrap().is_empty());

    let sources: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sources WHERE vault_id = $1")
        .bind(fixture.vault_id)
        .fetch_one(&ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(sources, 0);
}
