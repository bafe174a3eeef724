mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn register_login_and_fetch_current_user() -> Result<()> {
    let server = common::ensure_server().await?;
    let session = common::new_session(server, "ada").await?;

    let res = reqwest::Client::new()
        .get(server.url("/users/current-user"))
        .header("Authorization", session.bearer())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["username"], session.username);
    assert!(body["data"].get("password_hash").is_none());
    assert!(body["data"].get("refresh_token").is_none());
    Ok(())
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() -> Result<()> {
    let server = common::ensure_server().await?;
    let session = common::new_session(server, "dup").await?;

    let res = common::register(server, &session.username, "another password").await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "CONFLICT");
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let session = common::new_session(server, "pw").await?;

    let res = reqwest::Client::new()
        .post(server.url("/users/login"))
        .json(&json!({ "username": session.username, "password": "not the password" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "INVALID_CREDENTIALS");
    Ok(())
}

#[tokio::test]
async fn protected_route_without_token_is_unauthenticated() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(server.url("/users/current-user")).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "UNAUTHENTICATED");
    Ok(())
}

#[tokio::test]
async fn refresh_token_rotates_and_old_one_stops_working() -> Result<()> {
    let server = common::ensure_server().await?;
    let session = common::new_session(server, "rot").await?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/users/refresh-token"))
        .json(&json!({ "refreshToken": session.refresh_token }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let rotated = body["data"]["refresh_token"].as_str().unwrap_or_default().to_string();
    assert!(!rotated.is_empty());
    assert_ne!(rotated, session.refresh_token);

    let res = client
        .post(server.url("/users/refresh-token"))
        .json(&json!({ "refreshToken": session.refresh_token }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn logout_invalidates_refresh_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let session = common::new_session(server, "bye").await?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/users/logout"))
        .header("Authorization", session.bearer())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(server.url("/users/refresh-token"))
        .json(&json!({ "refreshToken": session.refresh_token }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn change_password_then_login_with_new_one() -> Result<()> {
    let server = common::ensure_server().await?;
    let session = common::new_session(server, "chg").await?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/users/change-password"))
        .header("Authorization", session.bearer())
        .json(&json!({ "oldPassword": session.password, "newPassword": "an even better secret" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(server.url("/users/login"))
        .json(&json!({ "email": format!("{}@example.com", session.username), "password": "an even better secret" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn channel_profile_counts_subscribers() -> Result<()> {
    let server = common::ensure_server().await?;
    let creator = common::new_session(server, "creator").await?;
    let fan = common::new_session(server, "fan").await?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url(&format!("/subscriptions/channels/{}/toggle", creator.id)))
        .header("Authorization", fan.bearer())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = client
        .get(server.url(&format!("/users/c/{}", creator.username)))
        .header("Authorization", fan.bearer())
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["data"]["subscribers_count"], 1);
    assert_eq!(body["data"]["is_subscribed"], true);

    let body: Value = client
        .get(server.url("/subscriptions/me"))
        .header("Authorization", fan.bearer())
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["data"][0]["username"], creator.username);
    Ok(())
}

#[tokio::test]
async fn cannot_subscribe_to_self() -> Result<()> {
    let server = common::ensure_server().await?;
    let me = common::new_session(server, "self").await?;

    let res = reqwest::Client::new()
        .post(server.url(&format!("/subscriptions/channels/{}/toggle", me.id)))
        .header("Authorization", me.bearer())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
