mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn stranger_cannot_delete_comment() -> Result<()> {
    let server = common::ensure_server().await?;
    let author = common::new_session(server, "auth").await?;
    let stranger = common::new_session(server, "strg").await?;
    let video_id = common::upload_video(server, &author, "talk").await?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url(&format!("/videos/{}/comments", video_id)))
        .header("Authorization", author.bearer())
        .json(&json!({ "content": "first!" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    let comment_id = body["data"]["id"].as_str().unwrap_or_default().to_string();

    let res = client
        .delete(server.url(&format!("/comments/{}", comment_id)))
        .header("Authorization", stranger.bearer())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let listing: Value = client
        .get(server.url(&format!("/videos/{}/comments", video_id)))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(listing["data"]["total"], 1);
    assert_eq!(listing["data"]["items"][0]["content"], "first!");
    assert_eq!(listing["data"]["items"][0]["owner"]["username"], author.username);
    Ok(())
}

#[tokio::test]
async fn owner_edits_and_deletes_with_replies() -> Result<()> {
    let server = common::ensure_server().await?;
    let author = common::new_session(server, "thread").await?;
    let video_id = common::upload_video(server, &author, "thread").await?;
    let client = reqwest::Client::new();

    let parent: Value = client
        .post(server.url(&format!("/videos/{}/comments", video_id)))
        .header("Authorization", author.bearer())
        .json(&json!({ "content": "parent" }))
        .send()
        .await?
        .json()
        .await?;
    let parent_id = parent["data"]["id"].as_str().unwrap_or_default().to_string();

    let res = client
        .post(server.url(&format!("/videos/{}/comments", video_id)))
        .header("Authorization", author.bearer())
        .json(&json!({ "content": "reply", "parentComment": parent_id }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .patch(server.url(&format!("/comments/{}", parent_id)))
        .header("Authorization", author.bearer())
        .json(&json!({ "content": "edited" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .delete(server.url(&format!("/comments/{}", parent_id)))
        .header("Authorization", author.bearer())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let listing: Value = client
        .get(server.url(&format!("/videos/{}/comments", video_id)))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(listing["data"]["total"], 0);
    Ok(())
}

#[tokio::test]
async fn blank_comment_is_a_validation_error() -> Result<()> {
    let server = common::ensure_server().await?;
    let author = common::new_session(server, "blank").await?;
    let video_id = common::upload_video(server, &author, "quiet").await?;

    let res = reqwest::Client::new()
        .post(server.url(&format!("/videos/{}/comments", video_id)))
        .header("Authorization", author.bearer())
        .json(&json!({ "content": "   " }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "VALIDATION_ERROR");
    Ok(())
}
