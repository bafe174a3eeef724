mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn playlist_lifecycle() -> Result<()> {
    let server = common::ensure_server().await?;
    let owner = common::new_session(server, "curator").await?;
    let first = common::upload_video(server, &owner, "first").await?;
    let second = common::upload_video(server, &owner, "second").await?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/playlists"))
        .header("Authorization", owner.bearer())
        .json(&json!({ "name": "Favourites", "videoId": first }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    let playlist_id = body["data"]["id"].as_str().unwrap_or_default().to_string();
    assert_eq!(body["data"]["total_videos"], 1);

    let body: Value = client
        .patch(server.url(&format!("/playlists/{}/videos/{}", playlist_id, second)))
        .header("Authorization", owner.bearer())
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["data"]["videos"][0]["id"], second);
    assert_eq!(body["data"]["videos"][1]["id"], first);

    let res = client
        .patch(server.url(&format!("/playlists/{}/videos/{}", playlist_id, second)))
        .header("Authorization", owner.bearer())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .delete(server.url(&format!("/playlists/{}/videos/{}", playlist_id, first)))
        .header("Authorization", owner.bearer())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let listing: Value = reqwest::get(server.url(&format!("/channels/{}/playlists", owner.id))).await?.json().await?;
    assert_eq!(listing["data"][0]["name"], "Favourites");
    assert_eq!(listing["data"][0]["total_videos"], 1);

    let res = client
        .delete(server.url(&format!("/playlists/{}", playlist_id)))
        .header("Authorization", owner.bearer())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(server.url(&format!("/playlists/{}", playlist_id))).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn stranger_cannot_rename_playlist() -> Result<()> {
    let server = common::ensure_server().await?;
    let owner = common::new_session(server, "plown").await?;
    let stranger = common::new_session(server, "plstr").await?;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(server.url("/playlists"))
        .header("Authorization", owner.bearer())
        .json(&json!({ "name": "Mine" }))
        .send()
        .await?
        .json()
        .await?;
    let playlist_id = body["data"]["id"].as_str().unwrap_or_default().to_string();

    let res = client
        .patch(server.url(&format!("/playlists/{}", playlist_id)))
        .header("Authorization", stranger.bearer())
        .json(&json!({ "name": "Theirs" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let body: Value = client.get(server.url(&format!("/playlists/{}", playlist_id))).send().await?.json().await?;
    assert_eq!(body["data"]["name"], "Mine");
    Ok(())
}

#[tokio::test]
async fn malformed_playlist_id_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::get(server.url("/playlists/not-a-valid-id")).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "MALFORMED_ID");
    Ok(())
}
