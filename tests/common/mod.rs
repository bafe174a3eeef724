#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Memory backends keep the binary self-contained: no database, no media host.
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_vidshare-api"));
        cmd.env("VIDSHARE_PORT", port.to_string())
            .env("VIDSHARE_HOST", "127.0.0.1")
            .env("APP_ENV", "development")
            .env("STORAGE_BACKEND", "memory")
            .env("MEDIA_BACKEND", "memory")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/api/v1/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// A registered user plus a client that sends their access token.
pub struct Session {
    pub id: String,
    pub username: String,
    pub password: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl Session {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Lowercase name that will not collide with other tests sharing the server.
pub fn unique_name(prefix: &str) -> String {
    format!("{}{}", prefix, &uuid::Uuid::new_v4().simple().to_string()[..10])
}

pub fn image_part(name: &str) -> Result<Part> {
    Ok(Part::bytes(vec![0x89, b'P', b'N', b'G', 1, 2, 3]).file_name(format!("{}.png", name)).mime_str("image/png")?)
}

pub fn video_part() -> Result<Part> {
    Ok(Part::bytes(vec![0, 0, 0, 24, b'f', b't', b'y', b'p']).file_name("clip.mp4").mime_str("video/mp4")?)
}

pub async fn register(server: &TestServer, username: &str, password: &str) -> Result<reqwest::Response> {
    let form = Form::new()
        .text("username", username.to_string())
        .text("email", format!("{}@example.com", username))
        .text("fullName", format!("{} Tester", username))
        .text("password", password.to_string())
        .part("avatar", image_part("avatar")?);

    Ok(reqwest::Client::new()
        .post(server.url("/users/register"))
        .multipart(form)
        .send()
        .await?)
}

/// Register then log in a fresh user.
pub async fn new_session(server: &TestServer, prefix: &str) -> Result<Session> {
    let username = unique_name(prefix);
    let password = "correct horse battery".to_string();

    let res = register(server, &username, &password).await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.text().await?);

    let res = reqwest::Client::new()
        .post(server.url("/users/login"))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.text().await?);
    let body: Value = res.json().await?;

    Ok(Session {
        id: body["data"]["user"]["id"].as_str().context("user id")?.to_string(),
        username,
        password,
        access_token: body["data"]["access_token"].as_str().context("access token")?.to_string(),
        refresh_token: body["data"]["refresh_token"].as_str().context("refresh token")?.to_string(),
    })
}

/// Upload a published video owned by `session`; returns its id.
pub async fn upload_video(server: &TestServer, session: &Session, title: &str) -> Result<String> {
    let form = Form::new()
        .text("title", title.to_string())
        .text("description", format!("All about {}", title))
        .part("videoFile", video_part()?)
        .part("thumbnail", image_part("thumb")?);

    let res = reqwest::Client::new()
        .post(server.url("/videos"))
        .header("Authorization", session.bearer())
        .multipart(form)
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "upload failed: {}", res.text().await?);
    let body: Value = res.json().await?;
    Ok(body["data"]["id"].as_str().context("video id")?.to_string())
}
