#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::json;

use gardensync::model::config::AppConfig;
use gardensync::model::settings::Settings;
use gardensync::model::theme::{BaseMode, ThemeDescriptor};

pub const TOKEN: &str = "ghp_test";
pub const CSS_URL: &str = "https://raw.githubusercontent.com/o/sample/master/obsidian.css";

/// A PUT the fake API received, content already decoded.
#[derive(Debug, Clone)]
pub struct PutRecord {
    pub path: String,
    pub message: String,
    pub content: String,
    pub sha: Option<String>,
}

#[derive(Debug, Default)]
pub struct RepoState {
    /// path -> (text, sha)
    pub files: HashMap<String, (String, String)>,
    pub puts: Vec<PutRecord>,
    pub requests: usize,
    pub fail_reads_with: Option<StatusCode>,
    pub conflict_next_put: bool,
    /// Served verbatim at `/themes.json`.
    pub catalog: serde_json::Value,
    pub fail_catalog_with: Option<StatusCode>,
    next_sha: u64,
}

impl RepoState {
    fn mint_sha(&mut self) -> String {
        self.next_sha += 1;
        format!("sha-{}", self.next_sha)
    }
}

/// In-process stand-in for the GitHub contents endpoint of `octo/garden`.
pub struct FakeGitHub {
    pub base_url: String,
    pub state: Arc<Mutex<RepoState>>,
}

impl FakeGitHub {
    pub fn seed(&self, path: &str, text: &str, sha: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .files
            .insert(path.to_string(), (text.to_string(), sha.to_string()));
    }

    pub fn puts(&self) -> Vec<PutRecord> {
        self.state.lock().unwrap().puts.clone()
    }

    pub fn requests(&self) -> usize {
        self.state.lock().unwrap().requests
    }

    pub fn file(&self, path: &str) -> Option<(String, String)> {
        self.state.lock().unwrap().files.get(path).cloned()
    }

    pub fn serve_catalog(&self, catalog: serde_json::Value) {
        self.state.lock().unwrap().catalog = catalog;
    }

    pub fn fail_catalog(&self, status: StatusCode) {
        self.state.lock().unwrap().fail_catalog_with = Some(status);
    }
}

type Shared = Arc<Mutex<RepoState>>;

pub async fn spawn_github() -> Result<FakeGitHub> {
    let state: Shared = Arc::default();
    let app = Router::new()
        .route(
            "/repos/:owner/:repo/contents/*path",
            get(get_contents).put(put_contents),
        )
        .route("/themes.json", get(get_catalog))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("bind fake github")?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(FakeGitHub {
        base_url: format!("http://{addr}"),
        state,
    })
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"message": "Not Found"}))).into_response()
}

async fn get_contents(
    State(state): State<Shared>,
    Path((owner, repo, path)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().unwrap();
    state.requests += 1;

    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Bad credentials"})))
            .into_response();
    }
    if (owner.as_str(), repo.as_str()) != ("octo", "garden") {
        return not_found();
    }
    if let Some(status) = state.fail_reads_with {
        return (status, Json(json!({"message": "injected"}))).into_response();
    }

    let path = path.trim_start_matches('/').to_string();
    let Some((text, sha)) = state.files.get(&path) else {
        return not_found();
    };

    // The real API wraps base64 at 60 columns.
    let encoded = STANDARD.encode(text.as_bytes());
    let wrapped = encoded
        .as_bytes()
        .chunks(60)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("\n");

    Json(json!({
        "type": "file",
        "path": path,
        "sha": sha,
        "encoding": "base64",
        "content": format!("{wrapped}\n"),
    }))
    .into_response()
}

async fn get_catalog(State(state): State<Shared>) -> Response {
    let state = state.lock().unwrap();
    if let Some(status) = state.fail_catalog_with {
        return (status, "injected").into_response();
    }
    Json(state.catalog.clone()).into_response()
}

#[derive(Debug, Deserialize)]
struct PutBody {
    message: String,
    content: String,
    #[serde(default)]
    sha: Option<String>,
}

async fn put_contents(
    State(state): State<Shared>,
    Path((owner, repo, path)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<PutBody>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.requests += 1;

    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Bad credentials"})))
            .into_response();
    }
    if (owner.as_str(), repo.as_str()) != ("octo", "garden") {
        return not_found();
    }

    let path = path.trim_start_matches('/').to_string();
    let content = match STANDARD.decode(body.content.as_bytes()) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => {
            return (StatusCode::BAD_REQUEST, Json(json!({"message": "bad base64"})))
                .into_response();
        }
    };
    state.puts.push(PutRecord {
        path: path.clone(),
        message: body.message,
        content: content.clone(),
        sha: body.sha.clone(),
    });

    if std::mem::take(&mut state.conflict_next_put) {
        return (StatusCode::CONFLICT, Json(json!({"message": "injected conflict"})))
            .into_response();
    }

    let current = state.files.get(&path).map(|(_, sha)| sha.clone());
    match (current, body.sha) {
        (Some(_), None) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({"message": "\"sha\" wasn't supplied."})),
            )
                .into_response();
        }
        (Some(current), Some(sent)) if current != sent => {
            return (
                StatusCode::CONFLICT,
                Json(json!({"message": format!("{path} does not match {sent}")})),
            )
                .into_response();
        }
        (None, Some(_)) => return not_found(),
        _ => {}
    }

    let created = !state.files.contains_key(&path);
    let sha = state.mint_sha();
    state.files.insert(path.clone(), (content, sha.clone()));

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (
        status,
        Json(json!({
            "content": {"path": path, "sha": sha},
            "commit": {"sha": format!("commit-{sha}"), "message": "Update theme"},
        })),
    )
        .into_response()
}

pub fn config_for(github: &FakeGitHub) -> AppConfig {
    let mut config = AppConfig::defaults().expect("embedded defaults parse");
    config.github.api_base_url = github.base_url.clone();
    config.themes.catalog_url = format!("{}/themes.json", github.base_url);
    config
}

pub fn theme(modes: &[&str]) -> ThemeDescriptor {
    ThemeDescriptor {
        name: "Sample".to_string(),
        repo: "o/sample".to_string(),
        branch: None,
        modes: modes.iter().map(|m| m.to_string()).collect(),
        css_url: CSS_URL.to_string(),
    }
}

pub fn settings(modes: &[&str], base: BaseMode) -> Settings {
    Settings {
        github_repo: "garden".to_string(),
        github_user_name: "octo".to_string(),
        github_token: TOKEN.to_string(),
        base_theme: base,
        theme: Some(theme(modes)),
        ..Settings::default()
    }
}

/// Poll a std channel without blocking the async runtime.
pub async fn recv<T>(rx: &std::sync::mpsc::Receiver<T>) -> Result<T> {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        match rx.try_recv() {
            Ok(value) => return Ok(value),
            Err(std::sync::mpsc::TryRecvError::Empty) if Instant::now() < deadline => {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            Err(err) => anyhow::bail!("no message: {err}"),
        }
    }
}
