// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// HTTP surface: generation, brainstorming, model listing, auth.
//
// Validation, rate limiting and auth are resolved here at the boundary;
// only well-formed generation requests reach the orchestrator. Responses
// use the `{code, message?, data?}` envelope throughout.

use crate::application::{AuthService, GenerationService};
use crate::domain::auth::AuthError;
use crate::domain::generation::GenerationRequest;
use crate::domain::novel::{ContextSource, NovelContext};
use crate::infrastructure::rate_limiter::FixedWindowLimiter;
use crate::presentation::sse::sse_response;
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::warn;

pub struct AppState {
    pub generation: Arc<GenerationService>,
    pub auth: Arc<AuthService>,
    pub context: Arc<dyn ContextSource>,
    pub limiter: Arc<FixedWindowLimiter>,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/ai/models", get(list_models))
        .route("/api/ai/generate", post(generate))
        .route("/api/ai/brainstorm", post(brainstorm))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "code": "OK" }))
}

async fn list_models(State(state): State<Arc<AppState>>) -> Json<Value> {
    let models = state.generation.local_models().await;
    Json(json!({ "code": "OK", "data": models }))
}

#[derive(Deserialize)]
struct GenerateBody {
    #[serde(default = "default_mode")]
    mode: String,
    #[serde(default)]
    context: Map<String, Value>,
    #[serde(default = "default_true")]
    stream: bool,
    provider: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    novel_id: Option<i64>,
}

fn default_mode() -> String {
    "continue".to_string()
}

fn default_true() -> bool {
    true
}

async fn generate(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(body): Json<GenerateBody>,
) -> Response {
    let decision = state.limiter.check(&addr.ip().to_string());
    if !decision.allowed {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "code": "RATE_LIMITED",
                "message": "请求过于频繁",
                "data": { "reset_in_seconds": decision.reset_in_seconds },
            })),
        )
            .into_response();
    }

    let mut context = body.context;
    if let Some(novel_id) = body.novel_id {
        match state.context.novel_context(novel_id).await {
            Ok(Some(novel_context)) => merge_novel_context(&mut context, novel_context),
            Ok(None) => {}
            Err(e) => warn!(novel_id, error = %e, "failed to build novel context"),
        }
    }

    let request = GenerationRequest {
        mode: body.mode,
        context,
        stream: body.stream,
        provider: body.provider,
        model: body.model,
        api_key: body.api_key,
        base_url: body.base_url,
    };

    if request.stream {
        let fragments = state.generation.stream(&request).await;
        return sse_response(fragments).into_response();
    }

    match state.generation.generate(&request).await {
        Ok(content) => Json(json!({ "code": "OK", "data": { "content": content } })).into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "code": "UPSTREAM_ERROR", "message": e.to_string() })),
        )
            .into_response(),
    }
}

/// Merge externally-assembled context under the caller's context: caller
/// keys win on collision.
fn merge_novel_context(context: &mut Map<String, Value>, novel: NovelContext) {
    let fields = [
        ("novel_title", novel.novel_title),
        ("novel_summary", novel.novel_summary),
        ("previous_text", novel.previous_text),
        ("character_summary", novel.character_summary),
    ];
    for (key, value) in fields {
        if !context.contains_key(key) {
            context.insert(key.to_string(), Value::String(value));
        }
    }
}

#[derive(Deserialize)]
struct BrainstormBody {
    #[serde(default = "default_brainstorm_type")]
    r#type: String,
    /// Anything that is not an array is treated as no keywords.
    #[serde(default)]
    keywords: Value,
    provider: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
}

fn default_brainstorm_type() -> String {
    "outline".to_string()
}

async fn brainstorm(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BrainstormBody>,
) -> Response {
    let keywords = match body.keywords {
        Value::Array(items) => items,
        _ => Vec::new(),
    };
    let mut context = Map::new();
    context.insert("keywords".to_string(), Value::Array(keywords));

    let request = GenerationRequest {
        mode: body.r#type,
        context,
        stream: false,
        provider: body.provider,
        model: body.model,
        api_key: body.api_key,
        base_url: body.base_url,
    };

    match state.generation.generate(&request).await {
        Ok(content) => Json(json!({ "code": "OK", "data": { "content": content } })).into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "code": "UPSTREAM_ERROR", "message": e.to_string() })),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
struct CredentialsBody {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CredentialsBody>,
) -> Response {
    auth_response(state.auth.register(&body.username, &body.password).await)
}

async fn login(State(state): State<Arc<AppState>>, Json(body): Json<CredentialsBody>) -> Response {
    auth_response(state.auth.login(&body.username, &body.password).await)
}

fn auth_response(result: Result<crate::application::AuthSuccess, AuthError>) -> Response {
    match result {
        Ok(auth) => Json(json!({
            "code": "OK",
            "data": {
                "token": auth.token,
                "user": { "id": auth.user_id, "username": auth.username },
            },
        }))
        .into_response(),
        Err(e) => {
            let (status, code) = match &e {
                AuthError::InvalidInput => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
                AuthError::UsernameTaken => (StatusCode::CONFLICT, "USERNAME_TAKEN"),
                AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
                AuthError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
            };
            let message = match &e {
                AuthError::Internal(inner) => {
                    warn!(error = %inner, "auth operation failed internally");
                    "服务器内部错误".to_string()
                }
                other => other.to_string(),
            };
            (status, Json(json!({ "code": code, "message": message }))).into_response()
        }
    }
}
