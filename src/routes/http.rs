//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;

use axum::{
  extract::{rejection::JsonRejection, Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};

use crate::auth::AuthSession;
use crate::domain::Difficulty;
use crate::engine::evaluate;
use crate::error::ApiError;
use crate::gateway::SaveGateway;
use crate::preview::render_once;
use crate::protocol::*;
use crate::state::AppState;
use crate::validator::validate;

type ApiResult<T> = Result<T, ApiError>;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip_all)]
pub async fn http_validate(body: Result<Json<ValidateIn>, JsonRejection>) -> ApiResult<Json<ValidateOut>> {
  let Json(body) = body?;
  let errors = validate(&body.html);
  info!(target: "editor", html_len = body.html.len(), issues = errors.len(), "HTTP validate");
  Ok(Json(ValidateOut { valid: errors.is_empty(), errors }))
}

#[instrument(level = "info", skip_all)]
pub async fn http_preview(body: Result<Json<PreviewIn>, JsonRejection>) -> ApiResult<Json<PreviewOut>> {
  let Json(body) = body?;
  let frame = render_once(&body.html, body.viewport);
  Ok(Json(PreviewOut { frame: frame.frame, viewport: frame.viewport, width: frame.width }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_templates(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(state.templates.as_ref().clone())
}

#[instrument(level = "info", skip(state))]
pub async fn http_snippets(State(state): State<Arc<AppState>>, Query(q): Query<SnippetQuery>) -> impl IntoResponse {
  Json(state.search_snippets(q.q.as_deref().unwrap_or_default()))
}

// ---------- examples ----------

#[instrument(level = "info", skip(state))]
pub async fn http_list_examples(
  State(state): State<Arc<AppState>>,
  Query(q): Query<ExamplesQuery>,
) -> impl IntoResponse {
  let category = q.category.as_deref().filter(|c| !c.is_empty());
  Json(state.store.examples(category).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_example(State(state): State<Arc<AppState>>, Path(id): Path<u64>) -> ApiResult<impl IntoResponse> {
  let example = state.store.example(id).await.ok_or_else(|| ApiError::not_found("Example"))?;
  Ok(Json(example))
}

// ---------- challenges ----------

#[instrument(level = "info", skip(state))]
pub async fn http_list_challenges(
  State(state): State<Arc<AppState>>,
  Query(q): Query<ChallengeQuery>,
) -> ApiResult<impl IntoResponse> {
  let difficulty = match q.difficulty.as_deref().filter(|d| !d.is_empty()) {
    Some(d) => Some(d.parse::<Difficulty>().map_err(ApiError::BadRequest)?),
    None => None,
  };
  let out: Vec<ChallengeOut> = state.catalog.list(difficulty).iter().map(to_out).collect();
  Ok(Json(out))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_challenge(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
  let challenge = state.catalog.get(&id).ok_or_else(|| ApiError::not_found("Challenge"))?;
  Ok(Json(to_out(&challenge)))
}

/// Untimed check of a candidate against a challenge.
#[instrument(level = "info", skip(state, body))]
pub async fn http_check_challenge(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  body: Result<Json<CheckIn>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
  let Json(body) = body?;
  let challenge = state.catalog.get(&id).ok_or_else(|| ApiError::not_found("Challenge"))?;
  let evaluation = evaluate(&challenge, &body.code);
  info!(target: "challenge", %id, verdict = ?evaluation.verdict, missing = evaluation.missing.len(), "HTTP check evaluated");
  Ok(Json(CheckOut { verdict: evaluation.verdict, missing: evaluation.missing }))
}

// ---------- accounts ----------

#[instrument(level = "info", skip_all)]
pub async fn http_register(
  State(state): State<Arc<AppState>>,
  body: Result<Json<CredentialsIn>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
  let Json(body) = body?;
  let user = state.store.register(&body.username, &body.password).await?;
  Ok((StatusCode::CREATED, Json(UserOut { id: user.id, username: user.username })))
}

#[instrument(level = "info", skip_all)]
pub async fn http_login(
  State(state): State<Arc<AppState>>,
  body: Result<Json<CredentialsIn>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
  let Json(body) = body?;
  let (user, token) = state.store.login(&body.username, &body.password).await?;
  Ok(Json(LoginOut { id: user.id, username: user.username, token }))
}

#[instrument(level = "info", skip_all, fields(user_id = ?auth.user_id()))]
pub async fn http_logout(State(state): State<Arc<AppState>>, auth: AuthSession) -> impl IntoResponse {
  if let Some(token) = auth.token() {
    state.store.logout(token).await;
  }
  Json(MessageOut { message: "Logged out successfully".into() })
}

#[instrument(level = "info", skip_all)]
pub async fn http_current_user(auth: AuthSession) -> ApiResult<impl IntoResponse> {
  let user = auth.current_user().ok_or_else(|| ApiError::Unauthorized("Not authenticated".into()))?;
  Ok(Json(UserOut { id: user.id, username: user.username.clone() }))
}

// ---------- saved work ----------

#[instrument(level = "info", skip_all, fields(user_id = ?auth.user_id()))]
pub async fn http_save_work(
  State(state): State<Arc<AppState>>,
  auth: AuthSession,
  body: Result<Json<SaveWorkIn>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
  let Json(body) = body?;
  let work = state.gateway.save(&auth, &body.title, &body.code, body.is_public).await?;
  Ok((StatusCode::CREATED, Json(work)))
}

#[instrument(level = "info", skip(state, auth), fields(user_id = ?auth.user_id()))]
pub async fn http_get_saved_work(
  State(state): State<Arc<AppState>>,
  auth: AuthSession,
  Path(id): Path<u64>,
) -> ApiResult<impl IntoResponse> {
  Ok(Json(state.gateway.fetch(&auth, id).await?))
}

#[instrument(level = "info", skip_all, fields(user_id = ?auth.user_id()))]
pub async fn http_user_saved_work(State(state): State<Arc<AppState>>, auth: AuthSession) -> ApiResult<impl IntoResponse> {
  Ok(Json(state.gateway.list(&auth).await?))
}

#[instrument(level = "info", skip(state, auth), fields(user_id = ?auth.user_id()))]
pub async fn http_delete_saved_work(
  State(state): State<Arc<AppState>>,
  auth: AuthSession,
  Path(id): Path<u64>,
) -> ApiResult<impl IntoResponse> {
  state.gateway.delete(&auth, id).await?;
  Ok(Json(MessageOut { message: "Saved work deleted successfully".into() }))
}

#[cfg(test)]
mod tests {
  use axum::{
    body::{to_bytes, Body},
    http::{header, Request},
    Router,
  };
  use serde_json::{json, Value};
  use tower::ServiceExt;

  use super::*;
  use crate::routes::build_router;

  fn app() -> Router {
    build_router(Arc::new(AppState::for_tests()))
  }

  async fn call(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
      req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
      Some(b) => req.header(header::CONTENT_TYPE, "application/json").body(Body::from(b.to_string())),
      None => req.body(Body::empty()),
    }
    .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
  }

  async fn login(app: &Router, name: &str) -> String {
    let creds = json!({ "username": name, "password": "pw" });
    let (status, _) = call(app, "POST", "/api/register", None, Some(creds.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = call(app, "POST", "/api/login", None, Some(creds)).await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
  }

  #[tokio::test]
  async fn health_and_validate() {
    let app = app();
    let (status, body) = call(&app, "GET", "/api/health", None, None).await;
    assert_eq!((status, body), (StatusCode::OK, json!({ "ok": true })));

    let (_, body) = call(&app, "POST", "/api/validate", None, Some(json!({ "html": "<div><p>x</p></div>" }))).await;
    assert_eq!(body, json!({ "valid": true, "errors": [] }));

    let (_, body) = call(&app, "POST", "/api/validate", None, Some(json!({ "html": "<div><p>x</div>" }))).await;
    assert_eq!(body["valid"], false);
    assert_eq!(body["errors"][0]["line"], 1);

    let (status, body) = call(&app, "POST", "/api/validate", None, Some(json!({ "nope": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid payload.");
  }

  #[tokio::test]
  async fn preview_templates_and_snippets() {
    let app = app();
    let (_, body) = call(&app, "POST", "/api/preview", None, Some(json!({ "html": "<b>x</b>", "viewport": "tablet" }))).await;
    assert_eq!(body["width"], "768px");
    assert!(body["frame"].as_str().unwrap().contains("srcdoc=\"&lt;b&gt;x&lt;/b&gt;\""));

    let (_, body) = call(&app, "GET", "/api/templates", None, None).await;
    assert_eq!(body.as_array().unwrap().len(), 5);

    let (_, body) = call(&app, "GET", "/api/snippets?q=grid", None, None).await;
    assert_eq!(body[0]["id"], "grid");
  }

  #[tokio::test]
  async fn examples_by_category_and_id() {
    let app = app();
    let (_, all) = call(&app, "GET", "/api/examples", None, None).await;
    let (_, structure) = call(&app, "GET", "/api/examples?category=structure", None, None).await;
    assert!(structure.as_array().unwrap().len() < all.as_array().unwrap().len());
    let (status, body) = call(&app, "GET", "/api/examples/1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);
    let (status, body) = call(&app, "GET", "/api/examples/999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Example not found");
  }

  #[tokio::test]
  async fn challenges_hide_answers_and_check_untimed() {
    let app = app();
    let (_, list) = call(&app, "GET", "/api/challenges?difficulty=intermediate", None, None).await;
    let list = list.as_array().unwrap().clone();
    assert!(!list.is_empty());
    assert!(list.iter().all(|c| c["difficulty"] == "intermediate" && c.get("hint").is_none()));

    let (status, _) = call(&app, "GET", "/api/challenges?difficulty=expert", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, "GET", "/api/challenges/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let pass = json!({ "code": "<nav><ul><li>a</li></ul></nav>" });
    let (_, body) = call(&app, "POST", "/api/challenges/2/check", None, Some(pass)).await;
    assert_eq!(body, json!({ "verdict": "success", "missing": [] }));

    let fail = json!({ "code": "<nav></nav>" });
    let (_, body) = call(&app, "POST", "/api/challenges/2/check", None, Some(fail)).await;
    assert_eq!(body["verdict"], "failed");
    assert_eq!(body["missing"], json!(["<ul", "<li"]));
  }

  #[tokio::test]
  async fn account_flow() {
    let app = app();
    let (status, _) = call(&app, "GET", "/api/user", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = login(&app, "ada").await;
    let (_, me) = call(&app, "GET", "/api/user", Some(&token), None).await;
    assert_eq!(me["username"], "ada");

    let (status, body) = call(&app, "POST", "/api/register", None, Some(json!({ "username": "ada", "password": "x" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Username already exists");

    let (status, _) = call(&app, "POST", "/api/login", None, Some(json!({ "username": "ada", "password": "bad" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, "POST", "/api/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, "GET", "/api/user", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn saved_work_visibility_and_ownership() {
    let app = app();
    let (status, _) = call(&app, "POST", "/api/saved-work", None, Some(json!({ "title": "t", "code": "c" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let ada = login(&app, "ada").await;
    let bob = login(&app, "bob").await;

    let (status, _) = call(&app, "POST", "/api/saved-work", Some(&ada), Some(json!({ "title": " ", "code": "c" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, private) =
      call(&app, "POST", "/api/saved-work", Some(&ada), Some(json!({ "title": "Secret", "code": "<p>" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(private["isPublic"], false);
    let id = private["id"].as_u64().unwrap();

    let (status, _) = call(&app, "GET", &format!("/api/saved-work/{id}"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = call(&app, "GET", &format!("/api/saved-work/{id}"), Some(&ada), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, public) = call(
      &app,
      "POST",
      "/api/saved-work",
      Some(&ada),
      Some(json!({ "title": "Shared", "code": "<p>", "isPublic": true })),
    )
    .await;
    let public_id = public["id"].as_u64().unwrap();
    let (status, _) = call(&app, "GET", &format!("/api/saved-work/{public_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, mine) = call(&app, "GET", "/api/user/saved-work", Some(&ada), None).await;
    assert_eq!(mine.as_array().unwrap().len(), 2);

    let (status, _) = call(&app, "DELETE", &format!("/api/saved-work/{id}"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = call(&app, "DELETE", &format!("/api/saved-work/{id}"), Some(&ada), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Saved work deleted successfully");
    let (status, _) = call(&app, "GET", &format!("/api/saved-work/{id}"), Some(&ada), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }
}
