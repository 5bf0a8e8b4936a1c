//! HTTP error type. Every handler failure funnels through [`ApiError`], which
//! logs the detail and answers with a `{message}` body.

use axum::{
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::AuthError;
use crate::gateway::SaveError;
use crate::protocol::MessageOut;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("Invalid payload.")]
  InvalidJsonBody(#[from] JsonRejection),

  #[error("{0}")]
  BadRequest(String),

  #[error("{0}")]
  Unauthorized(String),

  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  #[error("An internal server error has occurred.")]
  Internal(String),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::InvalidJsonBody(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  pub fn not_found(what: &str) -> Self {
    ApiError::NotFound(format!("{what} not found"))
  }
}

impl From<SaveError> for ApiError {
  fn from(e: SaveError) -> Self {
    match e {
      SaveError::EmptyTitle => ApiError::BadRequest(e.to_string()),
      SaveError::AuthRequired => ApiError::Unauthorized(e.to_string()),
      SaveError::Forbidden => ApiError::Forbidden(e.to_string()),
      SaveError::NotFound => ApiError::NotFound(e.to_string()),
      SaveError::Unavailable(detail) => ApiError::Internal(detail),
    }
  }
}

impl From<AuthError> for ApiError {
  fn from(e: AuthError) -> Self {
    match e {
      AuthError::MissingCredentials | AuthError::UsernameTaken => ApiError::BadRequest(e.to_string()),
      AuthError::InvalidCredentials => ApiError::Unauthorized(e.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    match &self {
      ApiError::InvalidJsonBody(rejection) => {
        warn!(target: "htmlpractice", %status, detail = %rejection.body_text(), "Rejected request body");
      }
      ApiError::Internal(detail) => {
        error!(target: "htmlpractice", %status, %detail, "Internal error");
      }
      other => {
        warn!(target: "htmlpractice", %status, message = %other, "Request failed");
      }
    }
    (status, Json(MessageOut { message: self.to_string() })).into_response()
  }
}
