use std::{
  backtrace::{Backtrace, BacktraceStatus},
  fmt::Display,
};

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};

/// Domain error taxonomy. One failing item never aborts a cycle or the
/// process; handlers and cycles map these into responses or log lines.
#[derive(Debug, thiserror::Error)]
pub enum AxiomError {
  /// DNS, connect, timeout, non-2xx. Recovered by reputation penalty and
  /// retry on the next cycle.
  #[error("network error: {0}")]
  Network(String),

  /// Constraint violation or driver failure. A duplicate `fact_id` is NOT
  /// reported through this variant — that collision is the corroboration
  /// signal.
  #[error("storage error: {0}")]
  Storage(String),

  /// Hash mismatch, bad chain link, content/id inconsistency. The offending
  /// object is dropped.
  #[error("validation error: {0}")]
  Validation(String),

  /// Corrupt compressed content or malformed peer JSON. The record is
  /// skipped; widespread occurrences count toward `SYNC_ERROR`.
  #[error("decode error: {0}")]
  Decode(String),

  /// Unreadable database or unreachable collaborator at startup. Fatal.
  #[error("config error: {0}")]
  Config(String),
}

impl From<sea_orm::DbErr> for AxiomError {
  fn from(err: sea_orm::DbErr) -> Self {
    Self::Storage(err.to_string())
  }
}

impl From<reqwest::Error> for AxiomError {
  fn from(err: reqwest::Error) -> Self {
    Self::Network(err.to_string())
  }
}

#[derive(Debug)]
pub struct AppError {
  err: anyhow::Error,
  status_code: StatusCode,
}

impl AppError {
  /// Create with 500 status
  pub fn new<E: Into<anyhow::Error>>(err: E) -> Self {
    Self {
      err: err.into(),
      status_code: StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  /// Create with custom status
  pub fn with_status<E: Into<anyhow::Error>>(status: StatusCode, err: E) -> Self {
    Self {
      err: err.into(),
      status_code: status,
    }
  }

  #[must_use]
  pub const fn status_code(&self) -> StatusCode {
    self.status_code
  }

  /// Get backtrace from anyhow (requires `RUST_BACKTRACE=1` to capture)
  pub fn backtrace(&self) -> &Backtrace {
    self.err.backtrace()
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let body = if cfg!(debug_assertions) {
      let bt = self.err.backtrace();
      if bt.status() == BacktraceStatus::Captured {
        format!("{}\nBacktrace:\n{}", self.err, bt)
      } else {
        format!(
          "{}\n(hint: set RUST_BACKTRACE=1 to enable backtrace)",
          self.err
        )
      }
    } else {
      self.err.to_string()
    };
    (self.status_code, body).into_response()
  }
}

impl Display for AppError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "[{}] {}", self.status_code, self.err)
  }
}

impl From<AxiomError> for AppError {
  fn from(err: AxiomError) -> Self {
    let status = match &err {
      AxiomError::Validation(_) => StatusCode::BAD_REQUEST,
      AxiomError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    Self::with_status(status, err)
  }
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    Self::new(err)
  }
}

impl From<sea_orm::DbErr> for AppError {
  fn from(err: sea_orm::DbErr) -> Self {
    Self::new(err)
  }
}

impl From<std::io::Error> for AppError {
  fn from(err: std::io::Error) -> Self {
    Self::new(err)
  }
}

impl From<serde_json::Error> for AppError {
  fn from(err: serde_json::Error) -> Self {
    Self::new(err)
  }
}
