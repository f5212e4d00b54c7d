use std::sync::Arc;

use axiom_shared::AppError;
use axiom_worker::NodeContext;
use axum::{Router, response::Html, routing::get};
use tokio::net::TcpListener;

use crate::{
  api,
  utils::{AppState, shutdown_signal},
};

#[axum::debug_handler]
async fn handler() -> Html<&'static str> {
  Html("<h1>Axiom Node</h1>")
}

pub async fn server(ctx: Arc<NodeContext>) -> Result<(), AppError> {
  let bind_addr = format!("0.0.0.0:{}", ctx.config.port);
  let app_state = AppState::new(ctx);

  let app = Router::new()
    .route("/", get(handler))
    .merge(api::app())
    .with_state(app_state);

  let listener = TcpListener::bind(&bind_addr).await?;

  tracing::info!("server started at http://{bind_addr}");

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;

  Ok(())
}
