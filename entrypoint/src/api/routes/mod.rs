pub(crate) mod error_message_erasure;
pub(crate) mod import;

use std::sync::Arc;

use axum::{Router, routing::post};

use crate::{ServerState, service_layers::build_service_layers};

pub(crate) fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/import", post(import::import_handler))
        .layer(build_service_layers())
        .with_state(state)
}
