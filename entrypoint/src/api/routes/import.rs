use std::sync::Arc;

use axum::{Json, debug_handler, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::{ServerState, routes::error_message_erasure::ApiError};

/// Entries stay raw JSON so one bad record cannot fail the whole batch;
/// each is validated by the worker that picks it up
#[derive(Debug, Deserialize)]
pub(crate) struct ImportBatch {
    products: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ImportAck {
    message: String,
    queued: usize,
    rejected: usize,
}

#[debug_handler]
pub(crate) async fn import_handler(
    State(state): State<Arc<ServerState>>,
    WithRejection(Json(batch), _): WithRejection<Json<ImportBatch>, ApiError>,
) -> Result<impl IntoResponse, StatusCode> {
    let mut queued = 0;
    let mut rejected = 0;

    for (position, unit) in batch.products.into_iter().enumerate() {
        if !unit.is_object() {
            debug!("Rejecting entry {position}, it is not an object: {unit}");
            rejected += 1;

            continue;
        }

        if let Err(err) = state.queue.enqueue(unit).await {
            error!("Failed to enqueue entry {position}: {err}");

            return Err(StatusCode::SERVICE_UNAVAILABLE);
        }

        queued += 1;
    }

    info!("Queued {queued} products for import, rejected {rejected}");

    let ack = ImportAck {
        message: format!("Import successfully queued for {queued} products."),
        queued,
        rejected,
    };

    Ok((StatusCode::ACCEPTED, Json(ack)))
}
