//! The archetype sync handler.

use axum::{Json, body::Bytes, extract::State};
use tracing::{Span, instrument};

use crate::error::SyncError;
use crate::state::AppState;
use crate::sync::{SyncRequest, SyncResponse};

/// POST - find or create the customer and store the archetype.
///
/// The body is decoded from raw bytes so a missing or wrong content type
/// still yields the JSON error contract rather than an extractor rejection.
#[instrument(skip(state, body), fields(body_len = body.len(), email = tracing::field::Empty))]
pub async fn sync_archetype(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SyncResponse>, SyncError> {
    let request = SyncRequest::from_json(&body)?;
    Span::current().record("email", tracing::field::display(&request.email));

    let outcome = state.sync_service().sync(&request).await?;

    Ok(Json(SyncResponse::from(outcome)))
}

/// Any method other than POST on a sync path.
pub async fn method_not_allowed() -> SyncError {
    SyncError::MethodNotAllowed
}
