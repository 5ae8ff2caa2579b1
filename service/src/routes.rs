// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! HTTP route handlers for the key pipeline service.
//!
//! This module provides the following endpoints:
//!
//! | Method | Path | Handler | Description |
//! |--------|------|---------|-------------|
//! | GET | `/health` | [`health`] | Health check endpoint |
//! | POST | `/provision` | [`provision`] | One-time endpoint bootstrap |
//! | POST | `/events` | [`events`] | Object-created notifications |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde_json::json;
use sftp_key_pipeline::models::{BootstrapRequest, IngestOutcome};
use sftp_key_pipeline::naming;
use validator::Validate;

use crate::application::AppState;
use crate::constants::MAX_RECORDS_COUNT;
use crate::errors::AppError;
use crate::models::{EventDocument, EventSummary, ProvisionRequest, ProvisionResponse};

/// Health check endpoint.
///
/// Returns a simple JSON response indicating the service is running.
///
/// # Response
///
/// ```json
/// {"status": "ok"}
/// ```
pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Runs the one-time environment bootstrap.
///
/// Called by the deployment orchestrator on environment create, update and
/// delete. The run is convergent: replaying it with the same properties
/// reports success without touching any state.
///
/// # Request Flow
///
/// 1. Validate the incoming [`ProvisionRequest`]
/// 2. Merge request properties over the deployed configuration
/// 3. Run the bootstrap: resolve both key pairs, validate them, propagate
///    to the endpoint and the credential store
/// 4. Report the outcome in the response document
///
/// # Response
///
/// Always HTTP 200 for a request that parses and validates. Business
/// failures (invalid pair, adapter faults) come back as
/// `{"status": "FAILED", ...}` with a reason, so the orchestrator reads one
/// contract for both outcomes.
///
/// # Errors
///
/// - [`AppError::ValidationError`] - Request validation failed
#[tracing::instrument(skip(state, request))]
pub async fn provision(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProvisionRequest>,
) -> Result<Json<ProvisionResponse>, AppError> {
    // 1. Validate incoming request against size limits and format rules
    tracing::debug!(
        "[service] validating provision request ({:?})",
        request.request_type
    );
    request.validate().map_err(|e| {
        tracing::error!("[service] provision validation failed: {}", e);
        AppError::ValidationError(e.to_string())
    })?;

    // 2. Explicit request properties win over the deployed options
    let settings = request.properties.merged(&state.options);
    let bootstrap_request = BootstrapRequest {
        trigger: request.request_type,
        physical_id: request.physical_id.clone(),
        user_name: request.properties.user_name.clone(),
        host_material: request.properties.host_key.as_ref().map(Into::into),
        user_material: request.properties.user_key.as_ref().map(Into::into),
        settings,
    };

    // 3. Run the bootstrap; a failed run is a business outcome the
    //    orchestrator must see, not a transport error
    match state.bootstrap.handle(&bootstrap_request).await {
        Ok(output) => {
            tracing::info!(
                "[service] bootstrap {} finished: {:?}",
                output.physical_id,
                output.action
            );
            Ok(Json(ProvisionResponse::success(output)))
        }
        Err(err) => {
            tracing::error!("[service] bootstrap failed: {:?}", err);
            let physical_id = bootstrap_request.physical_id.clone().unwrap_or_else(|| {
                naming::bootstrap_physical_id(&bootstrap_request.settings.stage)
            });
            Ok(Json(ProvisionResponse::failure(
                Some(physical_id),
                err.to_string(),
            )))
        }
    }
}

/// Processes a batch of object-created notifications.
///
/// Called by the storage notification fan-out, one document per delivery,
/// with at-least-once semantics. Reprocessing a record is side-effect-free
/// beyond redundant idempotent writes.
///
/// # Request Flow
///
/// 1. Bound the number of records one document can carry
/// 2. For each record: skip records for buckets other than the configured
///    key bucket, URL-decode the object key, and run the ingest pipeline
/// 3. Return one outcome per record
///
/// # Errors
///
/// - [`AppError::ValidationError`] - Too many records in one document
/// - [`AppError::TransientFault`] - A read or write failed mid-flight; the
///   whole document maps to HTTP 500 so the event source redelivers it
#[tracing::instrument(skip(state, document))]
pub async fn events(
    State(state): State<Arc<AppState>>,
    Json(document): Json<EventDocument>,
) -> Result<Json<EventSummary>, AppError> {
    // 1. Bound the work a single document can demand
    if document.records.len() > MAX_RECORDS_COUNT {
        tracing::error!(
            "[service] event document carries {} records, limit is {}",
            document.records.len(),
            MAX_RECORDS_COUNT
        );
        return Err(AppError::ValidationError(format!(
            "too many records in one document: {}",
            document.records.len()
        )));
    }

    // 2. Process records in order; outcomes line up with records
    let mut outcomes = Vec::with_capacity(document.records.len());
    for record in &document.records {
        let key = record.s3.object.decoded_key();

        // the notification wiring is scoped to the key bucket; records for
        // any other bucket are not ours
        if record.s3.bucket.name != state.options.key_bucket {
            tracing::debug!(
                "[service] skipping record for unrelated bucket {}",
                record.s3.bucket.name
            );
            outcomes.push(IngestOutcome::Ignored { key });
            continue;
        }

        let outcome = state.ingest.process(&key).await?;
        tracing::info!("[service] processed {}: {:?}", key, outcome);
        outcomes.push(outcome);
    }

    Ok(Json(EventSummary { outcomes }))
}
