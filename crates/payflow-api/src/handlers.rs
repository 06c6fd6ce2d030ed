//! # Request Handlers
//!
//! Axum request handlers for the payment endpoints.
//!
//! `pay` and `callback` are deliberately outside any session middleware:
//! they are reached by the payer's browser mid-redirect and by the
//! provider's servers, neither of which holds a session. The payer never
//! sees internal error detail, only the generic error body.

use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use payflow_core::{CallbackAck, CallbackRequest, PaymentError, TransactionId};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{error, info, instrument};

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

fn payment_error_to_response(err: PaymentError) -> (StatusCode, Json<ErrorResponse>) {
    let code = err.status_code();
    let response = ErrorResponse::new(err.to_string(), code);
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "payflow",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Initiate payment: 302 to the provider-hosted checkout
#[instrument(skip_all, fields(provider = %provider, transaction_id = %transaction_id))]
pub async fn pay_redirect(
    State(state): State<AppState>,
    Path((provider, transaction_id)): Path<(String, String)>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let id = TransactionId::parse(&transaction_id).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                format!("Malformed transaction id: {}", transaction_id),
                400,
            )),
        )
    })?;

    let redirect = state
        .flow
        .pay(&provider, id, &state.redirect_context())
        .await
        .map_err(|e| {
            error!("Failed to initiate payment: {}", e);
            payment_error_to_response(e)
        })?;

    info!("Redirecting payer to {} checkout", redirect.provider);

    Ok((StatusCode::FOUND, [(header::LOCATION, redirect.url)]).into_response())
}

/// Reconcile a provider callback.
///
/// Providers retry on non-2xx, so only a successfully applied (or
/// idempotently re-affirmed) event returns 200.
#[instrument(skip_all, fields(provider = %provider))]
pub async fn payment_callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<CallbackAck>, (StatusCode, Json<ErrorResponse>)> {
    let request = CallbackRequest {
        query,
        body: body.to_vec(),
    };

    let ack = state
        .flow
        .callback(&provider, &request)
        .await
        .map_err(|e| {
            error!("Failed to reconcile callback: {}", e);
            payment_error_to_response(e)
        })?;

    info!(
        "Callback reconciled: reference={}, status={}",
        ack.reference, ack.status
    );

    Ok(Json(ack))
}
