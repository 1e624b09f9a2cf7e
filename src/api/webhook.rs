//! VK callback endpoint handlers
//!
//! Both handlers answer `200 text/plain` on every path. A malformed body is
//! logged and acknowledged rather than rejected: a 4xx would make VK redeliver
//! the same broken payload indefinitely.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use serde_json::Value;

use super::ApiState;
use crate::dispatch::ACK;
use crate::event::Envelope;

/// `POST /webhook` - JSON envelope transport
///
/// Takes the raw body instead of a `Json` extractor so deserialization
/// failures stay inside the acknowledgment contract instead of becoming an
/// axum rejection.
pub async fn receive(State(state): State<Arc<ApiState>>, body: String) -> String {
    let envelope: Envelope = match serde_json::from_str(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(error = %e, "malformed webhook body");
            return ACK.to_string();
        }
    };

    state.dispatcher.handle(&envelope).await.body().to_string()
}

/// `GET /webhook` - query-parameter transport
///
/// Alternate transport for the confirmation handshake: the same envelope
/// fields arrive as query parameters.
pub async fn receive_query(
    State(state): State<Arc<ApiState>>,
    Query(params): Query<HashMap<String, String>>,
) -> String {
    let Some(kind) = params.get("type").cloned() else {
        tracing::warn!("webhook query without type parameter");
        return ACK.to_string();
    };

    let envelope = Envelope {
        kind,
        object: Value::Null,
        group_id: params.get("group_id").and_then(|v| v.parse().ok()),
        secret: params.get("secret").cloned(),
    };

    state.dispatcher.handle(&envelope).await.body().to_string()
}
