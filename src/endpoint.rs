//! JSON wire contract for the toggle operation.
//!
//! Request: `{"habitId": 1, "date": "2024-03-05T09:30:00Z"}` (the time part
//! of `date` is ignored). Response: `{"completed": true, "entry": {...}}`.
//! Failures carry `{"error": "..."}` with an HTTP-style status.

use crate::error::ToggleError;
use crate::service::{ToggleResponse, ToggleService};
use crate::store::EntryStore;
use crate::types::{parse_day, HabitId, UserId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_UNAUTHORIZED: u16 = 401;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_CONFLICT: u16 = 409;
pub const STATUS_UNPROCESSABLE: u16 = 422;
pub const STATUS_INTERNAL: u16 = 500;

/// Body of a toggle request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    pub habit_id: HabitId,
    /// ISO-8601 date or date-time.
    pub date: String,
}

impl ToggleRequest {
    pub fn new(habit_id: HabitId, date: NaiveDate) -> Self {
        Self {
            habit_id,
            date: date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Status plus JSON body.
#[derive(Clone, Debug, PartialEq)]
pub struct EndpointResponse {
    pub status: u16,
    pub body: Value,
}

impl EndpointResponse {
    fn ok(response: &ToggleResponse) -> Self {
        match serde_json::to_value(response) {
            Ok(body) => Self {
                status: STATUS_OK,
                body,
            },
            Err(e) => Self::error(STATUS_INTERNAL, e.to_string()),
        }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP-style status for a toggle failure.
pub fn status_for(error: &ToggleError) -> u16 {
    match error {
        ToggleError::Unauthorized => STATUS_UNAUTHORIZED,
        ToggleError::NotFound { .. } => STATUS_NOT_FOUND,
        ToggleError::Conflict { .. } => STATUS_CONFLICT,
        ToggleError::FutureDate { .. } => STATUS_UNPROCESSABLE,
        ToggleError::Transient { .. } => STATUS_INTERNAL,
    }
}

/// Request handler in front of a [`ToggleService`].
pub struct ToggleEndpoint<S: EntryStore> {
    service: Arc<ToggleService<S>>,
}

impl<S: EntryStore> ToggleEndpoint<S> {
    pub fn new(service: Arc<ToggleService<S>>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<ToggleService<S>> {
        &self.service
    }

    /// Handle one request. `session` is the authenticated user, if any.
    pub fn handle(&self, session: Option<&UserId>, body: &[u8]) -> EndpointResponse {
        let Some(caller) = session else {
            return EndpointResponse::error(STATUS_UNAUTHORIZED, "authentication required");
        };

        let request: ToggleRequest = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(e) => {
                return EndpointResponse::error(
                    STATUS_BAD_REQUEST,
                    format!("invalid request: {e}"),
                )
            }
        };

        let Some(date) = parse_day(&request.date) else {
            return EndpointResponse::error(
                STATUS_BAD_REQUEST,
                format!("invalid date: {}", request.date),
            );
        };

        match self.service.toggle(caller, request.habit_id, date) {
            Ok(response) => EndpointResponse::ok(&response),
            Err(e) => {
                let status = status_for(&e);
                if status >= STATUS_INTERNAL {
                    warn!(habit_id = %request.habit_id, %date, error = %e, "toggle failed");
                }
                EndpointResponse::error(status, e.to_string())
            }
        }
    }
}
