//! How the client reaches the toggle endpoint.

use crate::endpoint::{
    ToggleEndpoint, ToggleRequest, STATUS_CONFLICT, STATUS_NOT_FOUND, STATUS_UNAUTHORIZED,
};
use crate::error::ToggleError;
use crate::service::ToggleResponse;
use crate::store::EntryStore;
use crate::types::{parse_day, UserId};
use std::sync::Arc;

/// The client's view of the network: one blocking toggle request.
///
/// Implementations map every failure onto [`ToggleError`]; timeouts,
/// disconnects and 5xx answers become [`ToggleError::Transient`].
pub trait ToggleTransport: Send + Sync {
    fn send_toggle(&self, request: &ToggleRequest) -> Result<ToggleResponse, ToggleError>;
}

/// Transport that drives a [`ToggleEndpoint`] in process, through the JSON
/// encoding.
pub struct EndpointTransport<S: EntryStore> {
    endpoint: Arc<ToggleEndpoint<S>>,
    session: Option<UserId>,
}

impl<S: EntryStore> EndpointTransport<S> {
    pub fn new(endpoint: Arc<ToggleEndpoint<S>>, session: Option<UserId>) -> Self {
        Self { endpoint, session }
    }
}

impl<S: EntryStore> ToggleTransport for EndpointTransport<S> {
    fn send_toggle(&self, request: &ToggleRequest) -> Result<ToggleResponse, ToggleError> {
        let body = serde_json::to_vec(request)
            .map_err(|e| ToggleError::transient(format!("encode request: {e}")))?;

        let response = self.endpoint.handle(self.session.as_ref(), &body);
        if response.is_success() {
            return serde_json::from_value(response.body)
                .map_err(|e| ToggleError::transient(format!("decode response: {e}")));
        }

        let message = response.body["error"].as_str().unwrap_or_default().to_string();
        Err(match response.status {
            STATUS_UNAUTHORIZED => ToggleError::Unauthorized,
            STATUS_NOT_FOUND => ToggleError::NotFound {
                habit_id: request.habit_id,
            },
            STATUS_CONFLICT => match parse_day(&request.date) {
                Some(date) => ToggleError::Conflict {
                    habit_id: request.habit_id,
                    date,
                },
                None => ToggleError::transient(message),
            },
            status => ToggleError::transient(format!("status {status}: {message}")),
        })
    }
}
