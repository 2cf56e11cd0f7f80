pub mod calendar;
pub mod users;

use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::error::TransportError;

pub use calendar::{Appointment, CalendarApi, Resource};
pub use users::{UserApi, UserDisplay, UserUpdate};

/// Fails with the HTTP status and whatever message the backend put in the
/// body; used by all API bindings.
pub(crate) async fn expect_success(response: Response) -> crate::Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| {
            body.get("message")
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

    Err(TransportError::Status {
        status: status.as_u16(),
        message,
    }
    .into())
}

pub(crate) async fn expect_json<T: DeserializeOwned>(response: Response) -> crate::Result<T> {
    let response = expect_success(response).await?;
    let body = response
        .json::<T>()
        .await
        .map_err(|err| TransportError::InvalidResponse(err.to_string()))?;
    Ok(body)
}
