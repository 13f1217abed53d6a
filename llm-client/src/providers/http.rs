//! Response handling shared by the HTTP providers.

use reqwest::Response;
use reqwest::header::RETRY_AFTER;
use serde::Deserialize;

use crate::error::{LlmError, Result};

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Map a transport failure onto `LlmError`.
pub(crate) fn request_failed(e: reqwest::Error) -> LlmError {
    LlmError::ApiError {
        message: format!("Request failed: {}", e),
        status_code: None,
    }
}

/// Map a body that did not decode onto `LlmError`.
pub(crate) fn parse_failed(e: reqwest::Error) -> LlmError {
    LlmError::ApiError {
        message: format!("Failed to parse response: {}", e),
        status_code: None,
    }
}

/// Pass successful responses through; turn error statuses into typed errors.
///
/// All three API families wrap failures as `{"error": {"message": ...}}`.
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    let error_text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&error_text)
        .map(|e| e.error.message)
        .unwrap_or(error_text);

    Err(classify(status.as_u16(), retry_after, message))
}

pub(crate) fn classify(status: u16, retry_after: Option<u64>, message: String) -> LlmError {
    match status {
        429 => LlmError::RateLimited { retry_after },
        // 529 is Anthropic's "overloaded"
        503 | 529 => LlmError::ServerOverloaded { message },
        code => LlmError::ApiError {
            message,
            status_code: Some(code),
        },
    }
}
