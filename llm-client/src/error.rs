use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error(
        "API key not found for {provider}. Set {env_var} environment variable or add to config."
    )]
    MissingApiKey { provider: String, env_var: String },

    #[error("Provider not available: {0}")]
    ProviderUnavailable(String),

    #[error("Rate limit exceeded{}", .retry_after.map(|s| format!(". Retry after {} seconds", s)).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },

    #[error("Server overloaded: {message}")]
    ServerOverloaded { message: String },

    #[error("API error{}: {message}", status_code.map(|c| format!(" (HTTP {})", c)).unwrap_or_default())]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    #[error("{provider} does not support {operation}")]
    Unsupported {
        provider: &'static str,
        operation: &'static str,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid model preset: {0}")]
    InvalidPreset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl LlmError {
    /// True when the provider refused the request because of quota or rate limits.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// True when the key was rejected (HTTP 401/403).
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::ApiError {
                status_code: Some(401 | 403),
                ..
            }
        )
    }

    /// Errors worth another attempt: throttling, overload, transport failures and 5xx.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::ServerOverloaded { .. } => true,
            Self::ApiError { status_code, .. } => match status_code {
                None => true,
                Some(code) => *code >= 500,
            },
            _ => false,
        }
    }

    /// Server-suggested wait, if any.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_is_retryable() {
        let err = LlmError::RateLimited {
            retry_after: Some(30),
        };
        assert!(err.is_rate_limit());
        assert!(err.is_retryable());
        assert_eq!(err.retry_after(), Some(30));
        assert_eq!(err.to_string(), "Rate limit exceeded. Retry after 30 seconds");
    }

    #[test]
    fn test_client_errors_not_retryable() {
        let err = LlmError::ApiError {
            message: "bad request".into(),
            status_code: Some(400),
        };
        assert!(!err.is_retryable());
        assert!(!err.is_auth_failure());

        let err = LlmError::ApiError {
            message: "forbidden".into(),
            status_code: Some(403),
        };
        assert!(err.is_auth_failure());
    }

    #[test]
    fn test_network_and_server_errors_retryable() {
        let network = LlmError::ApiError {
            message: "connection reset".into(),
            status_code: None,
        };
        assert!(network.is_retryable());

        let server = LlmError::ApiError {
            message: "internal".into(),
            status_code: Some(500),
        };
        assert!(server.is_retryable());
        assert!(!LlmError::InvalidPreset("x".into()).is_retryable());
    }
}
