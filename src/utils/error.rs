use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwipeError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    BackendError { status: u16, body: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Haptic feedback unavailable: {message}")]
    HapticsError { message: String },

    #[error("Decision queue closed: {message}")]
    DispatchError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Backend,
    Configuration,
    Data,
    Device,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SwipeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SwipeError::ApiError(_) => ErrorCategory::Network,
            SwipeError::BackendError { .. } => ErrorCategory::Backend,
            SwipeError::ConfigError { .. }
            | SwipeError::ConfigValidationError { .. }
            | SwipeError::InvalidConfigValueError { .. }
            | SwipeError::MissingConfigError { .. } => ErrorCategory::Configuration,
            SwipeError::SerializationError(_) => ErrorCategory::Data,
            SwipeError::HapticsError { .. } => ErrorCategory::Device,
            SwipeError::IoError(_) | SwipeError::DispatchError { .. } => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SwipeError::HapticsError { .. } => ErrorSeverity::Low,
            SwipeError::ApiError(_) | SwipeError::BackendError { .. } => ErrorSeverity::Medium,
            SwipeError::SerializationError(_) | SwipeError::DispatchError { .. } => {
                ErrorSeverity::High
            }
            SwipeError::ConfigError { .. }
            | SwipeError::ConfigValidationError { .. }
            | SwipeError::InvalidConfigValueError { .. }
            | SwipeError::MissingConfigError { .. }
            | SwipeError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    /// Whether a decision write that failed with this error is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            SwipeError::ApiError(_) => true,
            SwipeError::BackendError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check network connectivity and the backend URL",
            ErrorCategory::Backend => "Check the anon key and that the backend schema is deployed",
            ErrorCategory::Configuration => "Fix the configuration file and try again",
            ErrorCategory::Data => "The backend returned data in an unexpected shape",
            ErrorCategory::Device => "Haptic feedback is optional and can be ignored",
            ErrorCategory::Internal => "Restart the session",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => "Could not reach the prediction backend".to_string(),
            ErrorCategory::Backend => format!("The prediction backend rejected the request ({})", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Data => "Received a malformed response".to_string(),
            ErrorCategory::Device => "Haptic feedback is unavailable".to_string(),
            ErrorCategory::Internal => format!("Internal error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, SwipeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_errors_retry_only_on_server_side_status() {
        let unavailable = SwipeError::BackendError {
            status: 503,
            body: String::new(),
        };
        let conflict = SwipeError::BackendError {
            status: 409,
            body: "duplicate key".to_string(),
        };
        let throttled = SwipeError::BackendError {
            status: 429,
            body: String::new(),
        };

        assert!(unavailable.is_retryable());
        assert!(throttled.is_retryable());
        assert!(!conflict.is_retryable());
    }

    #[test]
    fn test_config_errors_are_critical() {
        let err = SwipeError::MissingConfigError {
            field: "backend.url".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.user_friendly_message().contains("backend.url"));
    }

    #[test]
    fn test_haptics_errors_are_low_severity() {
        let err = SwipeError::HapticsError {
            message: "no actuator".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert!(!err.is_retryable());
    }
}
