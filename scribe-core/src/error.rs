//! Unified error handling system
//!
//! Structured error types with context, recovery suggestions, and proper error chaining.
//! Provider failures are expected to be contained by the component that talks to the
//! provider; only validation, rate limiting, auth and internal faults reach a caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{error, warn};

pub type ScribeResult<T> = Result<T, ScribeError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for the Scribe system
#[derive(Error, Debug)]
pub enum ScribeError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Provider error ({provider}): {message}")]
    Provider {
        provider: String,
        message: String,
        status: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Operation timeout: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
        context: ErrorContext,
    },

    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        retry_after_ms: Option<u64>,
        context: ErrorContext,
    },

    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
        context: ErrorContext,
    },

    #[error("Quota exceeded: {message}")]
    QuotaExceeded {
        message: String,
        context: ErrorContext,
    },

    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        context: ErrorContext,
    },

    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScribeError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            ScribeError::Validation { context, .. } => Some(context),
            ScribeError::Provider { context, .. } => Some(context),
            ScribeError::Timeout { context, .. } => Some(context),
            ScribeError::RateLimit { context, .. } => Some(context),
            ScribeError::Authentication { context, .. } => Some(context),
            ScribeError::QuotaExceeded { context, .. } => Some(context),
            ScribeError::Conflict { context, .. } => Some(context),
            ScribeError::NotFound { context, .. } => Some(context),
            ScribeError::Config { context, .. } => Some(context),
            ScribeError::Internal { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScribeError::Provider { .. } | ScribeError::Timeout { .. } | ScribeError::RateLimit { .. }
        )
    }

    /// Get retry delay in milliseconds for recoverable errors
    pub fn retry_delay_ms(&self) -> Option<u64> {
        match self {
            ScribeError::Provider { .. } => Some(1000),
            ScribeError::Timeout { .. } => Some(2000),
            ScribeError::RateLimit { retry_after_ms, .. } => *retry_after_ms,
            _ => None,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        let error_id = self.context().map(|c| c.error_id.as_str());
        match self {
            ScribeError::Internal { .. } | ScribeError::Io(_) | ScribeError::Serialization(_) => {
                error!(error_id = ?error_id, error = %self, "Internal error occurred");
            }
            ScribeError::Config { .. } => {
                error!(error_id = ?error_id, error = %self, "Configuration error");
            }
            ScribeError::Provider { .. } | ScribeError::Timeout { .. } => {
                warn!(
                    error_id = ?error_id,
                    error = %self,
                    "Provider or timeout error (recoverable)"
                );
            }
            _ => {
                warn!(error_id = ?error_id, error = %self, "Request rejected");
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::ScribeError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::ScribeError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file and environment"),
        }
    };
}

#[macro_export]
macro_rules! provider_error {
    ($provider:expr, $msg:expr) => {
        $crate::ScribeError::Provider {
            provider: $provider.to_string(),
            message: $msg.to_string(),
            status: None,
            source: None,
            context: $crate::ErrorContext::new($provider),
        }
    };
    ($provider:expr, $msg:expr, $source:expr) => {
        $crate::ScribeError::Provider {
            provider: $provider.to_string(),
            message: $msg.to_string(),
            status: None,
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($provider),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_builder() {
        let context = ErrorContext::new("research")
            .with_operation("aggregate")
            .with_metadata("source", "news")
            .with_suggestion("Retry later");

        assert_eq!(context.component, "research");
        assert_eq!(context.operation.as_deref(), Some("aggregate"));
        assert_eq!(context.metadata.get("source").map(String::as_str), Some("news"));
        assert_eq!(context.recovery_suggestions.len(), 1);
        assert!(!context.error_id.is_empty());
    }

    #[test]
    fn test_recoverability() {
        let provider = provider_error!("newsapi", "HTTP 500");
        assert!(provider.is_recoverable());
        assert_eq!(provider.retry_delay_ms(), Some(1000));

        let validation = validation_error!("Topic too short", "topic", "research");
        assert!(!validation.is_recoverable());
        assert!(validation.retry_delay_ms().is_none());

        let limited = ScribeError::RateLimit {
            message: "slow down".to_string(),
            retry_after_ms: Some(750),
            context: ErrorContext::new("rate_limiter"),
        };
        assert_eq!(limited.retry_delay_ms(), Some(750));
    }

    #[test]
    fn test_provider_error_display() {
        let error = provider_error!("youtube", "quota exhausted");
        assert_eq!(error.to_string(), "Provider error (youtube): quota exhausted");
        assert_eq!(error.context().map(|c| c.component.as_str()), Some("youtube"));
    }
}
