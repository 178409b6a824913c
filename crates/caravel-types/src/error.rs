//! Structured error model for import operations.
//!
//! [`ImportError`] carries classification and diagnostic details for
//! failures raised by connector clients and step bodies. Construct via
//! category-specific factory methods. Run-level retry belongs to the
//! external scheduler; the `retryable` flag exists so it can decide.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad classification of an import error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Invalid job or connector configuration.
    Config,
    /// Authentication failure against a source or destination API.
    Auth,
    /// Insufficient permissions.
    Permission,
    /// Rate limit exceeded (retryable).
    RateLimit,
    /// Transient network error (retryable).
    TransientNetwork,
    /// Invalid or unmappable source data.
    Data,
    /// Internal engine or connector error.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Config => "config",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::RateLimit => "rate_limit",
            Self::TransientNetwork => "transient_network",
            Self::Data => "data",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Blast radius of an import error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorScope {
    /// Affects the whole job run.
    Job,
    /// Affects one page of one step.
    Page,
    /// Affects an individual item within a batch.
    Item,
}

impl fmt::Display for ErrorScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Job => "job",
            Self::Page => "page",
            Self::Item => "item",
        };
        f.write_str(s)
    }
}

/// Structured error from an import operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("[{category}] {code}: {message}")]
pub struct ImportError {
    pub category: ErrorCategory,
    pub scope: ErrorScope,
    pub code: String,
    pub message: String,
    /// Hint to the external scheduler; the engine itself never retries.
    pub retryable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ImportError {
    fn new(
        category: ErrorCategory,
        scope: ErrorScope,
        retryable: bool,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            scope,
            code: code.into(),
            message: message.into(),
            retryable,
            retry_after_ms: None,
            details: None,
        }
    }

    /// Configuration error (not retryable, job scope).
    #[must_use]
    pub fn config(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Config, ErrorScope::Job, false, code, message)
    }

    /// Authentication error (not retryable, job scope).
    #[must_use]
    pub fn auth(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Auth, ErrorScope::Job, false, code, message)
    }

    /// Permission error (not retryable, job scope).
    #[must_use]
    pub fn permission(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Permission, ErrorScope::Job, false, code, message)
    }

    /// Rate limit error (retryable, page scope).
    #[must_use]
    pub fn rate_limit(
        code: impl Into<String>,
        message: impl Into<String>,
        retry_after_ms: Option<u64>,
    ) -> Self {
        let mut err = Self::new(ErrorCategory::RateLimit, ErrorScope::Page, true, code, message);
        err.retry_after_ms = retry_after_ms;
        err
    }

    /// Transient network error (retryable, page scope).
    #[must_use]
    pub fn transient_network(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::TransientNetwork, ErrorScope::Page, true, code, message)
    }

    /// Source data error (not retryable, item scope).
    #[must_use]
    pub fn data(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Data, ErrorScope::Item, false, code, message)
    }

    /// Internal error (not retryable, job scope).
    #[must_use]
    pub fn internal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Internal, ErrorScope::Job, false, code, message)
    }

    /// Attach structured diagnostic details.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Override the default error scope.
    #[must_use]
    pub fn with_scope(mut self, scope: ErrorScope) -> Self {
        self.scope = scope;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_defaults() {
        let err = ImportError::config("MISSING_PROJECT_KEY", "project key is required");
        assert_eq!(err.category, ErrorCategory::Config);
        assert_eq!(err.scope, ErrorScope::Job);
        assert!(!err.retryable);
    }

    #[test]
    fn transient_errors_are_retryable() {
        assert!(ImportError::transient_network("TIMEOUT", "timed out").retryable);
        assert!(ImportError::rate_limit("THROTTLED", "slow down", Some(5000)).retryable);
    }

    #[test]
    fn data_error_is_item_scoped() {
        let err = ImportError::data("BAD_DATE", "unparseable due date");
        assert_eq!(err.scope, ErrorScope::Item);
        let widened = err.with_scope(ErrorScope::Page);
        assert_eq!(widened.scope, ErrorScope::Page);
    }

    #[test]
    fn display_format() {
        let err = ImportError::auth("TOKEN_EXPIRED", "credential expired");
        assert_eq!(err.to_string(), "[auth] TOKEN_EXPIRED: credential expired");
    }

    #[test]
    fn serde_roundtrip_with_details() {
        let err = ImportError::rate_limit("THROTTLED", "slow down", Some(5000))
            .with_details(serde_json::json!({"endpoint": "/rest/api/2/search"}));
        let json = serde_json::to_string(&err).unwrap();
        let back: ImportError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, back);
    }
}
