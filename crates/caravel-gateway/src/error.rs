//! Gateway error types.

/// Errors produced by [`JobGateway`](crate::JobGateway) operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The requested job or report does not exist.
    #[error("{resource} not found: {id}")]
    NotFound {
        resource: &'static str,
        id: String,
    },

    /// Transport failure talking to the backing service.
    #[error("gateway transport error: {0}")]
    Transport(String),

    /// Payload could not be serialized or deserialized.
    #[error("gateway serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GatewayError {
    /// Build a [`GatewayError::NotFound`] for the given resource and id.
    #[must_use]
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Step bodies talk to the gateway mid-page; their errors surface as
/// [`ImportError`](caravel_types::error::ImportError).
impl From<GatewayError> for caravel_types::error::ImportError {
    fn from(err: GatewayError) -> Self {
        use caravel_types::error::ImportError;
        match &err {
            GatewayError::NotFound { resource, id } => ImportError::internal(
                "GATEWAY_NOT_FOUND",
                format!("{resource} not found: {id}"),
            ),
            GatewayError::Transport(msg) => {
                ImportError::transient_network("GATEWAY_TRANSPORT", msg.clone())
            }
            GatewayError::Serialization(inner) => {
                ImportError::internal("GATEWAY_SERIALIZATION", inner.to_string())
            }
        }
    }
}
