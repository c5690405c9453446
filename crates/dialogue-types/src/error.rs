use thiserror::Error;

/// Errors from calls into the sidecar runtime (state, pub/sub, invocation).
#[derive(Debug, Error)]
pub enum SidecarError {
    #[error("sidecar request failed: {0}")]
    Transport(String),

    #[error("sidecar returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid state value for key '{key}': {message}")]
    Decode { key: String, message: String },

    #[error("failed to encode payload: {0}")]
    Encode(String),
}

/// Errors from agent registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("state store error: {0}")]
    Store(#[from] SidecarError),

    #[error("agent '{0}' has an empty id")]
    MissingId(String),
}
