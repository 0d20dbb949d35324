use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("shared secret must not be empty")]
    EmptySecret,

    #[error("token interval length must be non-zero")]
    ZeroInterval,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
