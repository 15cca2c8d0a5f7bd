use thiserror::Error;

use crate::Role;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("model `{model}` not found")]
    UnknownModel { model: String },

    #[error("did not recognize provider `{provider}`")]
    UnrecognizedProvider { provider: String },

    #[error("unknown part type: `{tag}`")]
    UnrecognizedPartType { tag: String },

    #[error("malformed content part: {0}")]
    MalformedPart(#[from] serde_json::Error),

    #[error("invalid {role} message: {reason}")]
    InvalidMessage { role: Role, reason: &'static str },

    #[error(transparent)]
    Transport(anyhow::Error),
}

pub type Result<T> = std::result::Result<T, LlmError>;
