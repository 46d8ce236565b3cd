use thiserror::Error;

/// Errors raised while talking to a language model
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Response stream failed: {0}")]
    Stream(String),

    #[error("Scripted model has no responses left")]
    Exhausted,
}

pub type LlmResult<T> = Result<T, LlmError>;
