use sitegate_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("external tool unavailable: {tool} was not found in PATH")]
    ExternalToolUnavailable { tool: String },
    #[error("{tool} failed (exit code {code:?}): {stderr}")]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("proxy reload failed ({command}): {detail}")]
    ReloadFailure { command: String, detail: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

sitegate_common::impl_context!();
