use thiserror::Error;

/// Failures surfaced by the interview chat stack.
///
/// Cancellation is a normal termination signal, not a user-facing failure;
/// callers are expected to swallow it. Everything else is meant to be shown
/// to the user in some form.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("rate limit exceeded, please try again in a moment")]
    RateLimited,

    #[error("service temporarily unavailable")]
    ServiceUnavailable,

    #[error("chat endpoint returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("request cancelled")]
    Cancelled,

    #[error("another request is already in flight")]
    Busy,

    #[error("answer is empty")]
    EmptyAnswer,

    #[error("not enough speech to submit - say a bit more first")]
    AnswerTooShort,

    #[error("finish at least one question and answer before requesting a verdict")]
    NotReady,

    #[error("unknown interview category: {0}")]
    UnknownCategory(String),
}

impl ChatError {
    /// Cancellation is cooperative shutdown, never an error to report.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ChatError::Cancelled)
    }
}
