use thiserror::Error;

/// Everything that can go wrong during one submit attempt. All variants are
/// absorbed into `SubmissionState::Failed` at the page boundary; none
/// propagate past it.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Non-success HTTP status, with whatever body text could be recovered.
    #[error("server error {status}: {body}")]
    Status { status: u16, body: String },
    /// Success status but a non-JSON body, typically an HTML error page
    /// served with a 200.
    #[error("expected JSON but got \"{content_type}\"; body: {body}")]
    ContentType { content_type: String, body: String },
    /// The server answered with `ok != true`; carries its error message
    /// when one was provided.
    #[error("{0}")]
    Rejected(String),
    #[error("no results returned from server")]
    NoResults,
    #[error("invalid detection payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}
