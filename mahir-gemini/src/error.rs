//! Error types for the REST collaborators.

use thiserror::Error;

/// Result type for collaborator requests.
pub type Result<T> = std::result::Result<T, RequestError>;

/// Errors from a single collaborator round trip.
#[derive(Error, Debug)]
pub enum RequestError {
    /// The HTTP request itself failed (connection, TLS, timeout).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint URL could not be constructed (bad model name).
    #[error("failed to construct request URL: {0}")]
    Url(#[from] url::ParseError),

    /// The server answered with a non-success status.
    #[error("bad response from server; code {code}; description: {}", description.as_deref().unwrap_or("none"))]
    BadResponse {
        /// HTTP status code.
        code: u16,
        /// Response body, if one was readable.
        description: Option<String>,
    },

    /// The response body did not match the expected shape.
    #[error("failed to deserialize response: {0}")]
    Deserialize(#[from] serde_json::Error),

    /// The response carried no candidates or no usable text.
    #[error("response contained no usable content")]
    EmptyResponse,

    /// A speech response carried no audio payload.
    #[error("no audio data returned from API")]
    MissingAudio,

    /// A speech payload was not valid base64.
    #[error("malformed audio payload: {0}")]
    InvalidAudio(#[from] base64::DecodeError),
}
