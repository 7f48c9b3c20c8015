use awc::error::{JsonPayloadError, SendRequestError};

/// Errors raised by the chess client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(#[from] SendRequestError),

    #[error("could not decode response: {0}")]
    Decode(#[from] JsonPayloadError),

    #[error("server responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed message: {0}")]
    MalformedMessage(#[from] serde_json::Error),

    #[error("invalid position {fen:?}")]
    InvalidPosition { fen: String },

    #[error("invalid square {0:?}")]
    InvalidSquare(String),

    #[error("illegal move {from}{to}")]
    IllegalMove { from: String, to: String },

    #[error("no access token available")]
    MissingCredential,

    #[error("malformed access token: {0}")]
    MalformedToken(String),

    #[error("not authorized")]
    Unauthorized,

    #[error("no active game")]
    NoActiveGame,

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
