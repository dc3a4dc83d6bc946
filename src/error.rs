use axum::http::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid JSON body ({status}): {message}")]
    InvalidJson { status: StatusCode, message: String },

    #[error("Rate limit exceeded: max {limit} images per {window_hours} hour(s).")]
    RateLimited {
        limit: u32,
        window_hours: u64,
        retry_after_ms: u64,
    },

    #[error("Server misconfigured: {0}")]
    ServerMisconfigured(String),

    #[error("Stability API error ({status}): {details}")]
    Upstream { status: StatusCode, details: String },

    #[error("Upstream returned no image")]
    NoImageReturned { raw: serde_json::Value },

    #[error("Server error: {0}")]
    Server(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Address parse error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn misconfigured(msg: impl Into<String>) -> Self {
        Self::ServerMisconfigured(msg.into())
    }

    pub fn server(msg: impl Into<String>) -> Self {
        Self::Server(msg.into())
    }

    /// HTTP status the error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            Self::InvalidJson { status, .. } => *status,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Upstream { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable `error` discriminator placed in the JSON body.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidParameter(_) => "invalid_parameters",
            Self::InvalidJson { .. } => "invalid_json",
            Self::RateLimited { .. } => "rate_limit",
            Self::ServerMisconfigured(_) => "server_config",
            Self::Upstream { .. } => "Stability API error",
            Self::NoImageReturned { .. } => "no_image_returned",
            _ => "server_error",
        }
    }
}
