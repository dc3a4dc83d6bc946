use crate::Error;
use axum::{
    http::{HeaderValue, header::RETRY_AFTER},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
            status: None,
            details: None,
            raw: None,
        }
    }

    fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl From<&Error> for ErrorResponse {
    fn from(err: &Error) -> Self {
        match err {
            Error::InvalidRequest(msg) => Self::new(msg.as_str()),
            Error::InvalidJson { message, .. } => Self::new(err.kind()).with_message(message.as_str()),
            Error::InvalidParameter(msg) | Error::ServerMisconfigured(msg) | Error::Server(msg) => {
                Self::new(err.kind()).with_message(msg.as_str())
            }
            Error::Upstream { status, details } => Self {
                status: Some(status.as_u16()),
                details: Some(details.clone()),
                ..Self::new(err.kind())
            },
            Error::NoImageReturned { raw } => Self {
                raw: Some(raw.clone()),
                ..Self::new(err.kind())
            },
            _ => Self::new(err.kind()).with_message(err.to_string()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let mut response = (self.status_code(), Json(ErrorResponse::from(&self))).into_response();

        if let Error::RateLimited { retry_after_ms, .. } = self {
            let secs = retry_after_ms.div_ceil(1000);
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }

        response
    }
}
