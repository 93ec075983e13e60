use crate::{engine::EngineError, response::RenderResult};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::{fmt, io, time::Duration};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Html,
    Url,
    Title,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Html => f.write_str("html"),
            Self::Url => f.write_str("url"),
            Self::Title => f.write_str("title"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot parse input data: {0}")]
    Parse(String),
    #[error("{0} is required")]
    MissingField(Field),
    #[error("invalid url: {0}")]
    InvalidAddress(String),
    #[error("failed to write markup file: {0}")]
    MarkupWrite(#[source] io::Error),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("rendering did not finish within {0:?}")]
    Timeout(Duration),
    #[error("failed to write output file: {0}")]
    OutputWrite(#[source] io::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::MissingField(_) | Self::InvalidAddress(_) => StatusCode::BAD_REQUEST,
            Self::MarkupWrite(_) | Self::OutputWrite(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Engine(err) if err.is_construction() => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Engine(_) => StatusCode::BAD_GATEWAY,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Short, caller-facing summary. The full description goes into the
    /// `error` field of the response.
    pub fn message(&self) -> String {
        match self {
            Self::Parse(_) => "Cannot parse input data".into(),
            Self::MissingField(Field::Html) => "Html input is required".into(),
            Self::MissingField(Field::Url) => "Url is required".into(),
            Self::MissingField(Field::Title) => "Title is required".into(),
            Self::InvalidAddress(_) => "Url is invalid".into(),
            Self::MarkupWrite(_) => "Error creating HTML file".into(),
            Self::Engine(_) | Self::OutputWrite(_) => "Error creating PDF".into(),
            Self::Timeout(_) => "PDF rendering timed out".into(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %self, "Request failed");
        }
        (status, Json(RenderResult::failure(&self))).into_response()
    }
}
