use super::types::ErrorResponse;
use crate::{config::Environment, llm::UpstreamError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub const INPUT_REQUIRED: &str = "input_as_text is required and must be a non-empty string";

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Model-serving API key not configured")]
    MissingCredential,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(UpstreamError::RateLimited(_)) => StatusCode::TOO_MANY_REQUESTS,
            Self::MissingCredential | Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self, environment: Environment) -> ErrorResponse {
        match self {
            Self::MethodNotAllowed => ErrorResponse::new("Method not allowed"),
            Self::InvalidInput(msg) => ErrorResponse::new(msg.clone()),
            Self::MissingCredential => ErrorResponse::new("OpenAI API key not configured")
                .message("Set OPENAI_API_KEY in the relay's environment or llm.api_key in its configuration."),
            Self::Upstream(UpstreamError::Unavailable(details)) => {
                ErrorResponse::new("Agent dependencies not available")
                    .message("The model-serving integration could not be reached or initialized.")
                    .suggestion(
                        "Check llm.base_url and outbound network access from the relay, \
                         or point the client at another relay in its settings.",
                    )
                    .details(details.clone())
            }
            Self::Upstream(UpstreamError::CredentialRejected(details)) => {
                ErrorResponse::new("OpenAI API key rejected")
                    .message("The model-serving provider rejected the configured API key.")
                    .details(details.clone())
            }
            Self::Upstream(UpstreamError::RateLimited(details)) => {
                ErrorResponse::new("Rate limit exceeded")
                    .message("The model-serving provider is rate limiting requests or out of quota. Try again later.")
                    .details(details.clone())
            }
            Self::Upstream(upstream) => {
                let mut body = ErrorResponse::new("Internal server error").message(upstream.to_string());
                if environment.is_development() {
                    body.stack = Some(format!("{:?}", self));
                }
                body
            }
        }
    }

    pub fn into_response_for(self, environment: Environment) -> Response {
        (self.status(), Json(self.body(environment))).into_response()
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        self.into_response_for(Environment::Production)
    }
}
