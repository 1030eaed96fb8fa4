use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};
use validator::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Session not found")]
    SessionNotFound,

    #[error("The wheel is not active yet")]
    NotReady,

    #[error("Invalid contact form")]
    Validation(#[from] ValidationErrors),

    #[error("Document store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Document store answered {0}")]
    DocumentStore(u16),
}

fn field_messages(errors: &ValidationErrors) -> Value {
    let mut fields = Map::new();
    for (field, errors) in errors.field_errors() {
        let messages: Vec<Value> = errors
            .iter()
            .map(|e| match &e.message {
                Some(message) => Value::from(message.to_string()),
                None => Value::from(e.code.to_string()),
            })
            .collect();
        fields.insert(field.to_string(), Value::Array(messages));
    }
    Value::Object(fields)
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Error::SessionNotFound => (StatusCode::NOT_FOUND, json!({ "error": self.to_string() })),
            Error::NotReady => (StatusCode::CONFLICT, json!({ "error": self.to_string() })),
            Error::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": self.to_string(), "fields": field_messages(errors) }),
            ),
            Error::Http(e) => {
                tracing::error!("Document store unreachable: {}", e);
                (StatusCode::BAD_GATEWAY, json!({ "error": "Erro de conexão." }))
            }
            Error::DocumentStore(status) => {
                tracing::error!("Document store rejected submission with {}", status);
                (StatusCode::BAD_GATEWAY, json!({ "error": "Erro ao enviar os dados." }))
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
