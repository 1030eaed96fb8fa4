use axum::{debug_handler, extract::State, Json};
use prize_wheel::validation::{ContactDocument, ContactSubmission};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::{Error, Result};
use crate::AppState;

/// Keeps the first character of the local part and the domain, e.g.
/// `a***@example.com`. Used wherever an address would reach the logs.
pub fn redact_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => match local.chars().next() {
            Some(first) => format!("{}***@{}", first, domain),
            None => format!("***@{}", domain),
        },
        None => "***".to_string(),
    }
}

fn session_label(session_id: Option<Uuid>) -> String {
    session_id.map_or_else(|| "-".to_string(), |id| id.to_string())
}

/// Stores a validated contact document. With no store configured the
/// submission is accepted and only logged.
pub async fn store_contact(
    client: &Client,
    document_store_url: Option<&str>,
    session_id: Option<Uuid>,
    document: &ContactDocument,
) -> Result<()> {
    let Some(url) = document_store_url else {
        warn!(
            "DOCUMENT_STORE_URL not set; contact {} for session {} was not forwarded",
            redact_email(&document.email),
            session_label(session_id)
        );
        return Ok(());
    };

    let response = client.post(url).json(document).send().await?;
    if !response.status().is_success() {
        return Err(Error::DocumentStore(response.status().as_u16()));
    }

    info!(
        "Stored contact document {} for session {}",
        redact_email(&document.email),
        session_label(session_id)
    );
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    /// Wheel session to unlock once the contact is stored. This is the only way
    /// a session becomes ready.
    #[serde(default)]
    pub session_id: Option<Uuid>,
    #[serde(flatten)]
    pub form: ContactSubmission,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

#[debug_handler]
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(request): Json<ContactRequest>,
) -> Result<Json<ContactResponse>> {
    request.form.validate()?;

    store_contact(
        &state.http,
        state.config.document_store_url.as_deref(),
        request.session_id,
        &request.form.payload(),
    )
    .await?;

    if let Some(id) = request.session_id {
        state.sessions.signal_ready(id)?;
    }

    Ok(Json(ContactResponse {
        success: true,
        message: "Enviado com sucesso!".to_string(),
    }))
}
