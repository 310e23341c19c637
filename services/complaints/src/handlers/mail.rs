use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use serde::Serialize;

use civic_auth_types::identity::IdentityHeaders;

use crate::domain::types::Mail;
use crate::error::ComplaintsServiceError;
use crate::handlers::form::FormData;
use crate::state::AppState;
use crate::usecase::mail::SendMailUseCase;

#[derive(Serialize)]
pub struct SendMailResponse {
    pub message: &'static str,
}

// ── POST /send-mail ──────────────────────────────────────────────────────────

pub async fn send_mail(
    _identity: IdentityHeaders,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SendMailResponse>, ComplaintsServiceError> {
    let form = FormData::read(multipart).await?;
    let mail = Mail {
        to: form.required("email")?,
        subject: form.required("subject")?,
        body: form.text("body").unwrap_or_default().to_owned(),
    };
    let usecase = SendMailUseCase {
        notifier: state.notifier.clone(),
        timeout: state.dependency_timeout,
    };
    usecase.execute(mail).await?;
    Ok(Json(SendMailResponse {
        message: "Email sent successfully",
    }))
}
