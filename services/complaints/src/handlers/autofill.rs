use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use serde::Serialize;

use civic_auth_types::identity::IdentityHeaders;
use civic_domain::complaint::Category;

use crate::domain::types::Suggestion;
use crate::error::ComplaintsServiceError;
use crate::handlers::form::FormData;
use crate::state::AppState;
use crate::usecase::autofill::AutofillUseCase;

#[derive(Serialize)]
pub struct AutofillResponse {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub image_severity_score: Option<f64>,
}

impl From<Suggestion> for AutofillResponse {
    fn from(s: Suggestion) -> Self {
        Self {
            title: s.title,
            description: s.description,
            category: s.category,
            image_severity_score: s.image_severity_score,
        }
    }
}

// ── POST /api/autofill ───────────────────────────────────────────────────────

pub async fn autofill(
    _identity: IdentityHeaders,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AutofillResponse>, ComplaintsServiceError> {
    let image = FormData::read(multipart)
        .await?
        .take_file("image")
        .ok_or_else(|| ComplaintsServiceError::validation("image is required"))?;
    let usecase = AutofillUseCase {
        classifier: state.classifier.clone(),
        timeout: state.dependency_timeout,
    };
    let suggestion = usecase.execute(image).await?;
    Ok(Json(suggestion.into()))
}
