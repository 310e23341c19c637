use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use civic_auth_types::identity::IdentityHeaders;
use civic_domain::complaint::{Category, ComplaintStatus, Priority};
use civic_domain::pagination::{Page, PageRequest};

use crate::domain::types::{Complaint, Update};
use crate::error::ComplaintsServiceError;
use crate::handlers::form::FormData;
use crate::handlers::{AppJson, AppQuery, parse_id};
use crate::state::AppState;
use crate::usecase::complaint::{
    ComplaintDetail, CreateComplaintInput, CreateComplaintUseCase, GetComplaintUseCase,
};
use crate::usecase::edit::{ComplaintEdit, EditComplaintUseCase};
use crate::usecase::listing::{ComplaintRow, ListAllComplaintsUseCase, ListComplaintsUseCase};
use crate::usecase::update_log::ListUpdatesUseCase;

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ComplaintResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub status: ComplaintStatus,
    pub priority: Priority,
    pub location: String,
    pub image_url: Option<String>,
    pub image_severity_score: Option<f64>,
    pub user_id: Uuid,
    pub assigned_worker_id: Option<Uuid>,
    #[serde(serialize_with = "civic_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "civic_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<Complaint> for ComplaintResponse {
    fn from(c: Complaint) -> Self {
        Self {
            id: c.id,
            title: c.title,
            description: c.description,
            category: c.category,
            status: c.status,
            priority: c.priority,
            location: c.location,
            image_url: c.image_url,
            image_severity_score: c.image_severity_score,
            user_id: c.submitter_id,
            assigned_worker_id: c.assigned_worker_id,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Suggested worker attached to admin listing rows.
#[derive(Serialize)]
pub struct SuggestionResponse {
    pub worker: String,
    pub worker_id: Uuid,
    #[serde(serialize_with = "civic_core::serde::round_2dp")]
    pub score: f64,
}

#[derive(Serialize)]
pub struct ComplaintRowResponse {
    #[serde(flatten)]
    pub complaint: ComplaintResponse,
    pub user_name: Option<String>,
    pub worker_name: Option<String>,
    #[serde(flatten)]
    pub suggestion: Option<SuggestionResponse>,
}

impl From<ComplaintRow> for ComplaintRowResponse {
    fn from(row: ComplaintRow) -> Self {
        Self {
            complaint: row.complaint.into(),
            user_name: row.submitter_name,
            worker_name: row.worker_name,
            suggestion: row.suggestion.map(|c| SuggestionResponse {
                worker: c.worker_name,
                worker_id: c.worker_id,
                score: c.score,
            }),
        }
    }
}

#[derive(Serialize)]
pub struct UpdateResponse {
    pub id: Uuid,
    pub complaint_id: Uuid,
    pub author_id: Option<Uuid>,
    pub updated_by: String,
    pub message: String,
    #[serde(serialize_with = "civic_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl From<Update> for UpdateResponse {
    fn from(u: Update) -> Self {
        Self {
            id: u.id,
            complaint_id: u.complaint_id,
            author_id: u.author_id,
            updated_by: u.author_name,
            message: u.message,
            created_at: u.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct ComplaintDetailResponse {
    #[serde(flatten)]
    pub complaint: ComplaintResponse,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_phone: Option<String>,
    pub worker_name: Option<String>,
    pub updates: Vec<UpdateResponse>,
}

impl From<ComplaintDetail> for ComplaintDetailResponse {
    fn from(d: ComplaintDetail) -> Self {
        let (user_name, user_email, user_phone) = match d.submitter {
            Some(u) => (Some(u.name), Some(u.email), u.phone),
            None => (None, None, None),
        };
        Self {
            complaint: d.complaint.into(),
            user_name,
            user_email,
            user_phone,
            worker_name: d.worker.map(|w| w.name),
            updates: d.updates.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize)]
pub struct DataResponse<T> {
    pub data: Vec<T>,
}

// ── GET /api/complaints ──────────────────────────────────────────────────────

pub async fn list_complaints(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    AppQuery(page): AppQuery<PageRequest>,
) -> Result<Json<Page<ComplaintRowResponse>>, ComplaintsServiceError> {
    let usecase = ListComplaintsUseCase {
        complaints: state.complaint_repo(),
        users: state.user_repo(),
    };
    let page = usecase
        .execute(identity.user_id, identity.user_role, page)
        .await?;
    Ok(Json(page.map(Into::into)))
}

// ── GET /api/allcomplaints ───────────────────────────────────────────────────

pub async fn all_complaints(
    identity: IdentityHeaders,
    State(state): State<AppState>,
) -> Result<Json<DataResponse<ComplaintRowResponse>>, ComplaintsServiceError> {
    let usecase = ListAllComplaintsUseCase {
        complaints: state.complaint_repo(),
        users: state.user_repo(),
    };
    let rows = usecase.execute(identity.user_id, identity.user_role).await?;
    Ok(Json(DataResponse {
        data: rows.into_iter().map(Into::into).collect(),
    }))
}

// ── GET /api/complaints/{id} ─────────────────────────────────────────────────

pub async fn get_complaint(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ComplaintDetailResponse>, ComplaintsServiceError> {
    let usecase = GetComplaintUseCase {
        complaints: state.complaint_repo(),
        updates: state.update_repo(),
        users: state.user_repo(),
    };
    let detail = usecase
        .execute(identity.user_id, identity.user_role, parse_id(&id)?)
        .await?;
    Ok(Json(detail.into()))
}

// ── GET /api/complaints/{id}/updates ─────────────────────────────────────────

pub async fn list_updates(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<UpdateResponse>>, ComplaintsServiceError> {
    let usecase = ListUpdatesUseCase {
        complaints: state.complaint_repo(),
        updates: state.update_repo(),
    };
    let updates = usecase
        .execute(identity.user_id, identity.user_role, parse_id(&id)?)
        .await?;
    Ok(Json(DataResponse {
        data: updates.into_iter().map(Into::into).collect(),
    }))
}

// ── POST /api/complaints ─────────────────────────────────────────────────────

pub async fn create_complaint(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<ComplaintResponse>), ComplaintsServiceError> {
    let mut form = FormData::read(multipart).await?;
    let image_severity_score = form
        .text("image_severity_score")
        .map(|raw| {
            raw.parse::<f64>().map_err(|_| {
                ComplaintsServiceError::validation("image_severity_score must be a number")
            })
        })
        .transpose()?;
    let input = CreateComplaintInput {
        title: form.required_verbatim("title")?,
        description: form.required_verbatim("description")?,
        category: form.required("category")?,
        location: form.required_verbatim("location")?,
        image_severity_score,
        image: form.take_file("image"),
    };

    let usecase = CreateComplaintUseCase {
        users: state.user_repo(),
        complaints: state.complaint_repo(),
        images: state.images.clone(),
    };
    let complaint = usecase
        .execute(identity.user_id, identity.user_role, input)
        .await?;
    Ok((StatusCode::CREATED, Json(complaint.into())))
}

// ── PUT /api/complaints/{id} ─────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct UpdateComplaintRequest {
    pub status: Option<String>,
    pub worker_id: Option<String>,
    pub message: Option<String>,
    pub priority: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

impl TryFrom<UpdateComplaintRequest> for ComplaintEdit {
    type Error = ComplaintsServiceError;

    fn try_from(body: UpdateComplaintRequest) -> Result<Self, Self::Error> {
        let invalid = |e: civic_domain::complaint::UnknownVariant| {
            ComplaintsServiceError::validation(e.to_string())
        };
        let worker_id = present(body.worker_id)
            .map(|raw| {
                raw.parse::<Uuid>()
                    .map_err(|_| ComplaintsServiceError::validation("worker_id is invalid"))
            })
            .transpose()?;
        let mut status = present(body.status)
            .map(|raw| raw.parse::<ComplaintStatus>().map_err(invalid))
            .transpose()?;
        let priority = present(body.priority)
            .map(|raw| raw.parse::<Priority>().map_err(invalid))
            .transpose()?;
        let message = present(body.message);

        // Assigning already moves the complaint to `assigned`.
        if worker_id.is_some() && status == Some(ComplaintStatus::Assigned) {
            status = None;
        }
        let edit = Self {
            worker_id,
            status,
            priority,
            message,
        };
        if edit.is_empty() {
            return Err(ComplaintsServiceError::validation(
                "one of status, worker_id, priority or message is required",
            ));
        }
        Ok(edit)
    }
}

#[derive(Serialize)]
pub struct UpdateComplaintResponse {
    pub complaint: ComplaintResponse,
    pub warnings: Vec<String>,
}

pub async fn update_complaint(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(body): AppJson<UpdateComplaintRequest>,
) -> Result<Json<UpdateComplaintResponse>, ComplaintsServiceError> {
    let complaint_id = parse_id(&id)?;
    let edit = ComplaintEdit::try_from(body)?;
    let usecase = EditComplaintUseCase {
        complaints: state.complaint_repo(),
        users: state.user_repo(),
        updates: state.update_repo(),
        notifier: state.notifier.clone(),
        locks: state.locks.clone(),
        notify_timeout: state.dependency_timeout,
    };
    let outcome = usecase
        .execute(identity.user_id, identity.user_role, complaint_id, edit)
        .await?;
    Ok(Json(UpdateComplaintResponse {
        complaint: outcome.complaint.into(),
        warnings: outcome.warnings,
    }))
}
