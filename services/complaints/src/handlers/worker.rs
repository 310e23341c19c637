use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use uuid::Uuid;

use civic_auth_types::identity::IdentityHeaders;
use civic_domain::pagination::{Page, PageRequest};

use crate::domain::types::Availability;
use crate::error::ComplaintsServiceError;
use crate::handlers::{AppQuery, parse_id};
use crate::state::AppState;
use crate::usecase::listing::ListWorkersUseCase;
use crate::usecase::user::{GetWorkerUseCase, WorkerWithLoad};

#[derive(Serialize)]
pub struct WorkerResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Complaints currently `assigned` or `in_progress`.
    pub workload: u64,
    /// Every complaint ever assigned, closed ones included.
    pub assigned_complaints: u64,
    pub availability: Availability,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<WorkerWithLoad> for WorkerResponse {
    fn from(w: WorkerWithLoad) -> Self {
        Self {
            id: w.worker.id,
            name: w.worker.name,
            email: w.worker.email,
            phone: w.worker.phone,
            workload: w.load.active,
            assigned_complaints: w.load.assigned_total,
            availability: w.load.availability(),
            latitude: w.worker.location.map(|c| c.latitude),
            longitude: w.worker.location.map(|c| c.longitude),
        }
    }
}

// ── GET /api/workers ─────────────────────────────────────────────────────────

pub async fn list_workers(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    AppQuery(page): AppQuery<PageRequest>,
) -> Result<Json<Page<WorkerResponse>>, ComplaintsServiceError> {
    let usecase = ListWorkersUseCase {
        users: state.user_repo(),
        complaints: state.complaint_repo(),
    };
    let page = usecase.execute(identity.user_role, page).await?;
    Ok(Json(page.map(Into::into)))
}

// ── GET /api/worker/{id} ─────────────────────────────────────────────────────

pub async fn get_worker(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WorkerResponse>, ComplaintsServiceError> {
    let usecase = GetWorkerUseCase {
        users: state.user_repo(),
        complaints: state.complaint_repo(),
    };
    let worker = usecase.execute(identity.user_role, parse_id(&id)?).await?;
    Ok(Json(worker.into()))
}
