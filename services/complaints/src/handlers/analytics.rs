use std::fmt::Display;

use axum::{Json, extract::State};
use serde::{Serialize, Serializer};

use civic_auth_types::identity::IdentityHeaders;
use civic_domain::complaint::{Category, ComplaintStatus, Priority};

use crate::error::ComplaintsServiceError;
use crate::handlers::complaint::ComplaintResponse;
use crate::state::AppState;
use crate::usecase::analytics::{Analytics, AnalyticsUseCase};

/// Write `(key, count)` pairs as a JSON object, keeping their order.
fn as_object<S, K>(pairs: &[(K, u64)], s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    K: Display,
{
    s.collect_map(pairs.iter().map(|(k, n)| (k.to_string(), n)))
}

#[derive(Serialize)]
pub struct AnalyticsResponse {
    pub total_complaints: u64,
    pub total_users: u64,
    pub total_workers: u64,
    #[serde(serialize_with = "as_object")]
    pub status_breakdown: Vec<(ComplaintStatus, u64)>,
    #[serde(serialize_with = "as_object")]
    pub category_breakdown: Vec<(Category, u64)>,
    #[serde(serialize_with = "as_object")]
    pub priority_breakdown: Vec<(Priority, u64)>,
    pub recent_complaints: Vec<ComplaintResponse>,
}

impl From<Analytics> for AnalyticsResponse {
    fn from(a: Analytics) -> Self {
        Self {
            total_complaints: a.total_complaints,
            total_users: a.total_users,
            total_workers: a.total_workers,
            status_breakdown: a.status_breakdown,
            category_breakdown: a.category_breakdown,
            priority_breakdown: a.priority_breakdown,
            recent_complaints: a.recent_complaints.into_iter().map(Into::into).collect(),
        }
    }
}

// ── GET /api/analytics ───────────────────────────────────────────────────────

pub async fn get_analytics(
    identity: IdentityHeaders,
    State(state): State<AppState>,
) -> Result<Json<AnalyticsResponse>, ComplaintsServiceError> {
    let usecase = AnalyticsUseCase {
        complaints: state.complaint_repo(),
        users: state.user_repo(),
    };
    let analytics = usecase.execute(identity.user_role).await?;
    Ok(Json(analytics.into()))
}
