use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use civic_auth_types::identity::IdentityHeaders;
use civic_domain::pagination::{Page, PageRequest};
use civic_domain::user::UserRole;

use crate::domain::types::User;
use crate::error::ComplaintsServiceError;
use crate::handlers::{AppJson, AppQuery};
use crate::state::AppState;
use crate::usecase::listing::ListUsersUseCase;
use crate::usecase::user::{RegisterUserInput, RegisterUserUseCase};

// ── POST /api/register ───────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub message: &'static str,
}

pub async fn register(
    State(state): State<AppState>,
    AppJson(body): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ComplaintsServiceError> {
    let role = match body.role.as_deref().map(str::trim) {
        None | Some("") => UserRole::User,
        Some(raw) => raw
            .parse::<UserRole>()
            .map_err(|e| ComplaintsServiceError::validation(e.to_string()))?,
    };
    let usecase = RegisterUserUseCase {
        users: state.user_repo(),
    };
    let user = usecase
        .execute(RegisterUserInput {
            name: body.name,
            email: body.email,
            password: body.password,
            phone: body.phone,
            role,
            latitude: body.latitude,
            longitude: body.longitude,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            message: "User registered successfully",
        }),
    ))
}

// ── GET /api/users ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
    #[serde(serialize_with = "civic_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            phone: u.phone,
            role: u.role,
            created_at: u.created_at,
        }
    }
}

pub async fn list_users(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    AppQuery(page): AppQuery<PageRequest>,
) -> Result<Json<Page<UserResponse>>, ComplaintsServiceError> {
    let usecase = ListUsersUseCase {
        users: state.user_repo(),
    };
    let page = usecase.execute(identity.user_role, page).await?;
    Ok(Json(page.map(Into::into)))
}
