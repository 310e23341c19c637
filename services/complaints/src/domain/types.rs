use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use civic_domain::complaint::{Category, ComplaintStatus, Priority};
use civic_domain::geo::Coordinates;
use civic_domain::user::UserRole;

use crate::error::ComplaintsServiceError;

/// Display name recorded on updates written by the engine itself.
pub const SYSTEM_AUTHOR: &str = "System";

/// A registered account: citizen, field worker or administrator.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub role: UserRole,
    /// Home coordinates. Always present for workers.
    pub location: Option<Coordinates>,
    pub created_at: DateTime<Utc>,
}

/// A citizen-filed issue.
#[derive(Debug, Clone)]
pub struct Complaint {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub priority: Priority,
    pub status: ComplaintStatus,
    /// `"lat, lon"` exactly as submitted.
    pub location: String,
    pub image_url: Option<String>,
    pub image_severity_score: Option<f64>,
    pub submitter_id: Uuid,
    pub assigned_worker_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Complaint {
    /// `None` when the stored location does not parse.
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.location.parse().ok()
    }
}

/// One entry of a complaint's append-only activity trail.
#[derive(Debug, Clone)]
pub struct Update {
    pub id: Uuid,
    pub complaint_id: Uuid,
    /// `None` for entries written by the engine.
    pub author_id: Option<Uuid>,
    pub author_name: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Update {
    pub fn by_user(complaint_id: Uuid, author: &User, message: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            complaint_id,
            author_id: Some(author.id),
            author_name: author.name.clone(),
            message,
            created_at: Utc::now(),
        }
    }

    pub fn by_system(complaint_id: Uuid, message: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            complaint_id,
            author_id: None,
            author_name: SYSTEM_AUTHOR.to_owned(),
            message,
            created_at: Utc::now(),
        }
    }
}

/// New mutable state for a complaint, committed only if the stored status still equals
/// `expected_status`.
#[derive(Debug, Clone)]
pub struct ComplaintChange {
    pub id: Uuid,
    pub expected_status: ComplaintStatus,
    pub status: ComplaintStatus,
    pub priority: Priority,
    pub assigned_worker_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl ComplaintChange {
    /// Start from the complaint's current state; callers overwrite what they change.
    pub fn from_current(complaint: &Complaint) -> Self {
        Self {
            id: complaint.id,
            expected_status: complaint.status,
            status: complaint.status,
            priority: complaint.priority,
            assigned_worker_id: complaint.assigned_worker_id,
            updated_at: Utc::now(),
        }
    }

    pub fn apply_to(&self, complaint: &mut Complaint) {
        complaint.status = self.status;
        complaint.priority = self.priority;
        complaint.assigned_worker_id = self.assigned_worker_id;
        complaint.updated_at = self.updated_at;
    }
}

/// Which complaints a listing may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplaintScope {
    All,
    SubmittedBy(Uuid),
}

impl ComplaintScope {
    /// Citizens see only what they filed; staff see everything.
    pub fn for_caller(caller_id: Uuid, role: UserRole) -> Self {
        if role.is_staff() {
            Self::All
        } else {
            Self::SubmittedBy(caller_id)
        }
    }

    pub fn contains(&self, complaint: &Complaint) -> bool {
        match self {
            Self::All => true,
            Self::SubmittedBy(id) => complaint.submitter_id == *id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplaintOrder {
    /// `created_at` descending.
    Newest,
    /// Status rank, then priority rank, then `created_at` descending.
    Triage,
}

/// Derived load of one worker. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerLoad {
    /// Complaints assigned to the worker that are `assigned` or `in_progress`.
    pub active: u64,
    /// Complaints ever assigned to the worker, any status.
    pub assigned_total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Free,
    Busy,
}

impl WorkerLoad {
    pub fn availability(&self) -> Availability {
        if self.active == 0 {
            Availability::Free
        } else {
            Availability::Busy
        }
    }
}

/// An image received from a client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Outbound email handed to the notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    /// HTML body.
    pub body: String,
}

/// Draft complaint fields proposed by the image classifier.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Suggestion {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub image_severity_score: Option<f64>,
}

/// Trim and lowercase an email address so uniqueness is case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Shape check only: one `@`, a non-empty local part, and a dotted domain.
pub fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

// Column widths in the migrations, counted in characters.
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 120;
pub const MAX_PHONE_LEN: usize = 20;
pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_LOCATION_LEN: usize = 255;
pub const MAX_IMAGE_URL_LEN: usize = 255;

/// Reject `value` when it would not fit its column.
pub fn check_len(field: &str, value: &str, max: usize) -> Result<(), ComplaintsServiceError> {
    if value.chars().count() > max {
        return Err(ComplaintsServiceError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Severity from the classifier must be a finite fraction.
pub fn is_valid_severity(score: f64) -> bool {
    score.is_finite() && (0.0..=1.0).contains(&score)
}
