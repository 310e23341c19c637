use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use civic_domain::complaint::{Category, ComplaintStatus, Priority};
use civic_domain::geo::Coordinates;
use civic_domain::user::UserRole;

use crate::domain::repository::{
    ComplaintRepository, ImageStore, UpdateRepository, UserRepository,
};
use crate::domain::types::{
    Complaint, ImageUpload, MAX_LOCATION_LEN, MAX_TITLE_LEN, Update, User,
    check_len, is_valid_severity,
};
use crate::error::ComplaintsServiceError;

// ── CreateComplaint ──────────────────────────────────────────────────────────

pub struct CreateComplaintInput {
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub image_severity_score: Option<f64>,
    pub image: Option<ImageUpload>,
}

pub struct CreateComplaintUseCase<R: UserRepository, C: ComplaintRepository, S: ImageStore> {
    pub users: R,
    pub complaints: C,
    pub images: S,
}

impl<R: UserRepository, C: ComplaintRepository, S: ImageStore> CreateComplaintUseCase<R, C, S> {
    pub async fn execute(
        &self,
        caller_id: Uuid,
        caller_role: UserRole,
        input: CreateComplaintInput,
    ) -> Result<Complaint, ComplaintsServiceError> {
        if caller_role != UserRole::User {
            return Err(ComplaintsServiceError::Forbidden);
        }

        if input.title.trim().is_empty() || input.description.trim().is_empty() {
            return Err(ComplaintsServiceError::validation(
                "title and description are required",
            ));
        }
        check_len("title", &input.title, MAX_TITLE_LEN)?;
        check_len("location", &input.location, MAX_LOCATION_LEN)?;
        let category = input
            .category
            .parse::<Category>()
            .map_err(|e| ComplaintsServiceError::validation(e.to_string()))?;
        input
            .location
            .parse::<Coordinates>()
            .map_err(|e| ComplaintsServiceError::validation(e.to_string()))?;
        if input
            .image_severity_score
            .is_some_and(|score| !is_valid_severity(score))
        {
            return Err(ComplaintsServiceError::validation(
                "image_severity_score must be between 0 and 1",
            ));
        }

        match self.users.find_by_id(caller_id).await? {
            Some(user) if user.role == UserRole::User => {}
            _ => {
                return Err(ComplaintsServiceError::validation(
                    "submitter must be a registered citizen",
                ));
            }
        }

        let image_url = match &input.image {
            Some(image) => Some(self.images.store(image).await?),
            None => None,
        };

        let now = Utc::now();
        let complaint = Complaint {
            id: Uuid::now_v7(),
            title: input.title,
            description: input.description,
            category,
            priority: Priority::default(),
            status: ComplaintStatus::Pending,
            location: input.location,
            image_url,
            image_severity_score: input.image_severity_score,
            submitter_id: caller_id,
            assigned_worker_id: None,
            created_at: now,
            updated_at: now,
        };
        self.complaints.create(&complaint).await?;
        info!(complaint_id = %complaint.id, category = %complaint.category, "complaint filed");
        Ok(complaint)
    }
}

// ── GetComplaint ─────────────────────────────────────────────────────────────

/// A complaint with its trail and the people attached to it.
#[derive(Debug, Clone)]
pub struct ComplaintDetail {
    pub complaint: Complaint,
    pub updates: Vec<Update>,
    pub submitter: Option<User>,
    pub worker: Option<User>,
}

pub struct GetComplaintUseCase<C: ComplaintRepository, U: UpdateRepository, R: UserRepository> {
    pub complaints: C,
    pub updates: U,
    pub users: R,
}

impl<C: ComplaintRepository, U: UpdateRepository, R: UserRepository> GetComplaintUseCase<C, U, R> {
    pub async fn execute(
        &self,
        caller_id: Uuid,
        caller_role: UserRole,
        complaint_id: Uuid,
    ) -> Result<ComplaintDetail, ComplaintsServiceError> {
        let complaint = self
            .complaints
            .find_by_id(complaint_id)
            .await?
            .ok_or(ComplaintsServiceError::ComplaintNotFound)?;
        if caller_role == UserRole::User && complaint.submitter_id != caller_id {
            return Err(ComplaintsServiceError::Forbidden);
        }

        let updates = self.updates.list(complaint.id).await?;
        let submitter = self.users.find_by_id(complaint.submitter_id).await?;
        let worker = match complaint.assigned_worker_id {
            Some(id) => self.users.find_by_id(id).await?,
            None => None,
        };
        Ok(ComplaintDetail {
            complaint,
            updates,
            submitter,
            worker,
        })
    }
}
