use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use civic_domain::user::UserRole;

use crate::domain::repository::{ComplaintRepository, UpdateRepository, UserRepository};
use crate::domain::types::Update;
use crate::error::ComplaintsServiceError;
use crate::usecase::lifecycle::non_blank;
use crate::usecase::locks::ComplaintLocks;

// ── AppendUpdate ─────────────────────────────────────────────────────────────

pub struct AppendUpdateUseCase<C: ComplaintRepository, U: UpdateRepository, R: UserRepository> {
    pub complaints: C,
    pub updates: U,
    pub users: R,
    pub locks: Arc<ComplaintLocks>,
}

impl<C: ComplaintRepository, U: UpdateRepository, R: UserRepository> AppendUpdateUseCase<C, U, R> {
    /// Annotate a complaint without touching its status. Terminal complaints accept notes too.
    pub async fn execute(
        &self,
        caller_id: Uuid,
        caller_role: UserRole,
        complaint_id: Uuid,
        message: String,
    ) -> Result<Update, ComplaintsServiceError> {
        if !caller_role.is_staff() {
            return Err(ComplaintsServiceError::Forbidden);
        }
        let message = non_blank(Some(message))
            .ok_or_else(|| ComplaintsServiceError::validation("message is required"))?;

        let _guard = self.locks.acquire(complaint_id).await;
        let complaint = self
            .complaints
            .find_by_id(complaint_id)
            .await?
            .ok_or(ComplaintsServiceError::ComplaintNotFound)?;
        let author = self
            .users
            .find_by_id(caller_id)
            .await?
            .ok_or(ComplaintsServiceError::UserNotFound)?;

        let update = Update::by_user(complaint.id, &author, message);
        self.updates.append(&update).await?;
        info!(complaint_id = %complaint.id, update_id = %update.id, "complaint annotated");
        Ok(update)
    }
}

// ── ListUpdates ──────────────────────────────────────────────────────────────

pub struct ListUpdatesUseCase<C: ComplaintRepository, U: UpdateRepository> {
    pub complaints: C,
    pub updates: U,
}

impl<C: ComplaintRepository, U: UpdateRepository> ListUpdatesUseCase<C, U> {
    /// Full trail, oldest first.
    pub async fn execute(
        &self,
        caller_id: Uuid,
        caller_role: UserRole,
        complaint_id: Uuid,
    ) -> Result<Vec<Update>, ComplaintsServiceError> {
        let complaint = self
            .complaints
            .find_by_id(complaint_id)
            .await?
            .ok_or(ComplaintsServiceError::ComplaintNotFound)?;
        if caller_role == UserRole::User && complaint.submitter_id != caller_id {
            return Err(ComplaintsServiceError::Forbidden);
        }
        self.updates.list(complaint.id).await
    }
}
