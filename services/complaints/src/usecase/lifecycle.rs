use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use civic_domain::complaint::{ComplaintStatus, Priority};
use civic_domain::user::UserRole;

use crate::domain::lifecycle::{Transition, check_transition, default_status_message};
use crate::domain::repository::{ComplaintRepository, UserRepository};
use crate::domain::types::{Complaint, ComplaintChange, Update};
use crate::error::ComplaintsServiceError;
use crate::usecase::locks::ComplaintLocks;

/// Caller-supplied message, or `None` when absent or blank.
pub(crate) fn non_blank(message: Option<String>) -> Option<String> {
    message
        .map(|m| m.trim().to_owned())
        .filter(|m| !m.is_empty())
}

// ── TransitionStatus ─────────────────────────────────────────────────────────

pub struct TransitionStatusUseCase<C: ComplaintRepository, R: UserRepository> {
    pub complaints: C,
    pub users: R,
    pub locks: Arc<ComplaintLocks>,
}

impl<C: ComplaintRepository, R: UserRepository> TransitionStatusUseCase<C, R> {
    /// Move a complaint to `to`, appending one update in the same commit.
    ///
    /// Requesting `in_progress` on a complaint already `in_progress` returns it untouched.
    pub async fn execute(
        &self,
        caller_id: Uuid,
        caller_role: UserRole,
        complaint_id: Uuid,
        to: ComplaintStatus,
        message: Option<String>,
    ) -> Result<Complaint, ComplaintsServiceError> {
        let _guard = self.locks.acquire(complaint_id).await;

        let mut complaint = self
            .complaints
            .find_by_id(complaint_id)
            .await?
            .ok_or(ComplaintsServiceError::ComplaintNotFound)?;
        let from = complaint.status;

        if check_transition(caller_role, from, to)? == Transition::Unchanged {
            return Ok(complaint);
        }

        let author = self
            .users
            .find_by_id(caller_id)
            .await?
            .ok_or(ComplaintsServiceError::UserNotFound)?;
        let message = non_blank(message).unwrap_or_else(|| default_status_message(to));

        let mut change = ComplaintChange::from_current(&complaint);
        change.status = to;
        let update = Update::by_user(complaint.id, &author, message);

        if !self.complaints.apply_change(&change, Some(&update)).await? {
            return Err(ComplaintsServiceError::InvalidTransition { from, to });
        }
        change.apply_to(&mut complaint);
        info!(
            complaint_id = %complaint.id,
            from = %from,
            status = %to,
            actor_id = %caller_id,
            "complaint status changed"
        );
        Ok(complaint)
    }
}

// ── SetPriority ──────────────────────────────────────────────────────────────

pub struct SetPriorityUseCase<C: ComplaintRepository> {
    pub complaints: C,
    pub locks: Arc<ComplaintLocks>,
}

impl<C: ComplaintRepository> SetPriorityUseCase<C> {
    /// Admin triage. Allowed in any status; appends no update.
    pub async fn execute(
        &self,
        caller_role: UserRole,
        complaint_id: Uuid,
        priority: Priority,
    ) -> Result<Complaint, ComplaintsServiceError> {
        if caller_role != UserRole::Admin {
            return Err(ComplaintsServiceError::Forbidden);
        }
        let _guard = self.locks.acquire(complaint_id).await;

        let mut complaint = self
            .complaints
            .find_by_id(complaint_id)
            .await?
            .ok_or(ComplaintsServiceError::ComplaintNotFound)?;
        if complaint.priority == priority {
            return Ok(complaint);
        }

        let mut change = ComplaintChange::from_current(&complaint);
        change.priority = priority;
        if !self.complaints.apply_change(&change, None).await? {
            return Err(
                anyhow::anyhow!("complaint {complaint_id} changed while setting priority").into(),
            );
        }
        change.apply_to(&mut complaint);
        info!(complaint_id = %complaint.id, priority = %priority, "complaint priority set");
        Ok(complaint)
    }
}
