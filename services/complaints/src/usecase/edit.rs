use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use civic_domain::complaint::{ComplaintStatus, Priority};
use civic_domain::user::UserRole;

use crate::domain::lifecycle::check_edit;
use crate::domain::repository::{ComplaintRepository, Notifier, UpdateRepository, UserRepository};
use crate::domain::types::Complaint;
use crate::error::ComplaintsServiceError;
use crate::usecase::assignment::AssignWorkerUseCase;
use crate::usecase::lifecycle::{SetPriorityUseCase, TransitionStatusUseCase};
use crate::usecase::locks::ComplaintLocks;
use crate::usecase::update_log::AppendUpdateUseCase;

/// Everything one staff edit may ask for. Empty fields are left alone.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ComplaintEdit {
    pub worker_id: Option<Uuid>,
    pub status: Option<ComplaintStatus>,
    pub priority: Option<Priority>,
    pub message: Option<String>,
}

impl ComplaintEdit {
    pub fn is_empty(&self) -> bool {
        self.worker_id.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.message.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub complaint: Complaint,
    pub warnings: Vec<String>,
}

// ── EditComplaint ────────────────────────────────────────────────────────────

pub struct EditComplaintUseCase<C, R, U, N>
where
    C: ComplaintRepository + Clone,
    R: UserRepository + Clone,
    U: UpdateRepository + Clone,
    N: Notifier + Clone,
{
    pub complaints: C,
    pub users: R,
    pub updates: U,
    pub notifier: N,
    pub locks: Arc<ComplaintLocks>,
    pub notify_timeout: Duration,
}

impl<C, R, U, N> EditComplaintUseCase<C, R, U, N>
where
    C: ComplaintRepository + Clone,
    R: UserRepository + Clone,
    U: UpdateRepository + Clone,
    N: Notifier + Clone,
{
    /// Assign, then change status, then set priority. The message goes to the first
    /// action that records an update, or becomes a note when none does.
    ///
    /// The whole edit is checked against the current status first, so a request that
    /// would fail halfway is refused before any part commits.
    pub async fn execute(
        &self,
        caller_id: Uuid,
        caller_role: UserRole,
        complaint_id: Uuid,
        edit: ComplaintEdit,
    ) -> Result<EditOutcome, ComplaintsServiceError> {
        if edit.is_empty() {
            return Err(ComplaintsServiceError::validation(
                "one of status, worker_id, priority or message is required",
            ));
        }
        let admin_only = edit.worker_id.is_some() || edit.priority.is_some();
        if !caller_role.is_staff() || (admin_only && caller_role != UserRole::Admin) {
            return Err(ComplaintsServiceError::Forbidden);
        }

        let current = self
            .complaints
            .find_by_id(complaint_id)
            .await?
            .ok_or(ComplaintsServiceError::ComplaintNotFound)?;
        check_edit(
            caller_role,
            current.status,
            edit.worker_id.is_some(),
            edit.status,
        )?;

        let mut message = edit.message;
        let mut warnings = Vec::new();
        let mut latest = current;

        if let Some(worker_id) = edit.worker_id {
            let outcome = AssignWorkerUseCase {
                complaints: self.complaints.clone(),
                users: self.users.clone(),
                notifier: self.notifier.clone(),
                locks: self.locks.clone(),
                notify_timeout: self.notify_timeout,
            }
            .execute(caller_role, complaint_id, worker_id, message.take())
            .await?;
            warnings.extend(outcome.warnings);
            latest = outcome.complaint;
        }

        if let Some(to) = edit.status {
            latest = TransitionStatusUseCase {
                complaints: self.complaints.clone(),
                users: self.users.clone(),
                locks: self.locks.clone(),
            }
            .execute(caller_id, caller_role, complaint_id, to, message.take())
            .await?;
        }

        if let Some(priority) = edit.priority {
            latest = SetPriorityUseCase {
                complaints: self.complaints.clone(),
                locks: self.locks.clone(),
            }
            .execute(caller_role, complaint_id, priority)
            .await?;
        }

        if let Some(note) = message {
            AppendUpdateUseCase {
                complaints: self.complaints.clone(),
                updates: self.updates.clone(),
                users: self.users.clone(),
                locks: self.locks.clone(),
            }
            .execute(caller_id, caller_role, complaint_id, note)
            .await?;
        }

        Ok(EditOutcome {
            complaint: latest,
            warnings,
        })
    }
}
