use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use civic_domain::complaint::ComplaintStatus;
use civic_domain::user::UserRole;

use crate::domain::lifecycle::check_assign;
use crate::domain::repository::{ComplaintRepository, Notifier, UserRepository};
use crate::domain::types::{Complaint, ComplaintChange, Mail, Update, User};
use crate::error::ComplaintsServiceError;
use crate::usecase::lifecycle::non_blank;
use crate::usecase::locks::ComplaintLocks;

pub const DEFAULT_ASSIGN_MESSAGE: &str = "Worker assigned to complaint";

/// Result of a committed assignment. `warnings` carries side-effect failures.
#[derive(Debug, Clone)]
pub struct AssignOutcome {
    pub complaint: Complaint,
    pub warnings: Vec<String>,
}

pub struct AssignWorkerUseCase<C: ComplaintRepository, R: UserRepository, N: Notifier> {
    pub complaints: C,
    pub users: R,
    pub notifier: N,
    pub locks: Arc<ComplaintLocks>,
    pub notify_timeout: Duration,
}

impl<C: ComplaintRepository, R: UserRepository, N: Notifier> AssignWorkerUseCase<C, R, N> {
    pub async fn execute(
        &self,
        caller_role: UserRole,
        complaint_id: Uuid,
        worker_id: Uuid,
        message: Option<String>,
    ) -> Result<AssignOutcome, ComplaintsServiceError> {
        if caller_role != UserRole::Admin {
            return Err(ComplaintsServiceError::Forbidden);
        }

        let (complaint, worker) = {
            let _guard = self.locks.acquire(complaint_id).await;

            let mut complaint = self
                .complaints
                .find_by_id(complaint_id)
                .await?
                .ok_or(ComplaintsServiceError::ComplaintNotFound)?;
            let worker = self
                .users
                .find_by_id(worker_id)
                .await?
                .filter(|u| u.role == UserRole::Worker)
                .ok_or(ComplaintsServiceError::WorkerNotFound)?;
            check_assign(caller_role, complaint.status)?;

            let mut change = ComplaintChange::from_current(&complaint);
            change.status = ComplaintStatus::Assigned;
            change.assigned_worker_id = Some(worker.id);
            let message = non_blank(message).unwrap_or_else(|| DEFAULT_ASSIGN_MESSAGE.to_owned());
            let update = Update::by_system(complaint.id, message);

            if !self.complaints.apply_change(&change, Some(&update)).await? {
                return Err(ComplaintsServiceError::InvalidTransition {
                    from: change.expected_status,
                    to: ComplaintStatus::Assigned,
                });
            }
            change.apply_to(&mut complaint);
            info!(
                complaint_id = %complaint.id,
                worker_id = %worker.id,
                "worker assigned"
            );
            (complaint, worker)
        };

        let mut warnings = Vec::new();
        let mail = assignment_mail(&worker, &complaint);
        match tokio::time::timeout(self.notify_timeout, self.notifier.send(&mail)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(complaint_id = %complaint.id, worker_id = %worker.id, error = %e, "assignment notification failed");
                warnings.push(format!("notification to worker failed: {e}"));
            }
            Err(_) => {
                warn!(complaint_id = %complaint.id, worker_id = %worker.id, "assignment notification timed out");
                warnings.push("notification to worker timed out".to_owned());
            }
        }

        Ok(AssignOutcome {
            complaint,
            warnings,
        })
    }
}

/// Email telling a worker what they were assigned and where.
pub fn assignment_mail(worker: &User, complaint: &Complaint) -> Mail {
    Mail {
        to: worker.email.clone(),
        subject: format!("New complaint assigned: {}", complaint.title),
        body: format!(
            "<p>Hello {name},</p>\
             <p>You have been assigned a new complaint.</p>\
             <ul>\
             <li><strong>Title:</strong> {title}</li>\
             <li><strong>Description:</strong> {description}</li>\
             <li><strong>Category:</strong> {category}</li>\
             <li><strong>Location:</strong> {location}</li>\
             </ul>",
            name = html_escape(&worker.name),
            title = html_escape(&complaint.title),
            description = html_escape(&complaint.description),
            category = complaint.category,
            location = html_escape(&complaint.location),
        ),
    }
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
