//! Complaint status state machine.
//!
//! ```text
//! pending ──assign──▶ assigned ──▶ in_progress ──▶ completed
//!    │                   │              │
//!    └───────────────────┴──────────────┴────────▶ rejected (admin)
//! ```
//!
//! `pending → in_progress` and `{pending, assigned} → completed` are also legal.
//! Nothing leaves `completed` or `rejected`.

use civic_domain::complaint::ComplaintStatus;
use civic_domain::user::UserRole;

use crate::error::ComplaintsServiceError;

/// Outcome of a permitted status request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Commit the new status and append an update.
    Apply,
    /// Already there; change nothing.
    Unchanged,
}

/// Decide whether `role` may move a complaint from `from` to `to`.
///
/// `assigned` is never a valid target here: it is reached only through [`check_assign`].
pub fn check_transition(
    role: UserRole,
    from: ComplaintStatus,
    to: ComplaintStatus,
) -> Result<Transition, ComplaintsServiceError> {
    if !role.is_staff() {
        return Err(ComplaintsServiceError::Forbidden);
    }
    let invalid = ComplaintsServiceError::InvalidTransition { from, to };
    if from.is_terminal() {
        return Err(invalid);
    }
    match to {
        ComplaintStatus::Pending | ComplaintStatus::Assigned => Err(invalid),
        ComplaintStatus::InProgress if from == ComplaintStatus::InProgress => {
            Ok(Transition::Unchanged)
        }
        ComplaintStatus::InProgress | ComplaintStatus::Completed => Ok(Transition::Apply),
        ComplaintStatus::Rejected if role == UserRole::Admin => Ok(Transition::Apply),
        ComplaintStatus::Rejected => Err(ComplaintsServiceError::Forbidden),
    }
}

/// Assignment is an admin action on a `pending` complaint.
pub fn check_assign(role: UserRole, from: ComplaintStatus) -> Result<(), ComplaintsServiceError> {
    if role != UserRole::Admin {
        return Err(ComplaintsServiceError::Forbidden);
    }
    if from != ComplaintStatus::Pending {
        return Err(ComplaintsServiceError::InvalidTransition {
            from,
            to: ComplaintStatus::Assigned,
        });
    }
    Ok(())
}

/// Check an optional assignment followed by an optional status request, as one edit,
/// against the complaint's current status. Nothing may commit unless the whole edit passes.
pub fn check_edit(
    role: UserRole,
    from: ComplaintStatus,
    assign: bool,
    to: Option<ComplaintStatus>,
) -> Result<(), ComplaintsServiceError> {
    let mut status = from;
    if assign {
        check_assign(role, status)?;
        status = ComplaintStatus::Assigned;
    }
    if let Some(to) = to {
        check_transition(role, status, to)?;
    }
    Ok(())
}

/// Message recorded when the caller supplies none.
pub fn default_status_message(to: ComplaintStatus) -> String {
    format!("Status changed to {to}")
}
