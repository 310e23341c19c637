use civic_domain::complaint::{Category, ComplaintStatus, Priority};
use civic_domain::user::UserRole;

use crate::domain::repository::{ComplaintRepository, UserRepository};
use crate::domain::types::Complaint;
use crate::error::ComplaintsServiceError;

/// How many of the newest complaints the dashboard shows.
pub const RECENT_COMPLAINTS: u64 = 5;

/// Admin dashboard summary, computed at call time.
#[derive(Debug, Clone)]
pub struct Analytics {
    pub total_complaints: u64,
    pub total_users: u64,
    pub total_workers: u64,
    /// Every status, in lifecycle order, zero-filled.
    pub status_breakdown: Vec<(ComplaintStatus, u64)>,
    /// Only categories with at least one complaint.
    pub category_breakdown: Vec<(Category, u64)>,
    /// Only priorities with at least one complaint.
    pub priority_breakdown: Vec<(Priority, u64)>,
    pub recent_complaints: Vec<Complaint>,
}

pub struct AnalyticsUseCase<C: ComplaintRepository, R: UserRepository> {
    pub complaints: C,
    pub users: R,
}

impl<C: ComplaintRepository, R: UserRepository> AnalyticsUseCase<C, R> {
    pub async fn execute(&self, caller_role: UserRole) -> Result<Analytics, ComplaintsServiceError> {
        if caller_role != UserRole::Admin {
            return Err(ComplaintsServiceError::Forbidden);
        }

        let counted = self.complaints.count_by_status().await?;
        let status_breakdown: Vec<(ComplaintStatus, u64)> = ComplaintStatus::ALL
            .into_iter()
            .map(|status| {
                let n: u64 = counted
                    .iter()
                    .filter(|(s, _)| *s == status)
                    .map(|(_, n)| n)
                    .sum();
                (status, n)
            })
            .collect();
        // Summed from the grouped counts: the breakdown always adds up to the total.
        let total_complaints: u64 = status_breakdown.iter().map(|(_, n)| n).sum();

        let mut category_breakdown = self.complaints.count_by_category().await?;
        category_breakdown.retain(|(_, n)| *n > 0);
        category_breakdown.sort_by_key(|(c, _)| *c);

        let mut priority_breakdown = self.complaints.count_by_priority().await?;
        priority_breakdown.retain(|(_, n)| *n > 0);
        priority_breakdown.sort_by_key(|(p, _)| p.triage_rank());

        Ok(Analytics {
            total_complaints,
            total_users: self.users.count_by_role(UserRole::User).await?,
            total_workers: self.users.count_by_role(UserRole::Worker).await?,
            status_breakdown,
            category_breakdown,
            priority_breakdown,
            recent_complaints: self.complaints.recent(RECENT_COMPLAINTS).await?,
        })
    }
}
