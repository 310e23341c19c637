use std::collections::HashMap;

use uuid::Uuid;

use civic_domain::pagination::{Page, PageRequest};
use civic_domain::user::UserRole;

use crate::domain::repository::{ComplaintRepository, UserRepository};
use crate::domain::types::{Complaint, ComplaintOrder, ComplaintScope, User};
use crate::domain::workload::{Candidate, best_candidate};
use crate::error::ComplaintsServiceError;
use crate::usecase::user::WorkerWithLoad;

/// A complaint as shown on the dashboards.
#[derive(Debug, Clone)]
pub struct ComplaintRow {
    pub complaint: Complaint,
    pub submitter_name: Option<String>,
    pub worker_name: Option<String>,
    /// Admin listings only: best worker for this complaint's location.
    pub suggestion: Option<Candidate>,
}

async fn names_for<R: UserRepository>(
    users: &R,
    complaints: &[Complaint],
) -> Result<HashMap<Uuid, String>, ComplaintsServiceError> {
    let mut ids: Vec<Uuid> = complaints
        .iter()
        .flat_map(|c| std::iter::once(c.submitter_id).chain(c.assigned_worker_id))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(users
        .find_by_ids(&ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect())
}

fn into_rows(complaints: Vec<Complaint>, names: &HashMap<Uuid, String>) -> Vec<ComplaintRow> {
    complaints
        .into_iter()
        .map(|complaint| ComplaintRow {
            submitter_name: names.get(&complaint.submitter_id).cloned(),
            worker_name: complaint
                .assigned_worker_id
                .and_then(|id| names.get(&id).cloned()),
            suggestion: None,
            complaint,
        })
        .collect()
}

// ── ListComplaints ───────────────────────────────────────────────────────────

pub struct ListComplaintsUseCase<C: ComplaintRepository, R: UserRepository> {
    pub complaints: C,
    pub users: R,
}

impl<C: ComplaintRepository, R: UserRepository> ListComplaintsUseCase<C, R> {
    pub async fn execute(
        &self,
        caller_id: Uuid,
        caller_role: UserRole,
        page: PageRequest,
    ) -> Result<Page<ComplaintRow>, ComplaintsServiceError> {
        let page = page.clamped();
        let scope = ComplaintScope::for_caller(caller_id, caller_role);
        let order = if caller_role == UserRole::Admin {
            ComplaintOrder::Triage
        } else {
            ComplaintOrder::Newest
        };

        let (complaints, total) = self.complaints.list(scope, order, page).await?;
        let names = names_for(&self.users, &complaints).await?;
        let mut rows = into_rows(complaints, &names);

        if caller_role == UserRole::Admin && !rows.is_empty() {
            let workers = self.users.all_workers().await?;
            let ids: Vec<Uuid> = workers.iter().map(|w| w.id).collect();
            let loads = self.complaints.worker_loads(&ids).await?;
            for row in &mut rows {
                row.suggestion = row
                    .complaint
                    .coordinates()
                    .and_then(|site| best_candidate(site, &workers, &loads));
            }
        }

        Ok(Page::new(rows, page, total))
    }
}

// ── ListAllComplaints ────────────────────────────────────────────────────────

pub struct ListAllComplaintsUseCase<C: ComplaintRepository, R: UserRepository> {
    pub complaints: C,
    pub users: R,
}

impl<C: ComplaintRepository, R: UserRepository> ListAllComplaintsUseCase<C, R> {
    /// Unpaginated, newest first, scoped like [`ListComplaintsUseCase`].
    pub async fn execute(
        &self,
        caller_id: Uuid,
        caller_role: UserRole,
    ) -> Result<Vec<ComplaintRow>, ComplaintsServiceError> {
        let scope = ComplaintScope::for_caller(caller_id, caller_role);
        let complaints = self.complaints.list_all(scope).await?;
        let names = names_for(&self.users, &complaints).await?;
        Ok(into_rows(complaints, &names))
    }
}

// ── ListWorkers ──────────────────────────────────────────────────────────────

pub struct ListWorkersUseCase<R: UserRepository, C: ComplaintRepository> {
    pub users: R,
    pub complaints: C,
}

impl<R: UserRepository, C: ComplaintRepository> ListWorkersUseCase<R, C> {
    pub async fn execute(
        &self,
        caller_role: UserRole,
        page: PageRequest,
    ) -> Result<Page<WorkerWithLoad>, ComplaintsServiceError> {
        if caller_role != UserRole::Admin {
            return Err(ComplaintsServiceError::Forbidden);
        }
        let page = page.clamped();
        let (workers, total) = self.users.list_workers(page).await?;
        let ids: Vec<Uuid> = workers.iter().map(|w| w.id).collect();
        let loads = if ids.is_empty() {
            HashMap::new()
        } else {
            self.complaints.worker_loads(&ids).await?
        };
        let rows = workers
            .into_iter()
            .map(|worker| WorkerWithLoad {
                load: loads.get(&worker.id).copied().unwrap_or_default(),
                worker,
            })
            .collect();
        Ok(Page::new(rows, page, total))
    }
}

// ── ListUsers ────────────────────────────────────────────────────────────────

pub struct ListUsersUseCase<R: UserRepository> {
    pub users: R,
}

impl<R: UserRepository> ListUsersUseCase<R> {
    /// Citizens and workers, newest first.
    pub async fn execute(
        &self,
        caller_role: UserRole,
        page: PageRequest,
    ) -> Result<Page<User>, ComplaintsServiceError> {
        if caller_role != UserRole::Admin {
            return Err(ComplaintsServiceError::Forbidden);
        }
        let page = page.clamped();
        let (users, total) = self.users.list_members(page).await?;
        Ok(Page::new(users, page, total))
    }
}
