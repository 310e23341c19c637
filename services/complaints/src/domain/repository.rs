#![allow(async_fn_in_trait)]

use std::collections::HashMap;

use uuid::Uuid;

use civic_domain::complaint::{Category, ComplaintStatus, Priority};
use civic_domain::pagination::PageRequest;
use civic_domain::user::UserRole;

use crate::domain::types::{
    Complaint, ComplaintChange, ComplaintOrder, ComplaintScope, ImageUpload, Mail, Suggestion,
    Update, User, WorkerLoad,
};
use crate::error::ComplaintsServiceError;

/// Repository for accounts of every role.
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ComplaintsServiceError>;

    /// Users among `ids`, in no particular order. Unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, ComplaintsServiceError>;

    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ComplaintsServiceError>;

    /// Fails with `EmailAlreadyRegistered` when the email is taken.
    async fn create(&self, user: &User) -> Result<(), ComplaintsServiceError>;

    /// Workers ordered by name. Returns the page and the total number of workers.
    async fn list_workers(
        &self,
        page: PageRequest,
    ) -> Result<(Vec<User>, u64), ComplaintsServiceError>;

    /// Every worker, ordered by name.
    async fn all_workers(&self) -> Result<Vec<User>, ComplaintsServiceError>;

    /// Citizens and workers (admins excluded), newest first.
    async fn list_members(
        &self,
        page: PageRequest,
    ) -> Result<(Vec<User>, u64), ComplaintsServiceError>;

    async fn count_by_role(&self, role: UserRole) -> Result<u64, ComplaintsServiceError>;
}

/// Repository for complaints and the aggregates derived from them.
pub trait ComplaintRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Complaint>, ComplaintsServiceError>;

    async fn create(&self, complaint: &Complaint) -> Result<(), ComplaintsServiceError>;

    /// One page of complaints plus the total matching `scope`.
    async fn list(
        &self,
        scope: ComplaintScope,
        order: ComplaintOrder,
        page: PageRequest,
    ) -> Result<(Vec<Complaint>, u64), ComplaintsServiceError>;

    /// Every complaint in `scope`, newest first.
    async fn list_all(
        &self,
        scope: ComplaintScope,
    ) -> Result<Vec<Complaint>, ComplaintsServiceError>;

    async fn recent(&self, limit: u64) -> Result<Vec<Complaint>, ComplaintsServiceError>;

    /// Commit `change` and, in the same transaction, append `update`.
    ///
    /// Returns `false` without writing anything if the stored status no longer equals
    /// `change.expected_status`.
    async fn apply_change(
        &self,
        change: &ComplaintChange,
        update: Option<&Update>,
    ) -> Result<bool, ComplaintsServiceError>;

    /// Loads for the given workers. Workers with no complaints are absent from the map.
    async fn worker_loads(
        &self,
        worker_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, WorkerLoad>, ComplaintsServiceError>;

    async fn count_by_status(
        &self,
    ) -> Result<Vec<(ComplaintStatus, u64)>, ComplaintsServiceError>;

    async fn count_by_category(&self) -> Result<Vec<(Category, u64)>, ComplaintsServiceError>;

    async fn count_by_priority(&self) -> Result<Vec<(Priority, u64)>, ComplaintsServiceError>;
}

/// Append-only activity trail.
pub trait UpdateRepository: Send + Sync {
    async fn append(&self, update: &Update) -> Result<(), ComplaintsServiceError>;

    /// Oldest first.
    async fn list(&self, complaint_id: Uuid) -> Result<Vec<Update>, ComplaintsServiceError>;
}

/// Outbound email.
pub trait Notifier: Send + Sync {
    async fn send(&self, mail: &Mail) -> Result<(), ComplaintsServiceError>;
}

/// Drafts complaint fields from a photo.
pub trait Classifier: Send + Sync {
    async fn classify(&self, image: &ImageUpload) -> Result<Suggestion, ComplaintsServiceError>;
}

/// Durable storage for complaint photos.
pub trait ImageStore: Send + Sync {
    /// Returns the public URL of the stored image.
    async fn store(&self, image: &ImageUpload) -> Result<String, ComplaintsServiceError>;
}
