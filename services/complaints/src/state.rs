use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;

use crate::infra::classifier::ClassifierClient;
use crate::infra::db::{DbComplaintRepository, DbUpdateRepository, DbUserRepository};
use crate::infra::mail::MailNotifier;
use crate::infra::storage::LocalImageStore;
use crate::usecase::locks::ComplaintLocks;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub locks: Arc<ComplaintLocks>,
    pub notifier: MailNotifier,
    pub classifier: ClassifierClient,
    pub images: LocalImageStore,
    /// Bound on notifier and classifier calls.
    pub dependency_timeout: Duration,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn complaint_repo(&self) -> DbComplaintRepository {
        DbComplaintRepository {
            db: self.db.clone(),
        }
    }

    pub fn update_repo(&self) -> DbUpdateRepository {
        DbUpdateRepository {
            db: self.db.clone(),
        }
    }
}
