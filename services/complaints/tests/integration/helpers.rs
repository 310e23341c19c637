use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use civic_complaints::domain::repository::{
    Classifier, ComplaintRepository, ImageStore, Notifier, UpdateRepository, UserRepository,
};
use civic_complaints::domain::types::{
    Complaint, ComplaintChange, ComplaintOrder, ComplaintScope, ImageUpload, Mail, Suggestion,
    Update, User, WorkerLoad,
};
use civic_complaints::error::ComplaintsServiceError;
use civic_complaints::usecase::assignment::AssignWorkerUseCase;
use civic_complaints::usecase::complaint::{CreateComplaintInput, CreateComplaintUseCase};
use civic_complaints::usecase::edit::EditComplaintUseCase;
use civic_complaints::usecase::lifecycle::TransitionStatusUseCase;
use civic_complaints::usecase::locks::ComplaintLocks;
use civic_domain::complaint::{Category, ComplaintStatus, Priority};
use civic_domain::geo::Coordinates;
use civic_domain::pagination::PageRequest;
use civic_domain::user::UserRole;

pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(2);

// ── MemoryStore ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    complaints: Vec<Complaint>,
    updates: Vec<Update>,
}

/// One in-memory database implementing every repository port.
///
/// Clones share the same tables, so one store can be handed to several usecases.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        self.tables.lock().unwrap().users.push(user);
    }

    pub fn complaint(&self, id: Uuid) -> Complaint {
        self.tables
            .lock()
            .unwrap()
            .complaints
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .unwrap()
    }

    pub fn complaint_count(&self) -> usize {
        self.tables.lock().unwrap().complaints.len()
    }

    pub fn updates_for(&self, id: Uuid) -> Vec<Update> {
        let mut updates: Vec<Update> = self
            .tables
            .lock()
            .unwrap()
            .updates
            .iter()
            .filter(|u| u.complaint_id == id)
            .cloned()
            .collect();
        updates.sort_by_key(|u| (u.created_at, u.id));
        updates
    }
}

fn newest_first(complaints: &mut [Complaint]) {
    complaints.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

fn paginate<T: Clone>(items: &[T], page: PageRequest) -> Vec<T> {
    items
        .iter()
        .skip(page.offset() as usize)
        .take(page.clamped().limit as usize)
        .cloned()
        .collect()
}

impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ComplaintsServiceError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, ComplaintsServiceError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ComplaintsServiceError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, user: &User) -> Result<(), ComplaintsServiceError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(ComplaintsServiceError::EmailAlreadyRegistered);
        }
        tables.users.push(user.clone());
        Ok(())
    }

    async fn list_workers(
        &self,
        page: PageRequest,
    ) -> Result<(Vec<User>, u64), ComplaintsServiceError> {
        let workers = self.all_workers().await?;
        Ok((paginate(&workers, page), workers.len() as u64))
    }

    async fn all_workers(&self) -> Result<Vec<User>, ComplaintsServiceError> {
        let mut workers: Vec<User> = self
            .tables
            .lock()
            .unwrap()
            .users
            .iter()
            .filter(|u| u.role == UserRole::Worker)
            .cloned()
            .collect();
        workers.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(workers)
    }

    async fn list_members(
        &self,
        page: PageRequest,
    ) -> Result<(Vec<User>, u64), ComplaintsServiceError> {
        let mut members: Vec<User> = self
            .tables
            .lock()
            .unwrap()
            .users
            .iter()
            .filter(|u| u.role != UserRole::Admin)
            .cloned()
            .collect();
        members.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok((paginate(&members, page), members.len() as u64))
    }

    async fn count_by_role(&self, role: UserRole) -> Result<u64, ComplaintsServiceError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .users
            .iter()
            .filter(|u| u.role == role)
            .count() as u64)
    }
}

impl ComplaintRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Complaint>, ComplaintsServiceError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .complaints
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn create(&self, complaint: &Complaint) -> Result<(), ComplaintsServiceError> {
        self.tables
            .lock()
            .unwrap()
            .complaints
            .push(complaint.clone());
        Ok(())
    }

    async fn list(
        &self,
        scope: ComplaintScope,
        order: ComplaintOrder,
        page: PageRequest,
    ) -> Result<(Vec<Complaint>, u64), ComplaintsServiceError> {
        let mut matching = self.list_all(scope).await?;
        if order == ComplaintOrder::Triage {
            // Stable sort keeps newest-first within equal ranks.
            matching.sort_by_key(|c| (c.status.triage_rank(), c.priority.triage_rank()));
        }
        Ok((paginate(&matching, page), matching.len() as u64))
    }

    async fn list_all(
        &self,
        scope: ComplaintScope,
    ) -> Result<Vec<Complaint>, ComplaintsServiceError> {
        let mut matching: Vec<Complaint> = self
            .tables
            .lock()
            .unwrap()
            .complaints
            .iter()
            .filter(|c| scope.contains(c))
            .cloned()
            .collect();
        newest_first(&mut matching);
        Ok(matching)
    }

    async fn recent(&self, limit: u64) -> Result<Vec<Complaint>, ComplaintsServiceError> {
        let mut all = self.list_all(ComplaintScope::All).await?;
        all.truncate(limit as usize);
        Ok(all)
    }

    async fn apply_change(
        &self,
        change: &ComplaintChange,
        update: Option<&Update>,
    ) -> Result<bool, ComplaintsServiceError> {
        let mut tables = self.tables.lock().unwrap();
        let Some(stored) = tables.complaints.iter_mut().find(|c| c.id == change.id) else {
            return Ok(false);
        };
        if stored.status != change.expected_status {
            return Ok(false);
        }
        change.apply_to(stored);
        if let Some(update) = update {
            tables.updates.push(update.clone());
        }
        Ok(true)
    }

    async fn worker_loads(
        &self,
        worker_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, WorkerLoad>, ComplaintsServiceError> {
        let mut loads: HashMap<Uuid, WorkerLoad> = HashMap::new();
        for complaint in &self.tables.lock().unwrap().complaints {
            let Some(worker_id) = complaint.assigned_worker_id else {
                continue;
            };
            if !worker_ids.contains(&worker_id) {
                continue;
            }
            let load = loads.entry(worker_id).or_default();
            load.assigned_total += 1;
            if complaint.status.is_active() {
                load.active += 1;
            }
        }
        Ok(loads)
    }

    async fn count_by_status(
        &self,
    ) -> Result<Vec<(ComplaintStatus, u64)>, ComplaintsServiceError> {
        let tables = self.tables.lock().unwrap();
        Ok(ComplaintStatus::ALL
            .into_iter()
            .map(|s| (s, tables.complaints.iter().filter(|c| c.status == s).count() as u64))
            .filter(|(_, n)| *n > 0)
            .collect())
    }

    async fn count_by_category(&self) -> Result<Vec<(Category, u64)>, ComplaintsServiceError> {
        let tables = self.tables.lock().unwrap();
        Ok(Category::ALL
            .into_iter()
            .map(|k| (k, tables.complaints.iter().filter(|c| c.category == k).count() as u64))
            .filter(|(_, n)| *n > 0)
            .collect())
    }

    async fn count_by_priority(&self) -> Result<Vec<(Priority, u64)>, ComplaintsServiceError> {
        let tables = self.tables.lock().unwrap();
        Ok(Priority::ALL
            .into_iter()
            .map(|p| (p, tables.complaints.iter().filter(|c| c.priority == p).count() as u64))
            .filter(|(_, n)| *n > 0)
            .collect())
    }
}

impl UpdateRepository for MemoryStore {
    async fn append(&self, update: &Update) -> Result<(), ComplaintsServiceError> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.complaints.iter().any(|c| c.id == update.complaint_id) {
            return Err(ComplaintsServiceError::ComplaintNotFound);
        }
        tables.updates.push(update.clone());
        Ok(())
    }

    async fn list(&self, complaint_id: Uuid) -> Result<Vec<Update>, ComplaintsServiceError> {
        Ok(self.updates_for(complaint_id))
    }
}

// ── Outbound mocks ───────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockNotifier {
    pub sent: Arc<Mutex<Vec<Mail>>>,
}

impl MockNotifier {
    pub fn sent_handle(&self) -> Arc<Mutex<Vec<Mail>>> {
        Arc::clone(&self.sent)
    }
}

impl Notifier for MockNotifier {
    async fn send(&self, mail: &Mail) -> Result<(), ComplaintsServiceError> {
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    async fn send(&self, _mail: &Mail) -> Result<(), ComplaintsServiceError> {
        Err(ComplaintsServiceError::DependencyFailure(
            "smtp: connection refused".to_owned(),
        ))
    }
}

/// Never answers; only a timeout ends the call.
pub struct HangingNotifier;

impl Notifier for HangingNotifier {
    async fn send(&self, _mail: &Mail) -> Result<(), ComplaintsServiceError> {
        std::future::pending().await
    }
}

pub struct MockImageStore;

impl ImageStore for MockImageStore {
    async fn store(&self, image: &ImageUpload) -> Result<String, ComplaintsServiceError> {
        Ok(format!("/uploads/test_{}", image.file_name))
    }
}

pub struct MockClassifier {
    pub suggestion: Suggestion,
}

impl Classifier for MockClassifier {
    async fn classify(&self, _image: &ImageUpload) -> Result<Suggestion, ComplaintsServiceError> {
        Ok(self.suggestion.clone())
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn user(name: &str, role: UserRole, location: Option<(f64, f64)>) -> User {
    User {
        id: Uuid::now_v7(),
        name: name.to_owned(),
        email: format!("{}@city.test", name.to_lowercase().replace(' ', ".")),
        phone: Some("555-0100".to_owned()),
        password_hash: "$argon2id$placeholder".to_owned(),
        role,
        location: location.map(|(lat, lon)| Coordinates::new(lat, lon).unwrap()),
        created_at: Utc::now(),
    }
}

/// A seeded city: one citizen, one admin, and two workers about 60 m and 1 km
/// from the downtown complaint site `(12.9716, 77.5946)`.
pub struct World {
    pub store: MemoryStore,
    pub locks: Arc<ComplaintLocks>,
    pub citizen: User,
    pub admin: User,
    pub near_worker: User,
    pub far_worker: User,
}

pub const DOWNTOWN: &str = "12.9716, 77.5946";

impl World {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let citizen = user("Ana Citizen", UserRole::User, None);
        let admin = user("Root Admin", UserRole::Admin, None);
        let near_worker = user("Nia Near", UserRole::Worker, Some((12.9720, 77.5950)));
        let far_worker = user("Fred Far", UserRole::Worker, Some((12.9806, 77.5946)));
        for u in [&citizen, &admin, &near_worker, &far_worker] {
            store.insert_user(u.clone());
        }
        Self {
            store,
            locks: Arc::new(ComplaintLocks::new()),
            citizen,
            admin,
            near_worker,
            far_worker,
        }
    }

    pub async fn file(&self, title: &str, category: &str) -> Complaint {
        self.file_as(&self.citizen, title, category).await
    }

    pub async fn file_as(&self, submitter: &User, title: &str, category: &str) -> Complaint {
        let usecase = CreateComplaintUseCase {
            users: self.store.clone(),
            complaints: self.store.clone(),
            images: MockImageStore,
        };
        usecase
            .execute(
                submitter.id,
                submitter.role,
                CreateComplaintInput {
                    title: title.to_owned(),
                    description: format!("{title}, please fix"),
                    category: category.to_owned(),
                    location: DOWNTOWN.to_owned(),
                    image_severity_score: None,
                    image: None,
                },
            )
            .await
            .unwrap()
    }

    pub async fn active_load(&self, worker_id: Uuid) -> u64 {
        self.store
            .worker_loads(&[worker_id])
            .await
            .unwrap()
            .get(&worker_id)
            .map_or(0, |load| load.active)
    }

    pub fn assigner<N: Notifier>(
        &self,
        notifier: N,
    ) -> AssignWorkerUseCase<MemoryStore, MemoryStore, N> {
        AssignWorkerUseCase {
            complaints: self.store.clone(),
            users: self.store.clone(),
            notifier,
            locks: self.locks.clone(),
            notify_timeout: NOTIFY_TIMEOUT,
        }
    }

    pub fn editor<N: Notifier + Clone>(
        &self,
        notifier: N,
    ) -> EditComplaintUseCase<MemoryStore, MemoryStore, MemoryStore, N> {
        EditComplaintUseCase {
            complaints: self.store.clone(),
            users: self.store.clone(),
            updates: self.store.clone(),
            notifier,
            locks: self.locks.clone(),
            notify_timeout: NOTIFY_TIMEOUT,
        }
    }

    pub fn transitions(&self) -> TransitionStatusUseCase<MemoryStore, MemoryStore> {
        TransitionStatusUseCase {
            complaints: self.store.clone(),
            users: self.store.clone(),
            locks: self.locks.clone(),
        }
    }
}
