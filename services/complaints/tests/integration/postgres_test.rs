use std::sync::Arc;

use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use civic_complaints::domain::repository::{ComplaintRepository, UpdateRepository, UserRepository};
use civic_complaints::domain::types::{
    ComplaintChange, ComplaintOrder, ComplaintScope, MAX_TITLE_LEN, WorkerLoad,
};
use civic_complaints::error::ComplaintsServiceError;
use civic_complaints::infra::db::{DbComplaintRepository, DbUpdateRepository, DbUserRepository};
use civic_complaints::usecase::analytics::AnalyticsUseCase;
use civic_complaints::usecase::complaint::{CreateComplaintInput, CreateComplaintUseCase};
use civic_complaints::usecase::edit::{ComplaintEdit, EditComplaintUseCase};
use civic_complaints::usecase::locks::ComplaintLocks;
use civic_complaints_migration::Migrator;
use civic_domain::complaint::{ComplaintStatus, Priority};
use civic_domain::pagination::PageRequest;
use civic_domain::user::UserRole;

use crate::helpers::{DOWNTOWN, MockImageStore, MockNotifier, NOTIFY_TIMEOUT, user};

/// Fresh schema on the database named by `TEST_DATABASE_URL`, or `None` when unset.
async fn database() -> Option<DatabaseConnection> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping Postgres repository checks");
        return None;
    };
    let db = Database::connect(&url).await.unwrap();
    Migrator::fresh(&db).await.unwrap();
    Some(db)
}

fn input(title: &str, category: &str) -> CreateComplaintInput {
    CreateComplaintInput {
        title: title.to_owned(),
        description: "Reported from the street".to_owned(),
        category: category.to_owned(),
        location: DOWNTOWN.to_owned(),
        image_severity_score: None,
        image: None,
    }
}

// ── Postgres repositories ────────────────────────────────────────────────────

// One test owns the schema so the checks never race on `Migrator::fresh`.
#[tokio::test]
async fn should_keep_lifecycle_rules_against_postgres() {
    let Some(db) = database().await else {
        return;
    };
    let users = DbUserRepository { db: db.clone() };
    let complaints = DbComplaintRepository { db: db.clone() };
    let updates = DbUpdateRepository { db: db.clone() };

    let citizen = user("Pat Citizen", UserRole::User, None);
    let admin = user("Ada Admin", UserRole::Admin, None);
    let worker = user("Wes Worker", UserRole::Worker, Some((12.9720, 77.5950)));
    for account in [&citizen, &admin, &worker] {
        users.create(account).await.unwrap();
    }

    // Unique index on email maps to the domain error.
    let twin = user("Pat Citizen", UserRole::User, None);
    assert!(matches!(
        users.create(&twin).await,
        Err(ComplaintsServiceError::EmailAlreadyRegistered)
    ));

    let creator = CreateComplaintUseCase {
        users: users.clone(),
        complaints: complaints.clone(),
        images: MockImageStore,
    };
    let leak = creator
        .execute(citizen.id, UserRole::User, input("Burst main", "water"))
        .await
        .unwrap();
    let pothole = creator
        .execute(citizen.id, UserRole::User, input("Pothole", "infrastructure"))
        .await
        .unwrap();
    let crash = creator
        .execute(citizen.id, UserRole::User, input("Crash at junction", "accident"))
        .await
        .unwrap();

    let editor = EditComplaintUseCase {
        complaints: complaints.clone(),
        users: users.clone(),
        updates: updates.clone(),
        notifier: MockNotifier::default(),
        locks: Arc::new(ComplaintLocks::new()),
        notify_timeout: NOTIFY_TIMEOUT,
    };
    editor
        .execute(
            admin.id,
            UserRole::Admin,
            leak.id,
            ComplaintEdit {
                worker_id: Some(worker.id),
                status: Some(ComplaintStatus::InProgress),
                message: Some("Crew dispatched".to_owned()),
                ..ComplaintEdit::default()
            },
        )
        .await
        .unwrap();
    editor
        .execute(
            admin.id,
            UserRole::Admin,
            crash.id,
            ComplaintEdit {
                priority: Some(Priority::Critical),
                ..ComplaintEdit::default()
            },
        )
        .await
        .unwrap();

    // A refused edit leaves the row exactly as it was.
    let refused = editor
        .execute(
            admin.id,
            UserRole::Admin,
            pothole.id,
            ComplaintEdit {
                worker_id: Some(worker.id),
                status: Some(ComplaintStatus::Pending),
                ..ComplaintEdit::default()
            },
        )
        .await;
    assert!(matches!(
        refused,
        Err(ComplaintsServiceError::InvalidTransition { .. })
    ));
    let stored = complaints.find_by_id(pothole.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ComplaintStatus::Pending);
    assert_eq!(stored.assigned_worker_id, None);

    // Compare-and-set on status loses against a stale read.
    let mut stale = ComplaintChange::from_current(&pothole);
    stale.expected_status = ComplaintStatus::Assigned;
    stale.status = ComplaintStatus::Completed;
    assert!(!complaints.apply_change(&stale, None).await.unwrap());
    let stored = complaints.find_by_id(pothole.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ComplaintStatus::Pending);

    let (triaged, total) = complaints
        .list(
            ComplaintScope::All,
            ComplaintOrder::Triage,
            PageRequest { page: 1, limit: 10 },
        )
        .await
        .unwrap();
    assert_eq!(total, 3);
    let order: Vec<_> = triaged.iter().map(|c| c.id).collect();
    assert_eq!(order, vec![crash.id, pothole.id, leak.id]);

    let (past_end, total) = complaints
        .list(
            ComplaintScope::SubmittedBy(citizen.id),
            ComplaintOrder::Newest,
            PageRequest { page: 5, limit: 5 },
        )
        .await
        .unwrap();
    assert!(past_end.is_empty());
    assert_eq!(total, 3);

    let loads = complaints.worker_loads(&[worker.id]).await.unwrap();
    assert_eq!(
        loads.get(&worker.id).copied(),
        Some(WorkerLoad {
            active: 1,
            assigned_total: 1,
        })
    );

    let trail = updates.list(leak.id).await.unwrap();
    assert_eq!(trail.len(), 2);
    assert!(
        trail
            .iter()
            .any(|u| u.author_id.is_none() && u.message == "Crew dispatched")
    );
    assert!(
        trail
            .iter()
            .any(|u| u.author_id == Some(admin.id) && u.message == "Status changed to in_progress")
    );

    let stats = AnalyticsUseCase {
        complaints: complaints.clone(),
        users: users.clone(),
    }
    .execute(UserRole::Admin)
    .await
    .unwrap();
    assert_eq!(stats.total_complaints, 3);
    assert_eq!(stats.total_workers, 1);
    let pending = stats
        .status_breakdown
        .iter()
        .find(|(status, _)| *status == ComplaintStatus::Pending)
        .map(|(_, n)| *n);
    assert_eq!(pending, Some(2));

    // The widest title the column holds is stored; one more character is refused.
    creator
        .execute(
            citizen.id,
            UserRole::User,
            input(&"x".repeat(MAX_TITLE_LEN), "tree"),
        )
        .await
        .unwrap();
    assert!(matches!(
        creator
            .execute(
                citizen.id,
                UserRole::User,
                input(&"x".repeat(MAX_TITLE_LEN + 1), "tree"),
            )
            .await,
        Err(ComplaintsServiceError::Validation(_))
    ));
}
