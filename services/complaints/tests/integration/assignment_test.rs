use civic_complaints::domain::types::SYSTEM_AUTHOR;
use civic_complaints::error::ComplaintsServiceError;
use civic_complaints::usecase::assignment::DEFAULT_ASSIGN_MESSAGE;
use civic_domain::complaint::ComplaintStatus;
use civic_domain::user::UserRole;

use crate::helpers::{FailingNotifier, HangingNotifier, MockNotifier, World};

// ── AssignWorkerUseCase ──────────────────────────────────────────────────────

#[tokio::test]
async fn should_assign_once_and_record_system_update() {
    let world = World::new();
    let complaint = world.file("Water logging", "water").await;
    let notifier = MockNotifier::default();
    let sent = notifier.sent_handle();
    let assigner = world.assigner(notifier);

    let outcome = assigner
        .execute(UserRole::Admin, complaint.id, world.near_worker.id, None)
        .await
        .unwrap();
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.complaint.status, ComplaintStatus::Assigned);
    assert_eq!(outcome.complaint.assigned_worker_id, Some(world.near_worker.id));

    let updates = world.store.updates_for(complaint.id);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].author_name, SYSTEM_AUTHOR);
    assert_eq!(updates[0].author_id, None);
    assert_eq!(updates[0].message, DEFAULT_ASSIGN_MESSAGE);

    let mails = sent.lock().unwrap().clone();
    assert_eq!(mails.len(), 1);
    assert_eq!(mails[0].to, world.near_worker.email);
    assert!(mails[0].subject.contains("Water logging"));

    // Same call again: refused, nothing appended, nothing sent.
    let again = assigner
        .execute(UserRole::Admin, complaint.id, world.near_worker.id, None)
        .await;
    assert!(matches!(
        again,
        Err(ComplaintsServiceError::InvalidTransition {
            from: ComplaintStatus::Assigned,
            to: ComplaintStatus::Assigned,
        })
    ));
    assert_eq!(world.store.updates_for(complaint.id).len(), 1);
    assert_eq!(sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_let_only_one_of_two_racing_assignments_win() {
    let world = World::new();
    let complaint = world.file("Sinkhole", "infrastructure").await;
    let first = world.assigner(MockNotifier::default());
    let second = world.assigner(MockNotifier::default());

    let (a, b) = tokio::join!(
        first.execute(UserRole::Admin, complaint.id, world.near_worker.id, None),
        second.execute(UserRole::Admin, complaint.id, world.far_worker.id, None),
    );
    assert_eq!(u8::from(a.is_ok()) + u8::from(b.is_ok()), 1);
    assert_eq!(world.store.updates_for(complaint.id).len(), 1);
}

#[tokio::test]
async fn should_use_caller_message_for_assignment_update() {
    let world = World::new();
    let complaint = world.file("Leaning pole", "electrical").await;
    world
        .assigner(MockNotifier::default())
        .execute(
            UserRole::Admin,
            complaint.id,
            world.far_worker.id,
            Some("Urgent, school nearby".to_owned()),
        )
        .await
        .unwrap();
    let updates = world.store.updates_for(complaint.id);
    assert_eq!(updates[0].message, "Urgent, school nearby");
}

#[tokio::test]
async fn should_forbid_non_admin_assignment() {
    let world = World::new();
    let complaint = world.file("Broken bench", "infrastructure").await;
    for role in [UserRole::User, UserRole::Worker] {
        let result = world
            .assigner(MockNotifier::default())
            .execute(role, complaint.id, world.near_worker.id, None)
            .await;
        assert!(matches!(result, Err(ComplaintsServiceError::Forbidden)));
    }
    assert_eq!(world.store.complaint(complaint.id).status, ComplaintStatus::Pending);
}

#[tokio::test]
async fn should_reject_assignment_to_non_worker() {
    let world = World::new();
    let complaint = world.file("Open manhole", "infrastructure").await;
    let result = world
        .assigner(MockNotifier::default())
        .execute(UserRole::Admin, complaint.id, world.citizen.id, None)
        .await;
    assert!(matches!(result, Err(ComplaintsServiceError::WorkerNotFound)));
}

// ── Notification failures ────────────────────────────────────────────────────

#[tokio::test]
async fn should_keep_assignment_when_notification_fails() {
    let world = World::new();
    let complaint = world.file("Tree on road", "tree").await;
    let outcome = world
        .assigner(FailingNotifier)
        .execute(UserRole::Admin, complaint.id, world.near_worker.id, None)
        .await
        .unwrap();

    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("notification"));
    let stored = world.store.complaint(complaint.id);
    assert_eq!(stored.status, ComplaintStatus::Assigned);
    assert_eq!(stored.assigned_worker_id, Some(world.near_worker.id));
    assert_eq!(world.store.updates_for(complaint.id).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn should_warn_when_notification_times_out() {
    let world = World::new();
    let complaint = world.file("Car crash at junction", "accident").await;
    let outcome = world
        .assigner(HangingNotifier)
        .execute(UserRole::Admin, complaint.id, world.far_worker.id, None)
        .await
        .unwrap();

    assert_eq!(outcome.warnings, vec!["notification to worker timed out".to_owned()]);
    assert_eq!(
        world.store.complaint(complaint.id).status,
        ComplaintStatus::Assigned
    );
}
