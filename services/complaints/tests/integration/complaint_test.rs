use bytes::Bytes;
use uuid::Uuid;

use civic_complaints::domain::types::{ImageUpload, MAX_LOCATION_LEN, MAX_TITLE_LEN};
use civic_complaints::error::ComplaintsServiceError;
use civic_complaints::infra::storage::LocalImageStore;
use civic_complaints::usecase::complaint::{
    CreateComplaintInput, CreateComplaintUseCase, GetComplaintUseCase,
};
use civic_complaints::usecase::update_log::ListUpdatesUseCase;
use civic_domain::complaint::{Category, ComplaintStatus, Priority};
use civic_domain::user::UserRole;

use crate::helpers::{DOWNTOWN, MemoryStore, MockImageStore, MockNotifier, World, user};

fn input(category: &str, location: &str) -> CreateComplaintInput {
    CreateComplaintInput {
        title: "Overflowing drain".to_owned(),
        description: "Sewage on the footpath".to_owned(),
        category: category.to_owned(),
        location: location.to_owned(),
        image_severity_score: Some(0.8),
        image: Some(ImageUpload {
            file_name: "drain.jpg".to_owned(),
            content_type: Some("image/jpeg".to_owned()),
            bytes: Bytes::from_static(b"\xff\xd8\xff"),
        }),
    }
}

fn creator(world: &World) -> CreateComplaintUseCase<MemoryStore, MemoryStore, MockImageStore> {
    CreateComplaintUseCase {
        users: world.store.clone(),
        complaints: world.store.clone(),
        images: MockImageStore,
    }
}

// ── CreateComplaintUseCase ───────────────────────────────────────────────────

#[tokio::test]
async fn should_round_trip_submitted_fields() {
    let world = World::new();
    let created = creator(&world)
        .execute(world.citizen.id, UserRole::User, input("Water", DOWNTOWN))
        .await
        .unwrap();
    assert_eq!(created.status, ComplaintStatus::Pending);
    assert_eq!(created.priority, Priority::Low);
    assert_eq!(created.image_url.as_deref(), Some("/uploads/test_drain.jpg"));

    let detail = GetComplaintUseCase {
        complaints: world.store.clone(),
        updates: world.store.clone(),
        users: world.store.clone(),
    }
    .execute(world.citizen.id, UserRole::User, created.id)
    .await
    .unwrap();

    assert_eq!(detail.complaint.title, "Overflowing drain");
    assert_eq!(detail.complaint.description, "Sewage on the footpath");
    assert_eq!(detail.complaint.category, Category::Water);
    assert_eq!(detail.complaint.location, DOWNTOWN);
    assert_eq!(detail.complaint.image_severity_score, Some(0.8));
    assert_eq!(detail.submitter.map(|u| u.id), Some(world.citizen.id));
    assert!(detail.worker.is_none());
    assert!(detail.updates.is_empty());
}

#[tokio::test]
async fn should_reject_invalid_submissions() {
    let world = World::new();
    let usecase = creator(&world);

    let cases = [
        input("graffiti", DOWNTOWN),
        input("water", "somewhere downtown"),
        input("water", "95.0, 10.0"),
        CreateComplaintInput {
            title: "  ".to_owned(),
            ..input("water", DOWNTOWN)
        },
        CreateComplaintInput {
            image_severity_score: Some(1.5),
            ..input("water", DOWNTOWN)
        },
    ];
    for case in cases {
        let result = usecase.execute(world.citizen.id, UserRole::User, case).await;
        assert!(
            matches!(result, Err(ComplaintsServiceError::Validation(_))),
            "expected Validation, got {result:?}"
        );
    }
}

#[tokio::test]
async fn should_reject_overlong_fields_before_writing_anything() {
    let world = World::new();
    let dir = std::env::temp_dir().join(format!("civic-overlong-{}", Uuid::now_v7()));
    let usecase = CreateComplaintUseCase {
        users: world.store.clone(),
        complaints: world.store.clone(),
        images: LocalImageStore { dir: dir.clone() },
    };

    let cases = [
        CreateComplaintInput {
            title: "x".repeat(MAX_TITLE_LEN + 1),
            ..input("water", DOWNTOWN)
        },
        CreateComplaintInput {
            location: format!("{DOWNTOWN}{}", " ".repeat(MAX_LOCATION_LEN)),
            ..input("water", DOWNTOWN)
        },
    ];
    for case in cases {
        let result = usecase.execute(world.citizen.id, UserRole::User, case).await;
        assert!(
            matches!(result, Err(ComplaintsServiceError::Validation(_))),
            "expected Validation, got {result:?}"
        );
    }
    assert_eq!(world.store.complaint_count(), 0);
    assert!(!dir.exists(), "no image may be written for a rejected complaint");
}

#[tokio::test]
async fn should_store_text_exactly_as_submitted() {
    let world = World::new();
    let submitted = CreateComplaintInput {
        title: "  Pothole  ".to_owned(),
        description: "Deep one,\nnear the bus stop ".to_owned(),
        location: " 12.9716,77.5946".to_owned(),
        ..input("water", DOWNTOWN)
    };
    let created = creator(&world)
        .execute(world.citizen.id, UserRole::User, submitted)
        .await
        .unwrap();

    let stored = world.store.complaint(created.id);
    assert_eq!(stored.title, "  Pothole  ");
    assert_eq!(stored.description, "Deep one,\nnear the bus stop ");
    assert_eq!(stored.location, " 12.9716,77.5946");
    assert_eq!(stored.category, Category::Water);
}

#[tokio::test]
async fn should_only_let_citizens_file_complaints() {
    let world = World::new();
    let result = creator(&world)
        .execute(world.admin.id, UserRole::Admin, input("water", DOWNTOWN))
        .await;
    assert!(matches!(result, Err(ComplaintsServiceError::Forbidden)));
}

#[tokio::test]
async fn should_reject_unknown_submitter() {
    let world = World::new();
    let result = creator(&world)
        .execute(uuid::Uuid::now_v7(), UserRole::User, input("water", DOWNTOWN))
        .await;
    assert!(matches!(result, Err(ComplaintsServiceError::Validation(_))));
}

// ── GetComplaintUseCase ──────────────────────────────────────────────────────

#[tokio::test]
async fn should_hide_complaint_from_other_citizens() {
    let world = World::new();
    let complaint = world.file("Noise at night", "infrastructure").await;
    let neighbour = user("Ned Neighbour", UserRole::User, None);
    world.store.insert_user(neighbour.clone());

    let usecase = GetComplaintUseCase {
        complaints: world.store.clone(),
        updates: world.store.clone(),
        users: world.store.clone(),
    };
    let result = usecase
        .execute(neighbour.id, UserRole::User, complaint.id)
        .await;
    assert!(matches!(result, Err(ComplaintsServiceError::Forbidden)));

    let as_worker = usecase
        .execute(world.near_worker.id, UserRole::Worker, complaint.id)
        .await;
    assert!(as_worker.is_ok());
}

#[tokio::test]
async fn should_include_worker_and_trail_in_detail() {
    let world = World::new();
    let complaint = world.file("Fallen tree", "tree").await;
    world
        .assigner(MockNotifier::default())
        .execute(UserRole::Admin, complaint.id, world.far_worker.id, None)
        .await
        .unwrap();

    let detail = GetComplaintUseCase {
        complaints: world.store.clone(),
        updates: world.store.clone(),
        users: world.store.clone(),
    }
    .execute(world.admin.id, UserRole::Admin, complaint.id)
    .await
    .unwrap();
    assert_eq!(detail.worker.map(|w| w.name), Some(world.far_worker.name.clone()));
    assert_eq!(detail.updates.len(), 1);

    let trail = ListUpdatesUseCase {
        complaints: world.store.clone(),
        updates: world.store.clone(),
    }
    .execute(world.citizen.id, UserRole::User, complaint.id)
    .await
    .unwrap();
    assert_eq!(trail.len(), 1);
}
