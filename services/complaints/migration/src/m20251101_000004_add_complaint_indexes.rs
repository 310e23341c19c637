use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .table(Complaints::Table)
                    .col(Complaints::SubmitterId)
                    .col(Complaints::CreatedAt)
                    .name("idx_complaints_submitter_id_created_at")
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .table(Complaints::Table)
                    .col(Complaints::AssignedWorkerId)
                    .col(Complaints::Status)
                    .name("idx_complaints_assigned_worker_id_status")
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .table(ComplaintUpdates::Table)
                    .col(ComplaintUpdates::ComplaintId)
                    .col(ComplaintUpdates::CreatedAt)
                    .name("idx_complaint_updates_complaint_id_created_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_complaint_updates_complaint_id_created_at")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_complaints_assigned_worker_id_status")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_complaints_submitter_id_created_at")
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum Complaints {
    Table,
    SubmitterId,
    AssignedWorkerId,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum ComplaintUpdates {
    Table,
    ComplaintId,
    CreatedAt,
}
