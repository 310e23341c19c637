use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Complaints::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Complaints::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Complaints::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Complaints::Description).text().not_null())
                    .col(
                        ColumnDef::new(Complaints::Category)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Complaints::Priority)
                            .string_len(20)
                            .not_null()
                            .default("low"),
                    )
                    .col(
                        ColumnDef::new(Complaints::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Complaints::Location)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Complaints::ImageUrl).string_len(255).null())
                    .col(
                        ColumnDef::new(Complaints::ImageSeverityScore)
                            .double()
                            .null(),
                    )
                    .col(ColumnDef::new(Complaints::SubmitterId).uuid().not_null())
                    .col(ColumnDef::new(Complaints::AssignedWorkerId).uuid().null())
                    .col(
                        ColumnDef::new(Complaints::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Complaints::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Complaints::Table, Complaints::SubmitterId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Complaints::Table, Complaints::AssignedWorkerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Complaints::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Complaints {
    Table,
    Id,
    Title,
    Description,
    Category,
    Priority,
    Status,
    Location,
    ImageUrl,
    ImageSeverityScore,
    SubmitterId,
    AssignedWorkerId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
