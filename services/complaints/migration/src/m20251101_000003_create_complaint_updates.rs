use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ComplaintUpdates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ComplaintUpdates::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ComplaintUpdates::ComplaintId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ComplaintUpdates::AuthorId).uuid().null())
                    .col(
                        ColumnDef::new(ComplaintUpdates::AuthorName)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ComplaintUpdates::Message).text().not_null())
                    .col(
                        ColumnDef::new(ComplaintUpdates::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ComplaintUpdates::Table, ComplaintUpdates::ComplaintId)
                            .to(Complaints::Table, Complaints::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ComplaintUpdates::Table, ComplaintUpdates::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ComplaintUpdates::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ComplaintUpdates {
    Table,
    Id,
    ComplaintId,
    AuthorId,
    AuthorName,
    Message,
    CreatedAt,
}

#[derive(Iden)]
enum Complaints {
    Table,
    Id,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
