use sea_orm::entity::prelude::*;

/// Citizen-filed complaint and its current lifecycle state.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "complaints")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub category: String,
    pub priority: String,
    pub status: String,
    pub location: String,
    pub image_url: Option<String>,
    pub image_severity_score: Option<f64>,
    pub submitter_id: Uuid,
    pub assigned_worker_id: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::SubmitterId",
        to = "super::users::Column::Id"
    )]
    Submitter,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AssignedWorkerId",
        to = "super::users::Column::Id"
    )]
    AssignedWorker,
    #[sea_orm(has_many = "super::complaint_updates::Entity")]
    Updates,
}

impl Related<super::complaint_updates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Updates.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
