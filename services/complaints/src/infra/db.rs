use std::collections::HashMap;

use anyhow::Context as _;
use sea_orm::sea_query::{CaseStatement, Expr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    FromQueryResult, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
    TransactionTrait,
};
use uuid::Uuid;

use civic_complaints_schema::{complaint_updates, complaints, users};
use civic_domain::complaint::{Category, ComplaintStatus, Priority};
use civic_domain::geo::Coordinates;
use civic_domain::pagination::PageRequest;
use civic_domain::user::UserRole;

use crate::domain::repository::{ComplaintRepository, UpdateRepository, UserRepository};
use crate::domain::types::{
    Complaint, ComplaintChange, ComplaintOrder, ComplaintScope, Update, User, WorkerLoad,
};
use crate::error::ComplaintsServiceError;

#[derive(Debug, FromQueryResult)]
struct GroupCount {
    key: String,
    count: i64,
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ComplaintsServiceError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        model.map(user_from_model).transpose()
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, ComplaintsServiceError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        users::Entity::find()
            .filter(users::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .context("find users by ids")?
            .into_iter()
            .map(user_from_model)
            .collect()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ComplaintsServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        model.map(user_from_model).transpose()
    }

    async fn create(&self, user: &User) -> Result<(), ComplaintsServiceError> {
        let result = users::ActiveModel {
            id: Set(user.id),
            name: Set(user.name.clone()),
            email: Set(user.email.clone()),
            phone: Set(user.phone.clone()),
            password_hash: Set(user.password_hash.clone()),
            role: Set(user.role.as_str().to_owned()),
            latitude: Set(user.location.map(|c| c.latitude)),
            longitude: Set(user.location.map(|c| c.longitude)),
            created_at: Set(user.created_at),
        }
        .insert(&self.db)
        .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => {
                Err(ComplaintsServiceError::EmailAlreadyRegistered)
            }
            Err(e) => Err(anyhow::Error::new(e).context("create user").into()),
        }
    }

    async fn list_workers(
        &self,
        page: PageRequest,
    ) -> Result<(Vec<User>, u64), ComplaintsServiceError> {
        let query =
            users::Entity::find().filter(users::Column::Role.eq(UserRole::Worker.as_str()));
        let total = query.clone().count(&self.db).await.context("count workers")?;
        let models = query
            .order_by_asc(users::Column::Name)
            .order_by_asc(users::Column::Id)
            .offset(page.offset())
            .limit(page.clamped().limit as u64)
            .all(&self.db)
            .await
            .context("list workers")?;
        let workers = models
            .into_iter()
            .map(user_from_model)
            .collect::<Result<_, _>>()?;
        Ok((workers, total))
    }

    async fn all_workers(&self) -> Result<Vec<User>, ComplaintsServiceError> {
        users::Entity::find()
            .filter(users::Column::Role.eq(UserRole::Worker.as_str()))
            .order_by_asc(users::Column::Name)
            .order_by_asc(users::Column::Id)
            .all(&self.db)
            .await
            .context("list all workers")?
            .into_iter()
            .map(user_from_model)
            .collect()
    }

    async fn list_members(
        &self,
        page: PageRequest,
    ) -> Result<(Vec<User>, u64), ComplaintsServiceError> {
        let query = users::Entity::find().filter(
            users::Column::Role.is_in([UserRole::User.as_str(), UserRole::Worker.as_str()]),
        );
        let total = query.clone().count(&self.db).await.context("count members")?;
        let models = query
            .order_by_desc(users::Column::CreatedAt)
            .order_by_desc(users::Column::Id)
            .offset(page.offset())
            .limit(page.clamped().limit as u64)
            .all(&self.db)
            .await
            .context("list members")?;
        let members = models
            .into_iter()
            .map(user_from_model)
            .collect::<Result<_, _>>()?;
        Ok((members, total))
    }

    async fn count_by_role(&self, role: UserRole) -> Result<u64, ComplaintsServiceError> {
        let n = users::Entity::find()
            .filter(users::Column::Role.eq(role.as_str()))
            .count(&self.db)
            .await
            .context("count users by role")?;
        Ok(n)
    }
}

fn user_from_model(model: users::Model) -> Result<User, ComplaintsServiceError> {
    let role: UserRole = model
        .role
        .parse()
        .with_context(|| format!("user {} has unknown role", model.id))?;
    let location = match (model.latitude, model.longitude) {
        (Some(lat), Some(lon)) => Coordinates::new(lat, lon).ok(),
        _ => None,
    };
    Ok(User {
        id: model.id,
        name: model.name,
        email: model.email,
        phone: model.phone,
        password_hash: model.password_hash,
        role,
        location,
        created_at: model.created_at,
    })
}

// ── Complaint repository ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbComplaintRepository {
    pub db: DatabaseConnection,
}

/// `CASE status WHEN 'pending' THEN 0 ... END`, following [`ComplaintStatus::triage_rank`].
fn status_rank() -> SimpleExpr {
    ComplaintStatus::ALL
        .into_iter()
        .fold(CaseStatement::new(), |case, status| {
            case.case(
                complaints::Column::Status.eq(status.as_str()),
                status.triage_rank() as i32,
            )
        })
        .finally(ComplaintStatus::ALL.len() as i32)
        .into()
}

/// `CASE priority WHEN 'critical' THEN 0 ... END`, following [`Priority::triage_rank`].
fn priority_rank() -> SimpleExpr {
    Priority::ALL
        .into_iter()
        .fold(CaseStatement::new(), |case, priority| {
            case.case(
                complaints::Column::Priority.eq(priority.as_str()),
                priority.triage_rank() as i32,
            )
        })
        .finally(Priority::ALL.len() as i32)
        .into()
}

fn scoped(scope: ComplaintScope) -> sea_orm::Select<complaints::Entity> {
    match scope {
        ComplaintScope::All => complaints::Entity::find(),
        ComplaintScope::SubmittedBy(id) => {
            complaints::Entity::find().filter(complaints::Column::SubmitterId.eq(id))
        }
    }
}

impl ComplaintRepository for DbComplaintRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Complaint>, ComplaintsServiceError> {
        let model = complaints::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find complaint by id")?;
        model.map(complaint_from_model).transpose()
    }

    async fn create(&self, complaint: &Complaint) -> Result<(), ComplaintsServiceError> {
        complaints::ActiveModel {
            id: Set(complaint.id),
            title: Set(complaint.title.clone()),
            description: Set(complaint.description.clone()),
            category: Set(complaint.category.as_str().to_owned()),
            priority: Set(complaint.priority.as_str().to_owned()),
            status: Set(complaint.status.as_str().to_owned()),
            location: Set(complaint.location.clone()),
            image_url: Set(complaint.image_url.clone()),
            image_severity_score: Set(complaint.image_severity_score),
            submitter_id: Set(complaint.submitter_id),
            assigned_worker_id: Set(complaint.assigned_worker_id),
            created_at: Set(complaint.created_at),
            updated_at: Set(complaint.updated_at),
        }
        .insert(&self.db)
        .await
        .context("create complaint")?;
        Ok(())
    }

    async fn list(
        &self,
        scope: ComplaintScope,
        order: ComplaintOrder,
        page: PageRequest,
    ) -> Result<(Vec<Complaint>, u64), ComplaintsServiceError> {
        let query = scoped(scope);
        let total = query
            .clone()
            .count(&self.db)
            .await
            .context("count complaints")?;

        let query = match order {
            ComplaintOrder::Newest => query,
            ComplaintOrder::Triage => query
                .order_by(status_rank(), Order::Asc)
                .order_by(priority_rank(), Order::Asc),
        };
        let models = query
            .order_by_desc(complaints::Column::CreatedAt)
            .order_by_desc(complaints::Column::Id)
            .offset(page.offset())
            .limit(page.clamped().limit as u64)
            .all(&self.db)
            .await
            .context("list complaints")?;
        let complaints = models
            .into_iter()
            .map(complaint_from_model)
            .collect::<Result<_, _>>()?;
        Ok((complaints, total))
    }

    async fn list_all(
        &self,
        scope: ComplaintScope,
    ) -> Result<Vec<Complaint>, ComplaintsServiceError> {
        scoped(scope)
            .order_by_desc(complaints::Column::CreatedAt)
            .order_by_desc(complaints::Column::Id)
            .all(&self.db)
            .await
            .context("list all complaints")?
            .into_iter()
            .map(complaint_from_model)
            .collect()
    }

    async fn recent(&self, limit: u64) -> Result<Vec<Complaint>, ComplaintsServiceError> {
        complaints::Entity::find()
            .order_by_desc(complaints::Column::CreatedAt)
            .order_by_desc(complaints::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .context("list recent complaints")?
            .into_iter()
            .map(complaint_from_model)
            .collect()
    }

    async fn apply_change(
        &self,
        change: &ComplaintChange,
        update: Option<&Update>,
    ) -> Result<bool, ComplaintsServiceError> {
        let txn = self.db.begin().await.context("begin complaint change")?;

        let result = complaints::Entity::update_many()
            .col_expr(
                complaints::Column::Status,
                Expr::value(change.status.as_str()),
            )
            .col_expr(
                complaints::Column::Priority,
                Expr::value(change.priority.as_str()),
            )
            .col_expr(
                complaints::Column::AssignedWorkerId,
                Expr::value(change.assigned_worker_id),
            )
            .col_expr(complaints::Column::UpdatedAt, Expr::value(change.updated_at))
            .filter(complaints::Column::Id.eq(change.id))
            .filter(complaints::Column::Status.eq(change.expected_status.as_str()))
            .exec(&txn)
            .await
            .context("update complaint")?;

        if result.rows_affected == 0 {
            txn.rollback()
                .await
                .context("rollback stale complaint change")?;
            return Ok(false);
        }

        if let Some(update) = update {
            update_active_model(update)
                .insert(&txn)
                .await
                .context("append complaint update")?;
        }

        txn.commit().await.context("commit complaint change")?;
        Ok(true)
    }

    async fn worker_loads(
        &self,
        worker_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, WorkerLoad>, ComplaintsServiceError> {
        #[derive(Debug, FromQueryResult)]
        struct LoadRow {
            worker_id: Uuid,
            status: String,
            count: i64,
        }

        if worker_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = complaints::Entity::find()
            .select_only()
            .column_as(complaints::Column::AssignedWorkerId, "worker_id")
            .column(complaints::Column::Status)
            .column_as(Expr::col(complaints::Column::Id).count(), "count")
            .filter(complaints::Column::AssignedWorkerId.is_in(worker_ids.iter().copied()))
            .group_by(complaints::Column::AssignedWorkerId)
            .group_by(complaints::Column::Status)
            .into_model::<LoadRow>()
            .all(&self.db)
            .await
            .context("count worker loads")?;

        let mut loads: HashMap<Uuid, WorkerLoad> = HashMap::new();
        for row in rows {
            let status: ComplaintStatus = row
                .status
                .parse()
                .with_context(|| format!("unknown stored status {:?}", row.status))?;
            let n = row.count.max(0) as u64;
            let load = loads.entry(row.worker_id).or_default();
            load.assigned_total += n;
            if status.is_active() {
                load.active += n;
            }
        }
        Ok(loads)
    }

    async fn count_by_status(
        &self,
    ) -> Result<Vec<(ComplaintStatus, u64)>, ComplaintsServiceError> {
        self.group_count(complaints::Column::Status)
            .await?
            .into_iter()
            .map(|(key, n)| -> Result<_, ComplaintsServiceError> {
                let status = key
                    .parse::<ComplaintStatus>()
                    .with_context(|| format!("unknown stored status {key:?}"))?;
                Ok((status, n))
            })
            .collect()
    }

    async fn count_by_category(&self) -> Result<Vec<(Category, u64)>, ComplaintsServiceError> {
        self.group_count(complaints::Column::Category)
            .await?
            .into_iter()
            .map(|(key, n)| -> Result<_, ComplaintsServiceError> {
                let category = key
                    .parse::<Category>()
                    .with_context(|| format!("unknown stored category {key:?}"))?;
                Ok((category, n))
            })
            .collect()
    }

    async fn count_by_priority(&self) -> Result<Vec<(Priority, u64)>, ComplaintsServiceError> {
        self.group_count(complaints::Column::Priority)
            .await?
            .into_iter()
            .map(|(key, n)| -> Result<_, ComplaintsServiceError> {
                let priority = key
                    .parse::<Priority>()
                    .with_context(|| format!("unknown stored priority {key:?}"))?;
                Ok((priority, n))
            })
            .collect()
    }
}

impl DbComplaintRepository {
    async fn group_count(
        &self,
        column: complaints::Column,
    ) -> Result<Vec<(String, u64)>, ComplaintsServiceError> {
        let rows = complaints::Entity::find()
            .select_only()
            .column_as(column, "key")
            .column_as(Expr::col(complaints::Column::Id).count(), "count")
            .group_by(column)
            .into_model::<GroupCount>()
            .all(&self.db)
            .await
            .context("group complaints")?;
        Ok(rows
            .into_iter()
            .map(|row| (row.key, row.count.max(0) as u64))
            .collect())
    }
}

fn complaint_from_model(model: complaints::Model) -> Result<Complaint, ComplaintsServiceError> {
    let id = model.id;
    Ok(Complaint {
        id,
        title: model.title,
        description: model.description,
        category: model
            .category
            .parse()
            .with_context(|| format!("complaint {id} has unknown category"))?,
        priority: model
            .priority
            .parse()
            .with_context(|| format!("complaint {id} has unknown priority"))?,
        status: model
            .status
            .parse()
            .with_context(|| format!("complaint {id} has unknown status"))?,
        location: model.location,
        image_url: model.image_url,
        image_severity_score: model.image_severity_score,
        submitter_id: model.submitter_id,
        assigned_worker_id: model.assigned_worker_id,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

// ── Update repository ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUpdateRepository {
    pub db: DatabaseConnection,
}

fn update_active_model(update: &Update) -> complaint_updates::ActiveModel {
    complaint_updates::ActiveModel {
        id: Set(update.id),
        complaint_id: Set(update.complaint_id),
        author_id: Set(update.author_id),
        author_name: Set(update.author_name.clone()),
        message: Set(update.message.clone()),
        created_at: Set(update.created_at),
    }
}

impl UpdateRepository for DbUpdateRepository {
    async fn append(&self, update: &Update) -> Result<(), ComplaintsServiceError> {
        update_active_model(update)
            .insert(&self.db)
            .await
            .context("append complaint update")?;
        Ok(())
    }

    async fn list(&self, complaint_id: Uuid) -> Result<Vec<Update>, ComplaintsServiceError> {
        let models = complaint_updates::Entity::find()
            .filter(complaint_updates::Column::ComplaintId.eq(complaint_id))
            .order_by_asc(complaint_updates::Column::CreatedAt)
            .order_by_asc(complaint_updates::Column::Id)
            .all(&self.db)
            .await
            .context("list complaint updates")?;
        Ok(models
            .into_iter()
            .map(|m| Update {
                id: m.id,
                complaint_id: m.complaint_id,
                author_id: m.author_id,
                author_name: m.author_name,
                message: m.message,
                created_at: m.created_at,
            })
            .collect())
    }
}
