use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHasher};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use civic_domain::geo::Coordinates;
use civic_domain::user::UserRole;

use crate::config::AdminSeed;
use crate::domain::repository::{ComplaintRepository, UserRepository};
use crate::domain::types::{
    MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_PHONE_LEN, User, WorkerLoad, check_len, is_plausible_email,
    normalize_email,
};
use crate::error::ComplaintsServiceError;

const MIN_PASSWORD_LEN: usize = 6;

fn hash_password(password: &str) -> Result<String, ComplaintsServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("hash password: {e}"))?;
    Ok(hash.to_string())
}

fn validate_credentials(name: &str, email: &str, password: &str) -> Result<(), ComplaintsServiceError> {
    if name.trim().is_empty() {
        return Err(ComplaintsServiceError::validation("name is required"));
    }
    check_len("name", name.trim(), MAX_NAME_LEN)?;
    if !is_plausible_email(email) {
        return Err(ComplaintsServiceError::validation("email is invalid"));
    }
    check_len("email", email, MAX_EMAIL_LEN)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ComplaintsServiceError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

// ── RegisterUser ─────────────────────────────────────────────────────────────

pub struct RegisterUserInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

pub struct RegisterUserUseCase<R: UserRepository> {
    pub users: R,
}

impl<R: UserRepository> RegisterUserUseCase<R> {
    pub async fn execute(&self, input: RegisterUserInput) -> Result<User, ComplaintsServiceError> {
        let email = normalize_email(&input.email);
        validate_credentials(&input.name, &email, &input.password)?;

        if input.role == UserRole::Admin {
            return Err(ComplaintsServiceError::validation(
                "role must be user or worker",
            ));
        }

        let location = match (input.latitude, input.longitude) {
            (Some(lat), Some(lon)) => Some(
                Coordinates::new(lat, lon)
                    .map_err(|e| ComplaintsServiceError::validation(e.to_string()))?,
            ),
            (None, None) => None,
            _ => {
                return Err(ComplaintsServiceError::validation(
                    "latitude and longitude must be given together",
                ));
            }
        };
        if input.role == UserRole::Worker && location.is_none() {
            return Err(ComplaintsServiceError::validation(
                "workers must provide home coordinates",
            ));
        }

        let phone = input
            .phone
            .map(|p| p.trim().to_owned())
            .filter(|p| !p.is_empty());
        if let Some(phone) = &phone {
            check_len("phone", phone, MAX_PHONE_LEN)?;
        }

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(ComplaintsServiceError::EmailAlreadyRegistered);
        }

        let user = User {
            id: Uuid::now_v7(),
            name: input.name.trim().to_owned(),
            email,
            phone,
            password_hash: hash_password(&input.password)?,
            role: input.role,
            location,
            created_at: Utc::now(),
        };
        self.users.create(&user).await?;
        info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user)
    }
}

// ── SeedAdmin ────────────────────────────────────────────────────────────────

pub struct SeedAdminUseCase<R: UserRepository> {
    pub users: R,
}

impl<R: UserRepository> SeedAdminUseCase<R> {
    /// Returns `true` if an admin was created, `false` if the email was already taken.
    pub async fn execute(&self, seed: &AdminSeed) -> Result<bool, ComplaintsServiceError> {
        let email = normalize_email(&seed.email);
        validate_credentials(&seed.name, &email, &seed.password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Ok(false);
        }
        let admin = User {
            id: Uuid::now_v7(),
            name: seed.name.trim().to_owned(),
            email,
            phone: None,
            password_hash: hash_password(&seed.password)?,
            role: UserRole::Admin,
            location: None,
            created_at: Utc::now(),
        };
        self.users.create(&admin).await?;
        info!(user_id = %admin.id, "admin account seeded");
        Ok(true)
    }
}

// ── GetWorker ────────────────────────────────────────────────────────────────

/// A worker with the load derived from its complaints.
#[derive(Debug, Clone)]
pub struct WorkerWithLoad {
    pub worker: User,
    pub load: WorkerLoad,
}

pub struct GetWorkerUseCase<R: UserRepository, C: ComplaintRepository> {
    pub users: R,
    pub complaints: C,
}

impl<R: UserRepository, C: ComplaintRepository> GetWorkerUseCase<R, C> {
    pub async fn execute(
        &self,
        caller_role: UserRole,
        worker_id: Uuid,
    ) -> Result<WorkerWithLoad, ComplaintsServiceError> {
        if caller_role != UserRole::Admin {
            return Err(ComplaintsServiceError::Forbidden);
        }
        let worker = self
            .users
            .find_by_id(worker_id)
            .await?
            .filter(|u| u.role == UserRole::Worker)
            .ok_or(ComplaintsServiceError::WorkerNotFound)?;
        let load = self
            .complaints
            .worker_loads(&[worker.id])
            .await?
            .remove(&worker.id)
            .unwrap_or_default();
        Ok(WorkerWithLoad { worker, load })
    }
}
