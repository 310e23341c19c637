use std::path::PathBuf;
use std::time::Duration;

/// SMTP relay settings. Present only when `SMTP_HOST` is set.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    /// Env var: `SMTP_PORT` (default 587).
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender mailbox. Env var: `MAIL_FROM` (default `"Civic Portal <no-reply@localhost>"`).
    pub from: String,
}

/// Remote image classifier used by `/api/autofill`.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub url: String,
    pub api_key: Option<String>,
}

/// Administrator account created at startup when no user owns `email` yet.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Complaints service configuration loaded from environment variables.
#[derive(Debug)]
pub struct ComplaintsConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port for the HTTP server (default 5000). Env var: `COMPLAINTS_PORT`.
    pub complaints_port: u16,
    /// Directory uploaded images are written to and served from. Env var: `UPLOAD_DIR`.
    pub upload_dir: PathBuf,
    /// Request body limit for multipart uploads (default 16 MiB). Env var: `MAX_UPLOAD_BYTES`.
    pub max_upload_bytes: usize,
    /// Allowed browser origin. Unset means any origin. Env var: `CORS_ORIGIN`.
    pub cors_origin: Option<String>,
    pub smtp: Option<SmtpConfig>,
    pub classifier: Option<ClassifierConfig>,
    /// Upper bound on notifier and classifier calls (default 10s). Env var: `DEPENDENCY_TIMEOUT_SECS`.
    pub dependency_timeout: Duration,
    pub admin_seed: Option<AdminSeed>,
}

const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

impl ComplaintsConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        // A missing .env file is normal outside local development.
        let _ = dotenvy::dotenv();

        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL is not set"))?;

        let smtp = optional("SMTP_HOST").map(|host| SmtpConfig {
            host,
            port: parsed("SMTP_PORT").unwrap_or(587),
            username: optional("SMTP_USERNAME"),
            password: optional("SMTP_PASSWORD"),
            from: optional("MAIL_FROM")
                .unwrap_or_else(|| "Civic Portal <no-reply@localhost>".to_owned()),
        });

        let classifier = optional("CLASSIFIER_URL").map(|url| ClassifierConfig {
            url,
            api_key: optional("CLASSIFIER_API_KEY"),
        });

        let admin_seed = match (optional("ADMIN_EMAIL"), optional("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                name: optional("ADMIN_NAME").unwrap_or_else(|| "Administrator".to_owned()),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            complaints_port: parsed("COMPLAINTS_PORT").unwrap_or(5000),
            upload_dir: optional("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            max_upload_bytes: parsed("MAX_UPLOAD_BYTES").unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            cors_origin: optional("CORS_ORIGIN"),
            smtp,
            classifier,
            dependency_timeout: Duration::from_secs(parsed("DEPENDENCY_TIMEOUT_SECS").unwrap_or(10)),
            admin_seed,
        })
    }
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    optional(key).and_then(|v| v.parse().ok())
}
