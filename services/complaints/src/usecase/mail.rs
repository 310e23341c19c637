use std::time::Duration;

use tracing::{info, warn};

use crate::domain::repository::Notifier;
use crate::domain::types::{Mail, is_plausible_email, normalize_email};
use crate::error::ComplaintsServiceError;

pub struct SendMailUseCase<N: Notifier> {
    pub notifier: N,
    pub timeout: Duration,
}

impl<N: Notifier> SendMailUseCase<N> {
    pub async fn execute(&self, mail: Mail) -> Result<(), ComplaintsServiceError> {
        let mail = Mail {
            to: normalize_email(&mail.to),
            ..mail
        };
        if !is_plausible_email(&mail.to) {
            return Err(ComplaintsServiceError::validation("email is invalid"));
        }
        if mail.subject.trim().is_empty() {
            return Err(ComplaintsServiceError::validation("subject is required"));
        }

        match tokio::time::timeout(self.timeout, self.notifier.send(&mail)).await {
            Ok(Ok(())) => {
                info!(to = %mail.to, "mail sent");
                Ok(())
            }
            Ok(Err(e)) => {
                warn!(to = %mail.to, error = %e, "mail delivery failed");
                Err(match e {
                    ComplaintsServiceError::DependencyFailure(_) => e,
                    other => ComplaintsServiceError::DependencyFailure(other.to_string()),
                })
            }
            Err(_) => {
                warn!(to = %mail.to, "mail delivery timed out");
                Err(ComplaintsServiceError::DependencyFailure(
                    "mail delivery timed out".to_owned(),
                ))
            }
        }
    }
}
