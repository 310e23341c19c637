use std::time::Duration;

use tracing::warn;

use crate::domain::repository::Classifier;
use crate::domain::types::{ImageUpload, Suggestion};
use crate::error::ComplaintsServiceError;

pub struct AutofillUseCase<K: Classifier> {
    pub classifier: K,
    pub timeout: Duration,
}

impl<K: Classifier> AutofillUseCase<K> {
    /// Draft complaint fields from a photo. Nothing is persisted.
    pub async fn execute(&self, image: ImageUpload) -> Result<Suggestion, ComplaintsServiceError> {
        if image.bytes.is_empty() {
            return Err(ComplaintsServiceError::validation("image is required"));
        }
        match tokio::time::timeout(self.timeout, self.classifier.classify(&image)).await {
            Ok(Ok(suggestion)) => Ok(suggestion),
            Ok(Err(e)) => {
                warn!(error = %e, file_name = %image.file_name, "classifier failed");
                Err(match e {
                    ComplaintsServiceError::DependencyFailure(_) => e,
                    other => ComplaintsServiceError::DependencyFailure(other.to_string()),
                })
            }
            Err(_) => {
                warn!(file_name = %image.file_name, "classifier timed out");
                Err(ComplaintsServiceError::DependencyFailure(
                    "classifier timed out".to_owned(),
                ))
            }
        }
    }
}
