use std::path::PathBuf;

use anyhow::Context as _;
use chrono::Utc;

use crate::domain::repository::ImageStore;
use crate::domain::types::ImageUpload;
use crate::error::ComplaintsServiceError;

/// URL prefix the router serves `upload_dir` under.
pub const UPLOADS_ROUTE: &str = "/uploads";

const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// Longest stored file name; `/uploads/<micros>_<name>` must stay within `image_url`'s column.
const MAX_FILE_NAME_LEN: usize = 128;

/// Writes images to a local directory served as static files.
#[derive(Clone)]
pub struct LocalImageStore {
    pub dir: PathBuf,
}

impl ImageStore for LocalImageStore {
    async fn store(&self, image: &ImageUpload) -> Result<String, ComplaintsServiceError> {
        if image.bytes.is_empty() {
            return Err(ComplaintsServiceError::validation("image is empty"));
        }
        let sanitized = sanitize_file_name(&image.file_name);
        let extension = sanitized
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ComplaintsServiceError::validation(format!(
                "image must be one of: {}",
                ALLOWED_EXTENSIONS.join(", ")
            )));
        }

        let name = format!("{}_{sanitized}", Utc::now().timestamp_micros());
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("create upload dir {}", self.dir.display()))?;
        let path = self.dir.join(&name);
        tokio::fs::write(&path, &image.bytes)
            .await
            .with_context(|| format!("write upload {}", path.display()))?;
        Ok(format!("{UPLOADS_ROUTE}/{name}"))
    }
}

/// Keep ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `_`.
/// Leading dots are dropped so the result can never be hidden or a parent reference.
/// Long names are cut to `MAX_FILE_NAME_LEN`, keeping the extension.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        return "image".to_owned();
    }
    if trimmed.len() <= MAX_FILE_NAME_LEN {
        return trimmed.to_owned();
    }
    // Only ASCII survives the mapping above, so byte offsets are char boundaries.
    match trimmed.rsplit_once('.') {
        Some((stem, ext)) if ext.len() < 16 => {
            format!("{}.{ext}", &stem[..MAX_FILE_NAME_LEN - ext.len() - 1])
        }
        _ => trimmed[..MAX_FILE_NAME_LEN].to_owned(),
    }
}
