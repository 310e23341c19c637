use std::collections::HashMap;

use axum::extract::Multipart;
use axum::extract::multipart::MultipartRejection;

use crate::domain::types::ImageUpload;
use crate::error::ComplaintsServiceError;

/// A multipart body split into text fields and file parts.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, ImageUpload>,
}

impl FormData {
    /// Accepts the extractor result so a non-multipart body is reported like any other bad input.
    pub async fn read(
        multipart: Result<Multipart, MultipartRejection>,
    ) -> Result<Self, ComplaintsServiceError> {
        let mut multipart = multipart?;
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ComplaintsServiceError::validation(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            match field.file_name().map(str::to_owned) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_owned);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ComplaintsServiceError::validation(e.body_text()))?;
                    // Browsers send an empty part when the file input is left blank.
                    if !file_name.is_empty() && !bytes.is_empty() {
                        form.files.insert(
                            name,
                            ImageUpload {
                                file_name,
                                content_type,
                                bytes,
                            },
                        );
                    }
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ComplaintsServiceError::validation(e.body_text()))?;
                    form.fields.insert(name, text);
                }
            }
        }
        Ok(form)
    }

    /// Text field, `None` when absent or blank.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn required(&self, name: &str) -> Result<String, ComplaintsServiceError> {
        self.text(name)
            .map(str::to_owned)
            .ok_or_else(|| ComplaintsServiceError::validation(format!("{name} is required")))
    }

    /// Like [`FormData::required`] but returns the value exactly as submitted.
    pub fn required_verbatim(&self, name: &str) -> Result<String, ComplaintsServiceError> {
        self.fields
            .get(name)
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .ok_or_else(|| ComplaintsServiceError::validation(format!("{name} is required")))
    }

    pub fn take_file(&mut self, name: &str) -> Option<ImageUpload> {
        self.files.remove(name)
    }

    #[cfg(test)]
    fn with_fields(pairs: &[(&str, &str)]) -> Self {
        Self {
            fields: pairs
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
            files: HashMap::new(),
        }
    }
}
