use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;

use civic_domain::complaint::Category;

use crate::config::ClassifierConfig;
use crate::domain::repository::Classifier;
use crate::domain::types::{ImageUpload, Suggestion, is_valid_severity};
use crate::error::ComplaintsServiceError;

/// Posts the image as multipart field `image` and reads the suggestion from the response body.
#[derive(Clone)]
pub struct HttpClassifier {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

fn dependency(e: impl std::fmt::Display) -> ComplaintsServiceError {
    ComplaintsServiceError::DependencyFailure(format!("classifier: {e}"))
}

impl Classifier for HttpClassifier {
    async fn classify(&self, image: &ImageUpload) -> Result<Suggestion, ComplaintsServiceError> {
        let mut part = Part::bytes(image.bytes.to_vec()).file_name(image.file_name.clone());
        if let Some(content_type) = &image.content_type {
            part = part.mime_str(content_type).map_err(dependency)?;
        }
        let mut request = self
            .client
            .post(&self.url)
            .multipart(Form::new().part("image", part));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(dependency)?;
        let status = response.status();
        if !status.is_success() {
            return Err(dependency(format!("upstream returned {status}")));
        }
        let text = response.text().await.map_err(dependency)?;
        debug!(bytes = text.len(), "classifier responded");
        parse_suggestion(&text)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSeverity {
    Number(f64),
    Text(String),
}

#[derive(Deserialize)]
struct RawSuggestion {
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    image_severity_score: Option<RawSeverity>,
}

/// Parse classifier output, tolerating a Markdown code fence around the JSON.
///
/// Unknown categories and out-of-range severities are dropped rather than rejected.
pub fn parse_suggestion(text: &str) -> Result<Suggestion, ComplaintsServiceError> {
    let raw: RawSuggestion = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| dependency(format!("unparseable response: {e}")))?;

    let severity = match raw.image_severity_score {
        Some(RawSeverity::Number(n)) => Some(n),
        Some(RawSeverity::Text(s)) => s.trim().parse().ok(),
        None => None,
    };
    Ok(Suggestion {
        title: raw.title.map(|t| t.trim().to_owned()).filter(|t| !t.is_empty()),
        description: raw
            .description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty()),
        category: raw.category.and_then(|c| c.parse::<Category>().ok()),
        image_severity_score: severity.filter(|s| is_valid_severity(*s)),
    })
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// The classifier chosen at startup.
#[derive(Clone)]
pub enum ClassifierClient {
    Http(HttpClassifier),
    Disabled,
}

impl ClassifierClient {
    pub fn from_config(config: Option<&ClassifierConfig>) -> Self {
        config.map_or(Self::Disabled, |c| Self::Http(HttpClassifier::new(c)))
    }
}

impl Classifier for ClassifierClient {
    async fn classify(&self, image: &ImageUpload) -> Result<Suggestion, ComplaintsServiceError> {
        match self {
            Self::Http(c) => c.classify(image).await,
            Self::Disabled => Err(ComplaintsServiceError::DependencyFailure(
                "classifier is not configured".to_owned(),
            )),
        }
    }
}
