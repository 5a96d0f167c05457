//! Client for the admin content endpoints (notices, events, faculty, courses,
//! results, examination, static pages and media). Records are free-form JSON;
//! the portal API owns their schema. Requests carry the session token as a
//! bearer credential when one is available.

use crate::app::{ApiClient, AppConfig, AppError};
use reqwest::multipart::{Form, Part};
use secrecy::SecretString;
use serde_json::Value;
use std::{fmt, path::Path, str::FromStr};
use tracing::instrument;

/// Multipart field name used for media uploads.
const UPLOAD_FIELD: &str = "file";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    Notices,
    Events,
    Faculty,
    Courses,
    Results,
    Examination,
    Pages,
    Media,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
    Upload,
}

impl Resource {
    pub const ALL: [Self; 8] = [
        Self::Notices,
        Self::Events,
        Self::Faculty,
        Self::Courses,
        Self::Results,
        Self::Examination,
        Self::Pages,
        Self::Media,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Notices => "notices",
            Self::Events => "events",
            Self::Faculty => "faculty",
            Self::Courses => "courses",
            Self::Results => "results",
            Self::Examination => "examination",
            Self::Pages => "pages",
            Self::Media => "media",
        }
    }

    /// Static pages can only be edited; media is uploaded rather than created.
    #[must_use]
    pub const fn supports(self, operation: Operation) -> bool {
        match self {
            Self::Pages => matches!(operation, Operation::List | Operation::Get | Operation::Update),
            Self::Media => matches!(
                operation,
                Operation::List | Operation::Upload | Operation::Delete
            ),
            _ => !matches!(operation, Operation::Upload),
        }
    }

    fn collection_path(self) -> String {
        format!("/{}", self.name())
    }

    fn item_path(self, id: &str) -> Result<String, AppError> {
        let id = id.trim();
        if id.is_empty() || id.contains('/') {
            return Err(AppError::Config(format!("Invalid {} id: '{id}'", self.name())));
        }
        Ok(format!("/{}/{id}", self.name()))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|resource| resource.name() == value)
            .ok_or_else(|| format!("unknown resource: {value}"))
    }
}

#[derive(Debug, Clone)]
pub struct ContentClient {
    api: ApiClient,
}

impl ContentClient {
    /// # Errors
    /// Returns `AppError::Config` when the API base URL is unusable.
    pub fn new(config: &AppConfig, token: Option<SecretString>) -> Result<Self, AppError> {
        Ok(Self {
            api: ApiClient::new(config)?.with_bearer(token),
        })
    }

    #[instrument(skip(self))]
    pub async fn list(&self, resource: Resource) -> Result<Value, AppError> {
        ensure_supported(resource, Operation::List)?;
        self.api.get_json(&resource.collection_path()).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, resource: Resource, id: &str) -> Result<Value, AppError> {
        ensure_supported(resource, Operation::Get)?;
        self.api.get_json(&resource.item_path(id)?).await
    }

    #[instrument(skip(self, record))]
    pub async fn create(&self, resource: Resource, record: &Value) -> Result<Value, AppError> {
        ensure_supported(resource, Operation::Create)?;
        self.api.post_json(&resource.collection_path(), record).await
    }

    #[instrument(skip(self, record))]
    pub async fn update(
        &self,
        resource: Resource,
        id: &str,
        record: &Value,
    ) -> Result<Value, AppError> {
        ensure_supported(resource, Operation::Update)?;
        self.api.put_json(&resource.item_path(id)?, record).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, resource: Resource, id: &str) -> Result<(), AppError> {
        ensure_supported(resource, Operation::Delete)?;
        self.api.delete(&resource.item_path(id)?).await
    }

    /// Uploads a local file to the media library.
    #[instrument(skip(self))]
    pub async fn upload_media(&self, file: &Path) -> Result<Value, AppError> {
        let file_name = file
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToString::to_string)
            .ok_or_else(|| AppError::Config(format!("Invalid file path: {}", file.display())))?;
        let bytes = tokio::fs::read(file)
            .await
            .map_err(|err| AppError::Serialization(format!("Failed to read {file_name}: {err}")))?;

        let form = Form::new().part(UPLOAD_FIELD, Part::bytes(bytes).file_name(file_name));
        self.api.post_multipart("/media/upload", form).await
    }
}

fn ensure_supported(resource: Resource, operation: Operation) -> Result<(), AppError> {
    if resource.supports(operation) {
        Ok(())
    } else {
        Err(AppError::Config(format!(
            "{operation:?} is not available for {resource}"
        )))
    }
}
