// API client module: a small blocking HTTP client for the two calls the
// drive needs to store a file. First a file record is created, then the
// raw bytes are PUT to the one-time upload URL that came back with it.

use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use reqwest::blocking::{Body, Client};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs::File;
use std::path::Path;

use crate::config::DriveConfig;
use crate::error::{Stage, UploadError};

/// Header carrying the drive access key.
pub const ACCESS_KEY_HEADER: &str = "X-IS-AK";

/// Body of the create file call.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FileMetaRequest {
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct UserRef {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub username: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Permissions {
    #[serde(deserialize_with = "null_as_default")]
    pub owner: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub creator: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub public: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub read: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub edit: bool,
}

/// File record as returned by the drive. Missing or null fields decode to
/// their empty values. `shared_at` is kept as raw JSON because the drive sends
/// either null or an untyped value there.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FileRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub owner: UserRef,
    #[serde(deserialize_with = "null_as_default")]
    pub creator: UserRef,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub file_type: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub shared_at: serde_json::Value,
    #[serde(deserialize_with = "null_as_default")]
    pub upload_state: String,
    /// Size as the drive encodes it, a decimal string.
    #[serde(deserialize_with = "null_as_default")]
    pub bytes: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub parent_folder_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub permissions: Permissions,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateFileResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub file: FileRecord,
    /// Valid for a single PUT.
    #[serde(deserialize_with = "null_as_default")]
    pub upload_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub storage_limit_exceeded: bool,
}

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Blocking client holding one reqwest client (with the configured
/// timeout) and the drive config.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: DriveConfig,
    access_key: HeaderValue,
}

impl ApiClient {
    pub fn new(config: DriveConfig) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(UploadError::Client)?;
        let mut access_key = HeaderValue::from_str(&config.access_key)?;
        access_key.set_sensitive(true);
        Ok(ApiClient {
            client,
            config,
            access_key,
        })
    }

    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    pub fn viewer_url(&self, file_id: &str) -> String {
        self.config.viewer_url(file_id)
    }

    /// Create the file record and return it along with its upload URL.
    /// Each call is a fresh request.
    pub fn create_file(&self, name: &str) -> Result<CreateFileResponse, UploadError> {
        let stage = Stage::CreateFile;
        let url = self.config.create_file_url();
        let meta = FileMetaRequest { name: name.to_string() };

        let request = self
            .client
            .post(&url)
            .header(ACCESS_KEY_HEADER, self.access_key.clone())
            .json(&meta)
            .build()
            .map_err(|source| UploadError::Request { stage, source })?;

        tracing::debug!(url = %url, name, "creating file record");
        let res = self
            .client
            .execute(request)
            .map_err(|source| UploadError::Transport { stage, source })?;
        check_status(stage, res.status())?;

        let body = res
            .bytes()
            .map_err(|source| UploadError::Body { stage, source })?;
        let record: CreateFileResponse = serde_json::from_slice(&body)?;
        tracing::debug!(
            file_id = %record.file.id,
            storage_limit_exceeded = record.storage_limit_exceeded,
            "file record created"
        );
        Ok(record)
    }

    /// PUT the whole file to `upload_url`. Returns the Content-Length sent.
    pub fn upload_file(&self, upload_url: &str, file_path: &Path) -> Result<u64, UploadError> {
        self.upload_file_with_progress(upload_url, file_path, &ProgressBar::hidden())
    }

    /// Same as `upload_file`, advancing `progress` as bytes are read.
    pub fn upload_file_with_progress(
        &self,
        upload_url: &str,
        file_path: &Path,
        progress: &ProgressBar,
    ) -> Result<u64, UploadError> {
        let stage = Stage::UploadFile;
        let file = File::open(file_path).map_err(|source| UploadError::FileOpen {
            path: file_path.to_path_buf(),
            source,
        })?;
        let size = file
            .metadata()
            .map_err(|source| UploadError::FileMetadata {
                path: file_path.to_path_buf(),
                source,
            })?
            .len();
        progress.set_length(size);

        // The upload endpoint rejects chunked transfer encoding, so the body
        // must be sized. The file handle moves into the body and is closed
        // when the request is dropped.
        let body = Body::sized(progress.wrap_read(file), size);
        let request = self
            .client
            .put(upload_url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .build()
            .map_err(|source| UploadError::Request { stage, source })?;

        tracing::debug!(url = upload_url, size, "uploading file contents");
        let res = self
            .client
            .execute(request)
            .map_err(|source| UploadError::Transport { stage, source })?;
        check_status(stage, res.status())?;
        Ok(size)
    }
}

/// Anything above 200 is a failure, 201 and 204 included.
pub fn status_accepted(status: StatusCode) -> bool {
    status.as_u16() <= 200
}

fn check_status(stage: Stage, status: StatusCode) -> Result<(), UploadError> {
    if status_accepted(status) {
        return Ok(());
    }
    let err = UploadError::Status { stage, status };
    // Reads as "<Stage> HTTP Response Status: <code> <reason>".
    tracing::warn!("{err}");
    Err(err)
}
