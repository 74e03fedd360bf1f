use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://drive.api.tekcloud.com";
pub const DEFAULT_WEB_URL: &str = "https://drive.tekcloud.com";
pub const DEFAULT_ACCESS_KEY: &str = "YOUR_ACCESS_KEY";
pub const DEFAULT_TIMEOUT_SECS: u64 = 2;

/// Where the drive lives and how to talk to it. Both API calls receive the
/// same config through `ApiClient`.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    pub base_url: String,
    pub web_url: String,
    pub access_key: String,
    pub timeout: Duration,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            web_url: DEFAULT_WEB_URL.into(),
            access_key: DEFAULT_ACCESS_KEY.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl DriveConfig {
    /// Endpoint that creates a file record.
    pub fn create_file_url(&self) -> String {
        format!("{}/file", self.base_url.trim_end_matches('/'))
    }

    /// Browser link for an uploaded file.
    pub fn viewer_url(&self, file_id: &str) -> String {
        format!("{}/#/f/{}", self.web_url.trim_end_matches('/'), file_id)
    }
}
