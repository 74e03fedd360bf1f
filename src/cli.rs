// Command-line layer: flag parsing and the straight-line upload flow.
// All network work is delegated to `api::ApiClient`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use crate::api::ApiClient;
use crate::config::{
    DriveConfig, DEFAULT_ACCESS_KEY, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_WEB_URL,
};
use crate::error::UploadError;

/// Flags that used to be spelled with a single dash (`-file`, `-name`).
const SINGLE_DASH_FLAGS: [&str; 2] = ["file", "name"];

/// Flags whose value is the next argument when not given with `=`.
const VALUE_FLAGS: [&str; 8] = [
    "-f",
    "-n",
    "--file",
    "--name",
    "--base-url",
    "--web-url",
    "--access-key",
    "--timeout-secs",
];

/// Upload a local file to TekDrive.
#[derive(Parser, Debug)]
#[command(author, version, about = "Upload a local file to TekDrive.", long_about = None)]
pub struct Args {
    /// Path to file to upload
    #[arg(short, long, default_value = "../README.md", allow_hyphen_values = true)]
    pub file: PathBuf,

    /// Filename override
    #[arg(short, long, default_value = "test-go-file", allow_hyphen_values = true)]
    pub name: String,

    /// Base URL of the drive API
    #[arg(long, env = "TEKDRIVE_API_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Base URL of the drive web app, used for the viewer link
    #[arg(long, env = "TEKDRIVE_WEB_URL", default_value = DEFAULT_WEB_URL)]
    pub web_url: String,

    /// Access key sent in the X-IS-AK header
    #[arg(long, env = "TEKDRIVE_ACCESS_KEY", default_value = DEFAULT_ACCESS_KEY, hide_env_values = true)]
    pub access_key: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "TEKDRIVE_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

impl Args {
    pub fn config(&self) -> DriveConfig {
        DriveConfig {
            base_url: self.base_url.clone(),
            web_url: self.web_url.clone(),
            access_key: self.access_key.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Rewrite `-file x` / `-name=x` into their double-dash form so older
/// invocations keep parsing. Only arguments in flag position are touched:
/// the value following a flag and everything after `--` pass through.
pub fn normalize_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut normalized = Vec::new();
    let mut expects_value = false;
    let mut passthrough = false;
    for arg in args {
        let arg: OsString = arg.into();
        if passthrough || expects_value {
            expects_value = false;
            normalized.push(arg);
            continue;
        }
        let Some(text) = arg.to_str().map(str::to_owned) else {
            normalized.push(arg);
            continue;
        };
        if text == "--" {
            passthrough = true;
            normalized.push(arg);
            continue;
        }
        let text = if is_single_dash_flag(&text) {
            format!("-{text}")
        } else {
            text
        };
        expects_value = VALUE_FLAGS.contains(&text.as_str());
        normalized.push(OsString::from(text));
    }
    normalized
}

fn is_single_dash_flag(arg: &str) -> bool {
    let Some(rest) = arg.strip_prefix('-') else {
        return false;
    };
    if rest.starts_with('-') {
        return false;
    }
    let flag = rest.split_once('=').map_or(rest, |(flag, _)| flag);
    SINGLE_DASH_FLAGS.contains(&flag)
}

/// Anything that exists and is not a directory can be opened and streamed.
fn is_uploadable(path: &Path) -> bool {
    path.metadata().map(|meta| !meta.is_dir()).unwrap_or(false)
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    pub file_id: String,
    pub viewer_url: String,
    pub bytes: u64,
}

/// Create the record, upload the contents, report the viewer link.
pub fn run_upload(api: &ApiClient, file: &Path, name: &str) -> Result<UploadOutcome> {
    println!("Uploading file {} as {}", file.display(), name);

    if !is_uploadable(file) {
        return Err(UploadError::MissingInput {
            path: file.to_path_buf(),
        }
        .into());
    }

    let record = api
        .create_file(name)
        .context("File record creation failed")?;
    if record.storage_limit_exceeded {
        tracing::warn!(file_id = %record.file.id, "drive reports storage limit exceeded");
    }

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{bar:30}] {bytes}/{total_bytes}")?
            .progress_chars("=> "),
    );
    progress.set_message("Uploading...");
    let uploaded = api.upload_file_with_progress(&record.upload_url, file, &progress);
    progress.finish_and_clear();
    let bytes = uploaded.context("File upload failed")?;

    let viewer_url = api.viewer_url(&record.file.id);
    tracing::info!("Successfully uploaded file");
    tracing::info!("View it here: {}", viewer_url);

    Ok(UploadOutcome {
        file_id: record.file.id,
        viewer_url,
        bytes,
    })
}
