use anyhow::{Result, anyhow};
use axum::http::StatusCode;
use std::path::{Path, PathBuf};

/// Directory downloads are served from when none is configured.
pub const DEFAULT_DOWNLOAD_DIR: &str = "download/";

/// File endings served when no allow-list is configured. Fewer is safer.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".gif", ".png", ".jpg", ".jpeg", ".pdf", ".rar", ".zip", ".doc", ".xls", ".xlsx", ".ppt",
    ".pptx",
];

/// Download policy. Built once at startup and shared read-only by every request.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Base directory that relative `file` parameters are resolved against.
    pub root: PathBuf,
    /// Raw string prefix every requested name must start with. Always ends in `/`.
    pub download_dir: String,
    /// Case-sensitive suffixes; a name must end with one of them.
    pub allowed_extensions: Vec<String>,
    pub allow_get: bool,
    pub allow_post: bool,
    /// Additionally require the canonical path to stay inside the download directory.
    pub strict_containment: bool,
    /// Status sent along with the `Download failed.` body.
    pub failure_status: StatusCode,
}

impl DownloadConfig {
    /// Both methods enabled, prefix checks only, failures reported with 200.
    pub fn new(
        root: PathBuf,
        download_dir: impl Into<String>,
        allowed_extensions: Vec<String>,
    ) -> Result<Self> {
        if !root.is_dir() {
            return Err(anyhow!("Root directory not found: {}", root.display()));
        }

        let download_dir = download_dir.into();
        check_download_dir(&download_dir)?;

        if allowed_extensions.is_empty() {
            return Err(anyhow!("At least one allowed extension is required"));
        }
        if allowed_extensions.iter().any(|ext| ext.is_empty()) {
            return Err(anyhow!("Allowed extensions must not be empty strings"));
        }

        let served = root.join(&download_dir);
        if !served.is_dir() {
            tracing::warn!(
                "Download directory {} does not exist yet; every request will fail until it does",
                served.display()
            );
        }

        Ok(Self {
            root,
            download_dir,
            allowed_extensions,
            allow_get: true,
            allow_post: true,
            strict_containment: false,
            failure_status: StatusCode::OK,
        })
    }

    pub fn with_methods(mut self, allow_get: bool, allow_post: bool) -> Result<Self> {
        if !allow_get && !allow_post {
            return Err(anyhow!("Enable at least one of GET or POST"));
        }
        self.allow_get = allow_get;
        self.allow_post = allow_post;
        Ok(self)
    }

    pub fn with_strict_containment(mut self, strict: bool) -> Self {
        self.strict_containment = strict;
        self
    }

    /// Only 200 and 4xx/5xx are accepted: 1xx, 204 and 304 responses
    /// cannot carry the failure body.
    pub fn with_failure_status(mut self, status: u16) -> Result<Self> {
        if status != 200 && !(400..=599).contains(&status) {
            return Err(anyhow!(
                "Failure status must be 200 or between 400 and 599, got {}",
                status
            ));
        }
        self.failure_status = StatusCode::from_u16(status)
            .map_err(|_| anyhow!("Invalid HTTP status code: {}", status))?;
        Ok(self)
    }

    /// `root/download_dir` as a filesystem path.
    pub fn served_dir(&self) -> PathBuf {
        self.root.join(&self.download_dir)
    }
}

/// The prefix check is only sound when the configured directory is itself
/// relative, slash-terminated and free of `..`.
fn check_download_dir(dir: &str) -> Result<()> {
    if dir.is_empty() {
        return Err(anyhow!("Download directory must not be empty"));
    }
    if !dir.ends_with('/') {
        return Err(anyhow!(
            "Download directory '{}' must end with '/' (try '{}/')",
            dir,
            dir
        ));
    }
    if dir.starts_with('/') || Path::new(dir).is_absolute() {
        return Err(anyhow!("Download directory '{}' must be a relative path", dir));
    }
    if dir.contains("..") {
        return Err(anyhow!("Download directory '{}' must not contain '..'", dir));
    }
    Ok(())
}

/// Settings for the listening socket around a [`DownloadConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub download: DownloadConfig,
}

impl ServerConfig {
    pub fn new(bind: String, port: u16, download: DownloadConfig) -> Self {
        Self { bind, port, download }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Trims a comma separated extension list and drops blank entries.
/// Suffixes are kept verbatim, so `jpg` also matches `photo.xjpg`.
pub fn parse_extensions(list: &[String]) -> Vec<String> {
    list.iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
