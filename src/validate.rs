use std::path::{Path, PathBuf};

use crate::config::DownloadConfig;

/// Why a download was refused. Only ever logged; the client always sees the
/// same generic message.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("no file parameter supplied")]
    ParameterMissing,
    #[error("{0} does not exist")]
    FileNotFound(String),
    #[error("{0} does not end with an allowed extension")]
    ExtensionNotAllowed(String),
    #[error("{0} escapes the download directory")]
    PathEscapeSuspected(String),
}

/// A requested name that passed every rule. Only [`validate`] creates one,
/// so holding it proves the file may be served.
#[derive(Debug, Clone)]
pub struct ValidatedFile {
    name: String,
    path: PathBuf,
}

impl ValidatedFile {
    /// The name exactly as the client sent it.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Filesystem location, i.e. the name resolved against the configured root.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base name offered to the client's save dialog. Never the full path.
    pub fn basename(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Checks `file` against the configured policy.
///
/// The string rules run first, so a name that fails them is never looked up
/// on disk. `..` is rejected anywhere in the name: `/..`, `./../` and
/// `a/b/../../../` all climb out of a directory the name nominally starts in.
/// This assumes the configured directory itself never contains `..`, which
/// [`DownloadConfig::new`] enforces.
pub async fn validate(
    file: Option<&str>,
    config: &DownloadConfig,
) -> Result<ValidatedFile, Rejection> {
    let file = match file {
        Some(f) if !f.is_empty() => f,
        _ => return Err(Rejection::ParameterMissing),
    };

    if !config
        .allowed_extensions
        .iter()
        .any(|ext| file.ends_with(ext.as_str()))
    {
        return Err(Rejection::ExtensionNotAllowed(file.to_string()));
    }

    if !file.starts_with(&config.download_dir) || file.contains("..") {
        return Err(Rejection::PathEscapeSuspected(file.to_string()));
    }

    let path = config.root.join(file);
    if tokio::fs::metadata(&path).await.is_err() {
        return Err(Rejection::FileNotFound(file.to_string()));
    }

    if config.strict_containment {
        check_containment(&path, config)
            .await
            .ok_or_else(|| Rejection::PathEscapeSuspected(file.to_string()))?;
    }

    Ok(ValidatedFile {
        name: file.to_string(),
        path,
    })
}

/// Boolean form of [`validate`].
pub async fn is_valid(file: Option<&str>, config: &DownloadConfig) -> bool {
    validate(file, config).await.is_ok()
}

/// Resolves symlinks on both sides and requires the file to sit below the
/// download directory. `None` means outside, or unresolvable.
async fn check_containment(path: &Path, config: &DownloadConfig) -> Option<()> {
    let dir = tokio::fs::canonicalize(config.served_dir()).await.ok()?;
    let target = tokio::fs::canonicalize(path).await.ok()?;
    (target != dir && target.starts_with(&dir)).then_some(())
}
