use axum::{
    body::Body,
    http::{HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures_util::TryStreamExt;
use tokio_util::io::ReaderStream;

use crate::{mime, validate::ValidatedFile};

/// Body sent for every refused or failed download.
pub const FAILURE_BODY: &str = "Download failed.";

const CONTENT_TRANSFER_ENCODING: HeaderName = HeaderName::from_static("content-transfer-encoding");

/// Failures before any header reaches the client. Once the body is streaming
/// a read error can only cut the connection.
#[derive(thiserror::Error, Debug)]
pub enum ServeError {
    #[error("failed to open {name}: {source}")]
    Open {
        name: String,
        source: std::io::Error,
    },
    #[error("{0} is not a regular file")]
    NotAFile(String),
    #[error("failed to build response headers: {0}")]
    Headers(#[from] axum::http::Error),
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, FAILURE_BODY).into_response()
    }
}

/// The generic refusal. Which rule failed is never revealed.
pub fn failure_response(status: StatusCode) -> Response {
    (status, FAILURE_BODY).into_response()
}

/// Stream `file` to the client as an attachment.
///
/// `Content-Length` is taken from the open handle, so it matches the bytes the
/// stream will yield unless the file changes underneath us. The handle is owned
/// by the body and closed when the stream ends or the client goes away.
pub async fn serve_download(file: &ValidatedFile) -> Result<Response, ServeError> {
    let mime = mime::mime_for(file.basename());

    let handle = tokio::fs::File::open(file.path())
        .await
        .map_err(|source| ServeError::Open {
            name: file.name().to_string(),
            source,
        })?;
    let metadata = handle.metadata().await.map_err(|source| ServeError::Open {
        name: file.name().to_string(),
        source,
    })?;
    if !metadata.is_file() {
        return Err(ServeError::NotAFile(file.name().to_string()));
    }

    let name = file.name().to_string();
    let stream = ReaderStream::new(handle).inspect_err(move |e| {
        tracing::warn!("Read error while streaming {}: {}", name, e);
    });

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::PRAGMA, "public")
        .header(header::EXPIRES, "0")
        .header(
            header::CACHE_CONTROL,
            "must-revalidate, post-check=0, pre-check=0",
        )
        // appended, not replaced; some browsers need both
        .header(header::CACHE_CONTROL, "private")
        .header(header::CONTENT_TYPE, mime)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(file.basename()),
        )
        .header(CONTENT_TRANSFER_ENCODING, "binary")
        .header(header::CONTENT_LENGTH, metadata.len().to_string())
        .body(Body::from_stream(stream))?;

    Ok(response)
}

/// `attachment; filename="<name>"`. Names that are not printable ASCII get an
/// ASCII fallback plus an RFC 5987 `filename*` parameter.
pub fn content_disposition(basename: &str) -> String {
    let printable = basename.chars().all(|c| c.is_ascii() && !c.is_ascii_control());
    if printable && !basename.contains(['"', '\\']) {
        return format!("attachment; filename=\"{}\"", basename);
    }

    let fallback: String = basename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(basename)
    )
}
