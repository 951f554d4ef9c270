use axum::{
    Router,
    extract::{Path, Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use rust_embed::Embed;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::{
    banner,
    config::{DownloadConfig, ServerConfig},
    download::{failure_response, serve_download},
    params::{self, RequestParams},
    validate::validate,
};

#[derive(Embed)]
#[folder = "web/"]
struct WebAssets;

pub struct AppState {
    pub config: DownloadConfig,
}

/// A `file=...` form needs a few hundred bytes at most. Larger bodies are
/// ignored rather than refused, so the query string still applies.
const MAX_FORM_BODY: usize = 16 * 1024;

async fn security_headers(
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("Referrer-Policy", HeaderValue::from_static("no-referrer"));
    headers.insert(
        "Content-Security-Policy",
        HeaderValue::from_static(
            "default-src 'self'; \
             style-src 'self'; \
             form-action 'self'; \
             frame-ancestors 'none';",
        ),
    );
    response
}

/// Build the application. Pages are compressed; `/download` never is, so the
/// `Content-Length` it sets always matches the bytes on the wire.
pub fn router(config: DownloadConfig) -> Router {
    let state = Arc::new(AppState { config });

    let pages = Router::new()
        .route("/", get(serve_form_page))
        .route("/assets/{*path}", get(serve_web_asset))
        .layer(CompressionLayer::new());

    let downloads = Router::new().route("/download", get(handle_download).post(handle_download));

    pages
        .merge(downloads)
        .layer(middleware::from_fn(security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start(config: ServerConfig) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.addr()).await?;
    let port = listener.local_addr()?.port();

    let local_ip = local_ip_address::local_ip().unwrap_or([127, 0, 0, 1].into());
    let url = format!("http://{}:{}/", local_ip, port);
    let localhost_url = format!("http://localhost:{}/", port);
    banner::print_banner(&url, &localhost_url, &config.download);

    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(config.download))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                banner::print_shutdown();
            }
        })
        .await?;

    Ok(())
}

// ===============================================================================
// DOWNLOAD
// ===============================================================================

async fn handle_download(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let config = &state.config;
    let (parts, body) = request.into_parts();
    let method = parts.method;

    let is_form = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(params::is_form_content_type);

    // the body is only read when it can contribute a parameter
    let form = if method == Method::POST && config.allow_post && is_form {
        match axum::body::to_bytes(body, MAX_FORM_BODY).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::info!(%method, "Ignoring form body: {}", e);
                None
            }
        }
    } else {
        None
    };

    let params = RequestParams::new(parts.uri.query(), form.as_deref());
    let file = params.read("file", None, config);

    let validated = match validate(file.as_deref(), config).await {
        Ok(validated) => validated,
        Err(reason) => {
            tracing::info!(%method, "Download refused: {}", reason);
            return failure_response(config.failure_status);
        }
    };

    match serve_download(&validated).await {
        Ok(response) => {
            let size = response
                .headers()
                .get(header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or_default();
            tracing::info!(
                %method,
                "Serving {} ({})",
                validated.name(),
                bytesize::ByteSize::b(size)
            );
            response
        }
        Err(e) => {
            tracing::error!("Download of {} failed: {}", validated.name(), e);
            e.into_response()
        }
    }
}

// ===============================================================================
// FORM PAGE
// ===============================================================================

async fn serve_form_page() -> Response {
    match WebAssets::get("index.html") {
        Some(content) => {
            Html(String::from_utf8_lossy(content.data.as_ref()).to_string()).into_response()
        }
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn serve_web_asset(Path(path): Path<String>) -> Response {
    match WebAssets::get(&path) {
        Some(content) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.as_ref())],
                content.data.to_vec(),
            )
                .into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
