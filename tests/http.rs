use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use safedl::{config::DownloadConfig, download::FAILURE_BODY, server};
use tower::ServiceExt;

const PHOTO: &[u8] = b"\xFF\xD8\xFF\xE0 not really a jpeg \x00\x01\x02";

fn fixture() -> (tempfile::TempDir, DownloadConfig) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("download")).unwrap();
    std::fs::write(dir.path().join("download/photo.jpg"), PHOTO).unwrap();
    std::fs::write(dir.path().join("download/report.exe"), b"MZ").unwrap();
    std::fs::write(dir.path().join("secret.txt"), b"top secret").unwrap();

    let config = DownloadConfig::new(
        dir.path().to_path_buf(),
        "download/",
        vec![".jpg".into(), ".pdf".into(), ".txt".into()],
    )
    .unwrap();
    (dir, config)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_form(uri: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

fn assert_failed(status: StatusCode, body: &Bytes) {
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_ref(), FAILURE_BODY.as_bytes());
}

#[tokio::test]
async fn serves_allowed_file_with_download_headers() {
    let (_dir, config) = fixture();
    let (status, headers, body) =
        send(server::router(config), get("/download?file=download/photo.jpg")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/jpg");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"photo.jpg\""
    );
    assert_eq!(headers[header::CONTENT_LENGTH], PHOTO.len().to_string().as_str());
    assert_eq!(headers["content-transfer-encoding"], "binary");
    assert_eq!(headers[header::PRAGMA], "public");
    assert_eq!(headers[header::EXPIRES], "0");

    let cache_control: Vec<_> = headers
        .get_all(header::CACHE_CONTROL)
        .iter()
        .map(|v| v.to_str().unwrap())
        .collect();
    assert_eq!(
        cache_control,
        ["must-revalidate, post-check=0, pre-check=0", "private"]
    );

    let order: Vec<&str> = headers.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(
        order[..8],
        [
            "pragma",
            "expires",
            "cache-control",
            "cache-control",
            "content-type",
            "content-disposition",
            "content-transfer-encoding",
            "content-length",
        ]
    );

    assert_eq!(body.as_ref(), PHOTO);
}

#[tokio::test]
async fn streams_large_files_byte_for_byte() {
    let (dir, config) = fixture();
    let data: Vec<u8> = (0..3 * 1024 * 1024 + 17).map(|i| (i % 251) as u8).collect();
    std::fs::write(dir.path().join("download/big.pdf"), &data).unwrap();

    let (status, headers, body) =
        send(server::router(config), get("/download?file=download/big.pdf")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(headers[header::CONTENT_LENGTH], data.len().to_string().as_str());
    assert_eq!(body.len(), data.len());
    assert!(body.as_ref() == data.as_slice());
}

#[tokio::test]
async fn download_is_never_compressed() {
    let (_dir, config) = fixture();
    let mut request = get("/download?file=download/photo.jpg");
    request
        .headers_mut()
        .insert(header::ACCEPT_ENCODING, "gzip".parse().unwrap());

    let (status, headers, body) = send(server::router(config), request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers.get(header::CONTENT_ENCODING).is_none());
    assert_eq!(body.as_ref(), PHOTO);
}

#[tokio::test]
async fn traversal_is_refused() {
    let (_dir, config) = fixture();
    let (status, headers, body) =
        send(server::router(config), get("/download?file=download/../secret.txt")).await;
    assert_failed(status, &body);
    assert!(headers.get(header::CONTENT_DISPOSITION).is_none());
}

#[tokio::test]
async fn disallowed_extension_is_refused() {
    let (_dir, config) = fixture();
    let (status, _, body) =
        send(server::router(config), get("/download?file=download/report.exe")).await;
    assert_failed(status, &body);
}

#[tokio::test]
async fn missing_file_is_refused() {
    let (_dir, config) = fixture();
    let (status, _, body) =
        send(server::router(config), get("/download?file=download/missing.pdf")).await;
    assert_failed(status, &body);
}

#[tokio::test]
async fn missing_parameter_is_refused() {
    let (_dir, config) = fixture();
    let (status, _, body) = send(server::router(config.clone()), get("/download")).await;
    assert_failed(status, &body);

    let (status, _, body) = send(server::router(config), get("/download?file=")).await;
    assert_failed(status, &body);
}

#[tokio::test]
async fn get_parameter_ignored_when_get_disabled() {
    let (_dir, config) = fixture();
    let config = config.with_methods(false, true).unwrap();

    let (status, _, body) = send(
        server::router(config.clone()),
        get("/download?file=download/photo.jpg"),
    )
    .await;
    assert_failed(status, &body);

    let (status, _, body) = send(
        server::router(config),
        post_form("/download", "file=download/photo.jpg"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_ref(), PHOTO);
}

#[tokio::test]
async fn post_value_wins_over_query() {
    let (_dir, config) = fixture();
    let (status, _, body) = send(
        server::router(config.clone()),
        post_form(
            "/download?file=download/missing.pdf",
            "file=download%2Fphoto.jpg",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_ref(), PHOTO);

    // an empty form value falls back to the query string
    let (status, _, body) = send(
        server::router(config),
        post_form("/download?file=download/photo.jpg", "file="),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_ref(), PHOTO);
}

#[tokio::test]
async fn non_form_post_body_is_ignored() {
    let (_dir, config) = fixture();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/download")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("file=download/photo.jpg"))
        .unwrap();

    let (status, _, body) = send(server::router(config), request).await;
    assert_failed(status, &body);
}

#[tokio::test]
async fn failure_status_is_configurable() {
    let (_dir, config) = fixture();
    let config = config.with_failure_status(404).unwrap();

    let (status, _, body) =
        send(server::router(config), get("/download?file=download/report.exe")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.as_ref(), FAILURE_BODY.as_bytes());
}

#[tokio::test]
async fn directory_with_allowed_suffix_fails_before_headers() {
    let (dir, config) = fixture();
    std::fs::create_dir(dir.path().join("download/album.jpg")).unwrap();

    let (status, headers, body) =
        send(server::router(config), get("/download?file=download/album.jpg")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(headers.get(header::CONTENT_DISPOSITION).is_none());
    assert_eq!(body.as_ref(), FAILURE_BODY.as_bytes());
}

#[tokio::test]
async fn oversized_form_body_falls_back_to_query() {
    let (_dir, config) = fixture();
    let form = format!("file=download/report.exe&pad={}", "x".repeat(20 * 1024));

    let (status, _, body) = send(
        server::router(config.clone()),
        post_form("/download?file=download/photo.jpg", &form),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_ref(), PHOTO);

    // without a query value the request fails like any other refusal
    let (status, _, body) = send(server::router(config), post_form("/download", &form)).await;
    assert_failed(status, &body);
}

#[tokio::test]
async fn get_body_is_never_read() {
    let (_dir, config) = fixture();
    let request = Request::builder()
        .method(Method::GET)
        .uri("/download?file=download/photo.jpg")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("x".repeat(20 * 1024)))
        .unwrap();

    let (status, _, body) = send(server::router(config), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_ref(), PHOTO);
}

#[tokio::test]
async fn form_page_is_served_and_compressed() {
    let (_dir, config) = fixture();
    let (status, headers, body) = send(server::router(config.clone()), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html")
    );
    assert_eq!(headers["x-content-type-options"], "nosniff");
    let page = String::from_utf8(body.to_vec()).unwrap();
    assert!(page.contains("action=\"/download\""));

    let mut request = get("/");
    request
        .headers_mut()
        .insert(header::ACCEPT_ENCODING, "gzip".parse().unwrap());
    let (_, headers, _) = send(server::router(config), request).await;
    assert_eq!(headers[header::CONTENT_ENCODING], "gzip");
}

#[tokio::test]
async fn assets_are_served_from_embedded_web_dir() {
    let (_dir, config) = fixture();
    let (status, headers, _) = send(server::router(config.clone()), get("/assets/style.css")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/css")
    );

    let (status, _, _) = send(server::router(config), get("/assets/nope.js")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
