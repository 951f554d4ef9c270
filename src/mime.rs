/// Sent for any extension missing from [`MIME_TYPES`].
pub const FALLBACK_MIME: &str = "application/force-download";

/// Lowercase extension to MIME type. Extend as needed; Apache's `mime.types`
/// is a good source.
pub const MIME_TYPES: &[(&str, &str)] = &[
    ("avi", "video/x-msvideo"),
    ("doc", "application/msword"),
    ("exe", "application/octet-stream"),
    ("flac", "audio/flac"),
    ("gif", "image/gif"),
    ("jpeg", "image/jpg"),
    ("jpg", "image/jpg"),
    ("json", "application/json"),
    ("mp3", "audio/mpeg"),
    ("mp4", "application/mp4"),
    ("ogg", "audio/ogg"),
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("ppt", "application/vnd.ms-powerpoint"),
    ("rtf", "application/rtf"),
    ("sql", "application/sql"),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("xml", "application/xml"),
    ("zip", "application/zip"),
];

/// Text after the last `.` of the base name, if any.
pub fn extension_of(name: &str) -> Option<&str> {
    let base = name.rsplit('/').next().unwrap_or(name);
    base.rsplit_once('.').map(|(_, ext)| ext)
}

pub fn mime_for_extension(ext: &str) -> &'static str {
    let ext = ext.to_ascii_lowercase();
    MIME_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(FALLBACK_MIME)
}

/// MIME type for a requested file name. Lookup is case-insensitive.
pub fn mime_for(name: &str) -> &'static str {
    extension_of(name)
        .map(mime_for_extension)
        .unwrap_or(FALLBACK_MIME)
}
