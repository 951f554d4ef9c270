use std::collections::HashMap;

use crate::config::DownloadConfig;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Parameters carried by one request, split by source.
#[derive(Debug, Default, Clone)]
pub struct RequestParams {
    query: HashMap<String, String>,
    form: HashMap<String, String>,
}

impl RequestParams {
    pub fn new(query: Option<&str>, form: Option<&[u8]>) -> Self {
        Self {
            query: query.map(parse_pairs).unwrap_or_default(),
            form: form.map(parse_pairs).unwrap_or_default(),
        }
    }

    /// Read `field` from the enabled sources. The form body wins over the
    /// query string; empty values count as missing and fall through to `default`.
    pub fn read(
        &self,
        field: &str,
        default: Option<&str>,
        config: &DownloadConfig,
    ) -> Option<String> {
        let from_form = config
            .allow_post
            .then(|| non_empty(&self.form, field))
            .flatten();
        let from_query = config
            .allow_get
            .then(|| non_empty(&self.query, field))
            .flatten();

        from_form
            .or(from_query)
            .map(str::to_string)
            .or_else(|| default.map(str::to_string))
    }
}

fn non_empty<'a>(source: &'a HashMap<String, String>, field: &str) -> Option<&'a str> {
    source
        .get(field)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

/// Malformed input yields an empty source. Later duplicates overwrite earlier ones.
fn parse_pairs(raw: impl AsRef<[u8]>) -> HashMap<String, String> {
    serde_urlencoded::from_bytes::<Vec<(String, String)>>(raw.as_ref())
        .unwrap_or_default()
        .into_iter()
        .collect()
}

/// Whether a `Content-Type` header value announces an urlencoded form body.
pub fn is_form_content_type(value: &str) -> bool {
    value
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}
