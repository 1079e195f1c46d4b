use std::time::Duration;

/// Builds the shared outbound client. Every upstream call inherits `timeout`.
pub fn build_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("osn/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Joins an API base and a path with exactly one `/` between them.
///
/// ```
/// use osn_core::http::join_url;
///
/// assert_eq!(join_url("https://slack.com/api/", "/chat.postMessage"), "https://slack.com/api/chat.postMessage");
/// ```
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Caps an upstream body before it lands in an error or log field.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 512;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}
