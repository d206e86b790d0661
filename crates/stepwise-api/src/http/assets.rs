//! Embedded browser client.

use axum::{
    http::header,
    response::{Html, IntoResponse},
};
use rust_embed::RustEmbed;

/// Embedded static assets.
#[derive(RustEmbed)]
#[folder = "src/static/"]
struct StaticAssets;

/// Serve the index HTML page.
pub async fn serve_index() -> impl IntoResponse {
    match StaticAssets::get("index.html") {
        Some(content) => Html(String::from_utf8_lossy(content.data.as_ref()).to_string()),
        None => Html(default_index_html().to_string()),
    }
}

/// Serve the JavaScript app.
pub async fn serve_js() -> impl IntoResponse {
    let body = match StaticAssets::get("app.js") {
        Some(content) => String::from_utf8_lossy(content.data.as_ref()).to_string(),
        None => String::new(),
    };
    ([(header::CONTENT_TYPE, "application/javascript")], body)
}

fn default_index_html() -> &'static str {
    r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Stepwise</title>
</head>
<body>
    <h1>Stepwise</h1>
    <p>The chat client is not bundled in this build. Connect a WebSocket client to
    <code>/ws/chat/{client_id}</code>.</p>
</body>
</html>"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_html_content() {
        let html = default_index_html();
        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains("/ws/chat/"));
    }

    #[test]
    fn test_embedded_assets_present() {
        assert!(StaticAssets::get("index.html").is_some());
        assert!(StaticAssets::get("app.js").is_some());
    }
}
