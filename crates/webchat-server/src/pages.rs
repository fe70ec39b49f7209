use std::path::Path;

use axum::response::Html;
use tracing::warn;

pub const LANDING_PAGE: &str = "index.html";
pub const CHAT_PAGE: &str = "chat.html";

/// Load an HTML page from the docs directory. A page that cannot be read is
/// logged and served as an empty body.
pub async fn render(docs_dir: &Path, page: &str) -> Html<String> {
    let path = docs_dir.join(page);
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Html(html),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to load page");
            Html(String::new())
        }
    }
}
