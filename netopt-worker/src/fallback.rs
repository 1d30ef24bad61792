//! Degraded responses served when neither the network nor a cache can answer.

use serde::{Deserialize, Serialize};

use crate::request::{Destination, WorkerResponse};

const PLACEHOLDER_IMAGE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="200" viewBox="0 0 200 200"><rect width="200" height="200" fill="#e5e7eb"/><path d="M60 130l30-40 25 30 15-20 30 30z" fill="#9ca3af"/><circle cx="130" cy="75" r="12" fill="#9ca3af"/></svg>"##;

const OFFLINE_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Offline</title>
<style>
body{margin:0;min-height:100vh;display:flex;align-items:center;justify-content:center;font-family:system-ui,sans-serif;background:#f9fafb;color:#111827}
main{text-align:center;padding:2rem;max-width:28rem}
h1{font-size:1.5rem;margin:0 0 .5rem}
p{color:#4b5563;margin:0 0 1.5rem}
button{font:inherit;padding:.6rem 1.4rem;border:0;border-radius:.5rem;background:#2563eb;color:#fff;cursor:pointer}
</style>
</head>
<body>
<main>
<h1>You are offline</h1>
<p>This page is not available without a connection. Check your network and try again.</p>
<button type="button" onclick="location.reload()">Retry</button>
</main>
</body>
</html>
"#;

/// Kind of degraded response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Placeholder {
    /// An empty stylesheet.
    EmptyCss,
    /// An empty script.
    EmptyScript,
    /// A neutral SVG image.
    Image,
    /// An empty `404`.
    NotFound,
}

impl Placeholder {
    /// Placeholder suited to a resource of type `destination`.
    pub fn for_destination(destination: Destination) -> Self {
        match destination {
            Destination::Style => Placeholder::EmptyCss,
            Destination::Script => Placeholder::EmptyScript,
            Destination::Image => Placeholder::Image,
            Destination::Document | Destination::Font | Destination::Other => {
                Placeholder::NotFound
            }
        }
    }

    /// Builds the response.
    pub fn response(self) -> WorkerResponse {
        match self {
            Placeholder::EmptyCss => WorkerResponse::ok("text/css", ""),
            Placeholder::EmptyScript => WorkerResponse::ok("application/javascript", ""),
            Placeholder::Image => WorkerResponse::ok("image/svg+xml", PLACEHOLDER_IMAGE),
            Placeholder::NotFound => WorkerResponse::not_found(),
        }
    }
}

/// Self-contained offline page with a retry button. Status `200`.
pub fn offline_page() -> WorkerResponse {
    WorkerResponse::ok("text/html; charset=utf-8", OFFLINE_PAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_page_has_no_external_resources() {
        let page = offline_page();
        let html = std::str::from_utf8(&page.body).unwrap();

        assert!(page.is_success());
        assert!(!html.contains("src="));
        assert!(!html.contains("href="));
        assert!(html.contains("location.reload()"));
    }
}
