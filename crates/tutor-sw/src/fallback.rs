//! Offline notice served for navigations that neither cache nor network can answer.

use http::{HeaderValue, StatusCode};
use tutor_net::Response;
use url::Url;

const OFFLINE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Offline - {app_name}</title>
    <style>
      body { margin: 0; min-height: 100vh; display: flex; align-items: center; justify-content: center;
             background: #f9fafb; font-family: system-ui, -apple-system, "Segoe UI", sans-serif; }
      .card { text-align: center; padding: 1.5rem; }
      .badge { width: 4rem; height: 4rem; margin: 0 auto 1rem; border-radius: 9999px; background: #dbeafe;
               display: flex; align-items: center; justify-content: center; color: #2563eb; font-size: 2rem; }
      h1 { font-size: 1.5rem; color: #111827; margin: 0 0 0.5rem; }
      p { color: #4b5563; margin: 0 0 1rem; }
      button { background: #2563eb; color: #fff; border: 0; padding: 0.5rem 1rem; border-radius: 0.5rem;
               font-size: 1rem; cursor: pointer; }
      button:hover { background: #1d4ed8; }
    </style>
  </head>
  <body>
    <div class="card">
      <div class="badge" aria-hidden="true">&#x2708;</div>
      <h1>You're Offline</h1>
      <p>Please check your internet connection and try again.</p>
      <button type="button" id="reload" onclick="window.location.reload()">Try Again</button>
    </div>
  </body>
</html>
"#;

/// Render the offline document for a failed navigation to `url`.
pub fn offline_document(app_name: &str, url: &Url) -> Response {
    let html = OFFLINE_TEMPLATE.replace("{app_name}", &escape_html(app_name));

    Response::new(url.clone(), StatusCode::OK)
        .with_header(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("text/html"),
        )
        .with_body(html)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_document_is_html_with_reload() {
        let url = Url::parse("https://tutor.example/student/home").unwrap();
        let response = offline_document("Math Tutor", &url);

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.headers.get(http::header::CONTENT_TYPE).unwrap(),
            "text/html"
        );

        let body = response.text().unwrap();
        assert!(body.contains("<title>Offline - Math Tutor</title>"));
        assert!(body.contains("window.location.reload()"));
        assert!(!body.contains("<script src="));
        assert!(!body.contains("<link"));
    }

    #[test]
    fn test_app_name_is_escaped() {
        let url = Url::parse("https://tutor.example/").unwrap();
        let body = offline_document("<b>Tutor</b> & Co", &url).text().unwrap();
        assert!(body.contains("Offline - &lt;b&gt;Tutor&lt;/b&gt; &amp; Co"));
    }
}
