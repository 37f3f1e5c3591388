//! Plain-text rendering of a request for the `/echo` diagnostic endpoint.
use hyper::{header, http::request::Parts};

/// Render method, path, query, host, protocol, headers and body as a sectioned
/// plain-text document. Header values are listed in header-map order, with repeated
/// values of one name kept in their original order.
pub fn render_request(parts: &Parts, body: &[u8]) -> Vec<u8> {
    let mut out = String::new();

    out.push_str("=== REQUEST ===\n");
    out.push_str(&format!("Method: {}\n", parts.method));
    out.push_str(&format!("Path: {}\n", parts.uri.path()));
    if let Some(query) = parts.uri.query().filter(|q| !q.is_empty()) {
        out.push_str(&format!("Query: {query}\n"));
    }
    out.push_str(&format!("Host: {}\n", request_host(parts)));
    out.push_str(&format!("Protocol: {:?}\n", parts.version));
    out.push('\n');

    out.push_str("=== HEADERS ===\n");
    for (name, value) in &parts.headers {
        out.push_str(&format!(
            "{}: {}\n",
            name,
            String::from_utf8_lossy(value.as_bytes())
        ));
    }
    out.push('\n');

    out.push_str("=== BODY ===\n");
    let mut rendered = out.into_bytes();
    if body.is_empty() {
        rendered.extend_from_slice(b"(empty)\n");
    } else {
        rendered.extend_from_slice(body);
        rendered.push(b'\n');
    }
    rendered
}

fn request_host(parts: &Parts) -> String {
    parts
        .headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| parts.uri.authority().map(|a| a.to_string()))
        .unwrap_or_default()
}
