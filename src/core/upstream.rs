//! Target URL construction for forwarded requests.

/// Build the upstream URL for a request: `upstream + suffix`, then `?query` and
/// `#fragment` when the original request carried them.
///
/// `suffix` is the request path with the route prefix already removed.
pub fn build_target_url(
    upstream: &str,
    suffix: &str,
    query: Option<&str>,
    fragment: Option<&str>,
) -> String {
    let mut target = String::with_capacity(upstream.len() + suffix.len() + 16);
    target.push_str(upstream);
    target.push_str(suffix);
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        target.push('?');
        target.push_str(query);
    }
    if let Some(fragment) = fragment.filter(|f| !f.is_empty()) {
        target.push('#');
        target.push_str(fragment);
    }
    target
}
