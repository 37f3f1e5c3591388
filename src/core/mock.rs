//! Mock fixture naming rules.
//!
//! A fixture file is named `METHOD[_STATUS][.ext]`: the method is matched
//! case-insensitively against the request, the optional status segment selects the
//! response code (200 otherwise), and the extension picks the content type.
//! This module is pure; directory access lives in the mock handler adapter.
use hyper::{Method, StatusCode};

/// Verb prefixes that mark a directory as a mock endpoint during discovery.
pub const HTTP_VERBS: [&str; 7] = ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

/// Whether a file name starts with a recognised HTTP verb (case-insensitive).
pub fn is_verb_file(file_name: &str) -> bool {
    let upper = file_name.to_ascii_uppercase();
    HTTP_VERBS.iter().any(|verb| upper.starts_with(verb))
}

/// Content type implied by a fixture extension, if it is one of the known ones.
pub fn content_type_for_extension(extension: &str) -> Option<&'static str> {
    match extension {
        "json" => Some("application/json"),
        "xml" => Some("application/xml"),
        "html" => Some("text/html"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}

/// A fixture file name broken into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureName<'a> {
    file_name: &'a str,
    method: String,
    status_segment: Option<&'a str>,
}

impl<'a> FixtureName<'a> {
    pub fn parse(file_name: &'a str) -> Self {
        let mut parts = file_name.split('_');
        let head = parts.next().unwrap_or_default();
        let method = strip_extension(head).to_ascii_uppercase();
        let status_segment = parts.next().map(strip_extension);
        Self {
            file_name,
            method,
            status_segment,
        }
    }

    pub fn file_name(&self) -> &'a str {
        self.file_name
    }

    /// Upper-cased method token.
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn matches(&self, method: &Method) -> bool {
        self.method.eq_ignore_ascii_case(method.as_str())
    }

    /// Response status encoded in the name. A missing or malformed segment yields 200;
    /// a malformed one is reported with a warning.
    pub fn status(&self) -> StatusCode {
        let Some(segment) = self.status_segment else {
            return StatusCode::OK;
        };
        let parsed = (!segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()))
            .then(|| segment.parse::<u16>().ok())
            .flatten()
            .and_then(|code| StatusCode::from_u16(code).ok());

        parsed.unwrap_or_else(|| {
            tracing::warn!(
                "Mock fixture '{}' has malformed status segment '{}', defaulting to 200",
                self.file_name,
                segment
            );
            StatusCode::OK
        })
    }

    /// Extension after the last `.`, if any.
    pub fn extension(&self) -> Option<&'a str> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }
}

fn strip_extension(segment: &str) -> &str {
    segment.split('.').next().unwrap_or(segment)
}

/// Outcome of matching a request method against the files of an endpoint directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResolution {
    Matched { file_name: String, status: StatusCode },
    MethodNotAllowed { allowed: Vec<String> },
}

/// Pick the fixture for `method` among `file_names`, scanned in the given order.
/// Every method token seen before the match is collected for the `Allow` header.
///
/// `Allow` is deduplicated: `GET` and `GET_404` contribute a single `GET`.
pub fn resolve_fixture<'a, I>(file_names: I, method: &Method) -> MockResolution
where
    I: IntoIterator<Item = &'a str>,
{
    let mut allowed: Vec<String> = Vec::new();
    for file_name in file_names {
        let fixture = FixtureName::parse(file_name);
        if !allowed.iter().any(|m| m == fixture.method()) {
            allowed.push(fixture.method().to_string());
        }
        if fixture.matches(method) {
            return MockResolution::Matched {
                file_name: file_name.to_string(),
                status: fixture.status(),
            };
        }
    }
    MockResolution::MethodNotAllowed { allowed }
}
