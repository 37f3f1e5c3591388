use http::HeaderValue;

use crate::config::models::{CorsConfig, ServerConfig};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// One reverse proxy rule: requests under `prefix` are forwarded to `upstream`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRule {
    pub prefix: String,
    pub upstream: String,
}

/// Parse a comma-separated `PREFIX=>URL` list.
///
/// Pairs whose prefix does not start with `/` or whose URL does not start with `http`
/// are skipped with a warning. Segments without `=>` (including empty ones) are ignored.
pub fn parse_proxy_rules(list: &str) -> Vec<ProxyRule> {
    let mut rules = Vec::new();
    for pair in list.split(',') {
        let elements: Vec<&str> = pair.split("=>").collect();
        if elements.len() != 2 {
            if !pair.trim().is_empty() {
                tracing::warn!("bad proxy pair: {}", pair.trim());
            }
            continue;
        }
        let prefix = elements[0].trim();
        let upstream = elements[1].trim();
        if prefix.starts_with('/') && upstream.starts_with("http") {
            rules.push(ProxyRule {
                prefix: prefix.to_string(),
                upstream: upstream.to_string(),
            });
        } else {
            tracing::warn!("bad proxy pair: {}=>{}", prefix, upstream);
        }
    }
    rules
}

/// Server configuration validator
pub struct ServerConfigValidator;

impl ServerConfigValidator {
    /// Validate the entire server configuration, collecting every problem found.
    pub fn validate(config: &ServerConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if config.address.trim().is_empty() {
            errors.push(ValidationError::InvalidListenAddress {
                address: config.address.clone(),
                reason: "Address must not be empty".to_string(),
            });
        }

        if !config.path.starts_with('/') {
            errors.push(ValidationError::InvalidField {
                field: "path".to_string(),
                message: format!("URL path '{}' must start with '/'", config.path),
            });
        }

        if !(100..=999).contains(&config.status) {
            errors.push(ValidationError::InvalidField {
                field: "status".to_string(),
                message: format!("{} is not a valid HTTP status code", config.status),
            });
        }

        if config.proxy_timeout_secs == 0 {
            errors.push(ValidationError::InvalidField {
                field: "proxy_timeout_secs".to_string(),
                message: "Proxy timeout must be greater than zero".to_string(),
            });
        }

        if let Some(content_type) = config.content_type_override() {
            if let Err(e) = Self::validate_header_value("content_type", content_type) {
                errors.push(e);
            }
        }

        if let Err(mut cors_errors) = Self::validate_cors(&config.cors) {
            errors.append(&mut cors_errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    fn validate_cors(cors: &CorsConfig) -> Result<(), Vec<ValidationError>> {
        if !cors.is_enabled() {
            return Ok(());
        }
        let errors: Vec<ValidationError> = [
            ("cors.origin", &cors.origin),
            ("cors.methods", &cors.methods),
            ("cors.headers", &cors.headers),
        ]
        .into_iter()
        .filter_map(|(field, value)| Self::validate_header_value(field, value).err())
        .collect();

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn validate_header_value(field: &str, value: &str) -> ValidationResult<()> {
        HeaderValue::from_str(value)
            .map(|_| ())
            .map_err(|_| ValidationError::InvalidField {
                field: field.to_string(),
                message: format!("'{value}' is not a valid header value"),
            })
    }

    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        let mut message = format!("Found {} configuration error(s):\n", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, error));
        }
        message
    }
}
