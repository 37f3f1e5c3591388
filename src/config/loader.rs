use std::path::Path;

use config::{Config, File, FileFormat};
use eyre::{Context, Result};

use crate::config::models::ServerConfig;

/// Load configuration from a file using the config crate.
/// Supports YAML, JSON and TOML; the format follows the file extension (YAML otherwise).
pub fn load_config(config_path: impl AsRef<Path>) -> Result<ServerConfig> {
    let config_path = config_path.as_ref();

    let format = match config_path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => FileFormat::Json,
        Some("toml") => FileFormat::Toml,
        _ => FileFormat::Yaml,
    };

    let settings = Config::builder()
        .add_source(File::new(
            config_path
                .to_str()
                .ok_or_else(|| eyre::eyre!("Invalid UTF-8 path: {}", config_path.display()))?,
            format,
        ))
        .build()
        .with_context(|| format!("Failed to build config from {}", config_path.display()))?;

    let server_config: ServerConfig = settings.try_deserialize().with_context(|| {
        format!(
            "Failed to deserialize config from {}",
            config_path.display()
        )
    })?;

    Ok(server_config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_load_yaml_config() {
        let yaml_content = r#"
port: 3000
path: "/static"
deny: ".git, *.key"
proxy: "/api=>http://backend:8080"
cors:
  origin: "*"
mock_dir: "./mocks"
body: "./public"
"#;

        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        write!(temp_file, "{}", yaml_content).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.listen_addr(), "0.0.0.0:3000");
        assert_eq!(config.path, "/static");
        assert_eq!(config.deny, ".git, *.key");
        assert_eq!(config.proxy, "/api=>http://backend:8080");
        assert_eq!(config.cors.origin, "*");
        // Unset fields inside a section keep their defaults
        assert_eq!(config.cors.methods, "POST, GET, OPTIONS, PUT, DELETE");
        assert_eq!(config.status, 200);
        assert_eq!(config.body, "./public");
    }

    #[test]
    fn test_load_toml_config() {
        let toml_content = r#"
address = "127.0.0.1"
status = 201
content_type = "application/json"
body = '{"ok":true}'

[tls]
cert_path = "/etc/spark/cert.pem"
key_path = "/etc/spark/key.pem"
"#;

        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "{}", toml_content).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.listen_addr(), "127.0.0.1:8080");
        assert_eq!(config.status, 201);
        assert_eq!(config.content_type_override(), Some("application/json"));
        assert_eq!(config.body, r#"{"ok":true}"#);
        assert_eq!(
            config.tls.cert_path,
            std::path::PathBuf::from("/etc/spark/cert.pem")
        );
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        assert!(load_config("/definitely/not/here.toml").is_err());
    }
}
