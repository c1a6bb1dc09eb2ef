use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{ConfigError, SpecError};
use crate::reader::SpecDialect;
use crate::request::Deployment;

/// Top-level project configuration loaded from `.apiview.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiviewConfig {
    pub spec: SpecConfig,
    pub deployment: Deployment,
    pub mcp: McpConfig,
    pub relay: Option<RelayConfig>,
}

/// Which document to read and how to interpret it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpecConfig {
    pub input: String,
    /// `openapi`, `graphql`, or `mcp`. Detected from content when omitted.
    pub dialect: Option<String>,
    pub version: Option<String>,
}

impl Default for SpecConfig {
    fn default() -> Self {
        Self {
            input: "openapi.yaml".to_string(),
            dialect: None,
            version: None,
        }
    }
}

impl SpecConfig {
    /// The declared dialect, or the one detected from `text`.
    pub fn dialect_for(&self, text: &str) -> Result<SpecDialect, SpecError> {
        match &self.dialect {
            Some(name) => SpecDialect::from_declared(name, self.version.as_deref()),
            None => Ok(SpecDialect::detect(text)),
        }
    }
}

/// MCP session settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct McpConfig {
    pub server_uri: String,
    pub client_name: String,
    pub client_version: String,
    pub protocol_version: String,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            server_uri: "http://localhost:3000".to_string(),
            client_name: "apiview".to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            protocol_version: "2024-11-05".to_string(),
        }
    }
}

/// CORS relay that forwards requests to their target.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    pub url: String,
    #[serde(default)]
    pub token: Option<String>,
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".apiview.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<ApiviewConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let config: ApiviewConfig =
        serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# apiview configuration
spec:
  input: openapi.yaml
  # dialect: openapi     # openapi | graphql | mcp (detected when omitted)
  # version: "3.0"       # "2.0" selects the Swagger reader

deployment:
  runtime_uri: []
    # - https://api.example.com

mcp:
  server_uri: http://localhost:3000
  client_name: apiview
  protocol_version: "2024-11-05"

# relay:
#   url: https://relay.example.com/forward
#   token: your-token
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config: ApiviewConfig = serde_yaml_ng::from_str(default_config_content()).unwrap();
        assert_eq!(config.spec.input, "openapi.yaml");
        assert!(config.spec.dialect.is_none());
        assert!(config.deployment.runtime_uri.is_empty());
        assert_eq!(config.mcp.protocol_version, "2024-11-05");
        assert!(config.relay.is_none());
    }

    #[test]
    fn test_minimal_config() {
        let config: ApiviewConfig =
            serde_yaml_ng::from_str("spec:\n  input: schema.graphql\n").unwrap();
        assert_eq!(config.spec.input, "schema.graphql");
        assert_eq!(config.mcp.client_name, "apiview");
        assert_eq!(config.mcp.server_uri, "http://localhost:3000");
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
spec:
  input: petstore.yaml
  dialect: openapi
  version: "2.0"
deployment:
  runtime_uri:
    - https://petstore.example.com/v2
mcp:
  server_uri: http://localhost:8080
  client_name: console
relay:
  url: https://relay.example.com/forward
  token: secret
"#;
        let config: ApiviewConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.spec.dialect_for("").unwrap(), SpecDialect::OpenApiV2);
        assert_eq!(config.deployment.runtime_uri, vec!["https://petstore.example.com/v2"]);
        assert_eq!(config.mcp.client_name, "console");
        assert_eq!(config.mcp.protocol_version, "2024-11-05");
        let relay = config.relay.unwrap();
        assert_eq!(relay.url, "https://relay.example.com/forward");
        assert_eq!(relay.token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_detects_dialect_when_undeclared() {
        let config = ApiviewConfig::default();
        assert_eq!(
            config.spec.dialect_for("openapi: 3.0.0\n").unwrap(),
            SpecDialect::OpenApiV3
        );
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config(Path::new("/nonexistent/.apiview.yaml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_load_config_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "spec: [unclosed").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
