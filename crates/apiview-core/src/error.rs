use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported specification dialect: {0}")]
    UnsupportedDialect(String),

    #[error("invalid specification document: {0}")]
    InvalidDocument(String),

    #[error("failed to parse GraphQL schema: {0}")]
    GraphQl(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml_ng::Error,
    },
}

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("failed to render request preview: {0}")]
    Template(#[from] minijinja::Error),
}
