use thiserror::Error;

/// Configuration failures. Always fatal: a run never starts with an invalid
/// configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env vars: {}", .0.join(", "))]
    MissingEnvVars(Vec<String>),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("invalid analysis configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error("failed to read brands file {path}: {source}")]
    BrandsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse brands file: {0}")]
    BrandsFileParse(#[from] serde_yaml::Error),

    #[error("brand roster validation failed: {0}")]
    Validation(String),
}
