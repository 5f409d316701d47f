use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] crate::orgs::RegistryError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] crate::ingest::PipelineError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
