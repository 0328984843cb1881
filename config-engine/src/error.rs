use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration parsing failed: {0}")]
    ParseError(#[from] Box<figment::Error>),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Logging setup failed: {0}")]
    Logging(#[from] logger_redacted::LoggerError),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::ParseError(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
