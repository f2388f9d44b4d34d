use thiserror::Error;

#[derive(Error, Debug)]
pub enum CardError {
    #[error("Card not found: {0}")]
    NotFound(String),

    #[error("Card already exists: {0}")]
    AlreadyExists(String),

    #[error("No directory is open")]
    NoDirectory,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Front matter error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Config error: {0}")]
    Config(#[from] confique::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Service error: {0}")]
    Service(String),
}

impl CardError {
    /// True for errors that mean the target path is gone.
    pub fn is_not_found(&self) -> bool {
        match self {
            CardError::NotFound(_) => true,
            CardError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CardError>;
