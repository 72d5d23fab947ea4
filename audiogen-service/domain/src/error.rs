use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("{service} error: {message}")]
    ExternalService { service: String, message: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("i/o error: {0}")]
    Io(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn external_service_error(service: &str, message: &str) -> Self {
        Self::ExternalService {
            service: service.to_string(),
            message: message.to_string(),
        }
    }

    pub fn invalid_input(message: &str) -> Self {
        Self::InvalidInput(message.to_string())
    }

    pub fn io_error(message: &str) -> Self {
        Self::Io(message.to_string())
    }

    pub fn internal_error(message: &str) -> Self {
        Self::Internal(message.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}
