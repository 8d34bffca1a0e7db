// Error types for the HTTP collaborators

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Unsupported Media Type: {0}")]
    UnsupportedMediaType(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::BadRequest(_) | Error::Deserialization(_) => 400,
            Error::UnsupportedMediaType(_) => 415,
            Error::Serialization(_) | Error::Internal(_) | Error::Io(_) => 500,
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::BadRequest("x".into()).status_code(), 400);
        assert_eq!(Error::UnsupportedMediaType("x".into()).status_code(), 415);
        assert!(Error::Deserialization("x".into()).is_client_error());
        assert!(Error::Internal("x".into()).is_server_error());
    }
}
