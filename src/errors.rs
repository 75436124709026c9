/// Crate-wide result type
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown to guests when anything went wrong on our side
pub const INTERNAL_ERROR_MESSAGE: &str = "Внутренняя ошибка сервера";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input the client can fix and send again
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// Stale or missing link signature
    #[error("Ссылка недействительна или устарела")]
    LinkExpired,

    #[error("Connection reset by peer")]
    ConnectionReset,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed HTTP message: {0}")]
    Http(#[from] httparse::Error),

    #[error("invalid route: {0}")]
    Route(#[from] matchit::InsertError),

    /// A stored record could not be turned back into its API type
    #[error("corrupted record: {0}")]
    Corrupted(String),
}

impl Error {
    /// HTTP status code to answer with when this error reaches a handler boundary
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) | Error::LinkExpired => 400,
            Error::NotFound(_) => 404,
            _ => 500,
        }
    }

    /// Message safe to show to the guest.
    ///
    /// Internal failures are collapsed into a generic message, their detail only goes to the logs.
    pub fn public_message(&self) -> String {
        match self {
            Error::Validation(_) | Error::NotFound(_) | Error::LinkExpired => self.to_string(),
            _ => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::Validation("x".to_string()).status_code(), 400);
        assert_eq!(Error::LinkExpired.status_code(), 400);
        assert_eq!(Error::NotFound("x".to_string()).status_code(), 404);
        assert_eq!(Error::Corrupted("x".to_string()).status_code(), 500);
        assert!(Error::ConnectionReset.is_internal());
        assert!(!Error::LinkExpired.is_internal());
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = Error::Corrupted("bad rating column".to_string());
        assert_eq!(err.public_message(), INTERNAL_ERROR_MESSAGE);

        let err = Error::Validation("Некорректные данные".to_string());
        assert_eq!(err.public_message(), "Некорректные данные");
    }
}
