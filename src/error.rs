use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Message suitable for direct display, without the category prefix.
    /// Auth and validation messages are localized (Italian) to match what
    /// the backend and the forms produce.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Auth(e) => e.to_string(),
            AppError::Transport(e) => e.to_string(),
            AppError::Validation(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}

// Implement conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

// Transport failures from the HTTP client map to the generic unreachable case;
// call sites that need a user-facing message attach their own.
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(TransportError::Unreachable(err.to_string()))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(StorageError::Io(err))
    }
}

/// Rejections of auth operations. Never retried automatically; the message is
/// what the user sees.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    Rejected(String),

    #[error("Nessuna sessione attiva")]
    NotAuthenticated,
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("{0}")]
    Unreachable(String),

    #[error("{0}")]
    InvalidResponse(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
}

/// Client-side form checks. These block submission before any network call,
/// so their display strings are the exact user-facing (Italian) messages.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Tutti i campi sono obbligatori")]
    MissingFields,

    #[error("Inserisci un indirizzo email valido")]
    InvalidEmail,

    #[error("La password deve essere di almeno 6 caratteri")]
    PasswordTooShort,

    #[error("La nuova password deve essere di almeno 6 caratteri")]
    NewPasswordTooShort,

    #[error("Le password non corrispondono")]
    PasswordMismatch,

    #[error("La nuova password deve essere diversa da quella attuale")]
    PasswordUnchanged,

    #[error("ResourceIds è obbligatorio (1=mobile, 2=onlog)")]
    MissingResources,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Storage(StorageError::Io(_))));

        let config_err = config::ConfigError::NotFound(String::from("key not found"));
        let app_err: AppError = config_err.into();
        assert!(matches!(app_err, AppError::Config(_)));

        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let storage_err: StorageError = json_err.into();
        assert!(matches!(storage_err, StorageError::Serde(_)));
    }

    #[test]
    fn test_error_display() {
        let err = AppError::Auth(AuthError::Rejected(
            "Nome utente o password non corretti".to_string(),
        ));
        assert_eq!(
            err.to_string(),
            "Authentication error: Nome utente o password non corretti"
        );
        assert_eq!(err.user_message(), "Nome utente o password non corretti");

        let err = AppError::Validation(ValidationError::PasswordMismatch);
        assert_eq!(err.user_message(), "Le password non corrispondono");

        let err = AppError::Auth(AuthError::NotAuthenticated);
        assert_eq!(err.user_message(), "Nessuna sessione attiva");
    }

    #[test]
    fn test_validation_messages_are_localized() {
        assert_eq!(
            ValidationError::MissingFields.to_string(),
            "Tutti i campi sono obbligatori"
        );
        assert_eq!(
            ValidationError::InvalidEmail.to_string(),
            "Inserisci un indirizzo email valido"
        );
        assert_eq!(
            ValidationError::NewPasswordTooShort.to_string(),
            "La nuova password deve essere di almeno 6 caratteri"
        );
        assert_eq!(
            ValidationError::PasswordUnchanged.to_string(),
            "La nuova password deve essere diversa da quella attuale"
        );
    }
}
