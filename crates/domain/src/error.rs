use crate::account::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModDbError {
    #[error("could not find mod {0}")]
    ModNotFound(String),

    #[error("request rejected: {0}")]
    Account(ErrorCode),

    #[error("non-success status code returned from legacy moddb API: {0}")]
    LegacyStatus(String),

    #[error("legacy api mode is enabled")]
    LegacyModeEnabled,

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,
}

impl ModDbError {
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Account(code) => Some(*code),
            Self::LegacyModeEnabled => Some(ErrorCode::LegacyApiModeEnabled),
            _ => None,
        }
    }
}

impl From<ErrorCode> for ModDbError {
    fn from(code: ErrorCode) -> Self {
        ModDbError::Account(code)
    }
}
