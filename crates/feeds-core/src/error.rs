use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedsError {
    #[error("{0} does not exist")]
    NotExist(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("wrong state: {0}")]
    WrongState(String),

    #[error("not authorized: {0}")]
    NotAuthorized(String),

    #[error("access token expired or invalid")]
    AccessTokenExpired,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl FeedsError {
    pub fn not_exist(what: impl Into<String>) -> Self {
        Self::NotExist(what.into())
    }

    pub fn already_exists(what: impl Into<String>) -> Self {
        Self::AlreadyExists(what.into())
    }

    pub fn wrong_state(what: impl Into<String>) -> Self {
        Self::WrongState(what.into())
    }

    pub fn not_authorized(what: impl Into<String>) -> Self {
        Self::NotAuthorized(what.into())
    }

    /// Stable code reported to peers in error responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotExist(_) => "NOT_EXIST",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::WrongState(_) => "WRONG_STATE",
            Self::NotAuthorized(_) => "NOT_AUTHORIZED",
            Self::AccessTokenExpired => "ACCESS_TOKEN_EXPIRED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, FeedsError>;
