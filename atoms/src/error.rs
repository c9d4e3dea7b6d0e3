use thiserror::Error;

/// Failure of a gallery action, before it is folded into an `ActionResponse`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Persistence(String),

    #[error("{0}")]
    Unknown(String),
}

/// Failure reported by a storage collaborator (DynamoDB, S3 or the in-memory fakes).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A row with the same key already exists.
    #[error("item already exists")]
    Conflict,

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("malformed item: {0}")]
    Malformed(String),
}

/// Failure reported by the identity collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("identity lookup failed: {0}")]
    Other(String),
}

impl From<StoreError> for ActionError {
    fn from(e: StoreError) -> Self {
        ActionError::Persistence(e.to_string())
    }
}

impl From<IdentityError> for ActionError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::Unauthenticated => ActionError::Unauthenticated,
            IdentityError::Forbidden(msg) => ActionError::Forbidden(msg),
            IdentityError::Other(msg) => ActionError::Unknown(msg),
        }
    }
}
