use serde::Serialize;

use crate::error::ActionError;

/// What went wrong in an `error` response. Not part of the wire shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Persistence,
    #[default]
    Unknown,
}

/// Why an `unauthorized` response was produced. Not part of the wire shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Denial {
    #[default]
    Unauthenticated,
    Forbidden,
}

/// Uniform result of every gallery action.
///
/// Serializes as `{"status":"success","data":..}`, `{"status":"error","error":..}`
/// or `{"status":"unauthorized","error":..,"requiresAuth":true}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ActionResponse<T> {
    Success {
        data: T,
    },
    Error {
        error: String,
        #[serde(skip)]
        kind: ErrorKind,
    },
    Unauthorized {
        error: String,
        #[serde(rename = "requiresAuth")]
        requires_auth: bool,
        #[serde(skip)]
        denial: Denial,
    },
}

pub const AUTHENTICATION_REQUIRED: &str = "Authentication required";

impl<T> ActionResponse<T> {
    pub fn success(data: T) -> Self {
        ActionResponse::Success { data }
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        ActionResponse::Error {
            error: message.into(),
            kind,
        }
    }

    pub fn unauthenticated() -> Self {
        ActionResponse::Unauthorized {
            error: AUTHENTICATION_REQUIRED.to_string(),
            requires_auth: true,
            denial: Denial::Unauthenticated,
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ActionResponse::Unauthorized {
            error: message.into(),
            requires_auth: true,
            denial: Denial::Forbidden,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ActionResponse::Success { .. })
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            ActionResponse::Success { data } => Some(data),
            _ => None,
        }
    }

    /// Message of a non-success response.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            ActionResponse::Success { .. } => None,
            ActionResponse::Error { error, .. } | ActionResponse::Unauthorized { error, .. } => {
                Some(error)
            }
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ActionResponse<U> {
        match self {
            ActionResponse::Success { data } => ActionResponse::Success { data: f(data) },
            ActionResponse::Error { error, kind } => ActionResponse::Error { error, kind },
            ActionResponse::Unauthorized {
                error,
                requires_auth,
                denial,
            } => ActionResponse::Unauthorized {
                error,
                requires_auth,
                denial,
            },
        }
    }
}

impl<T> From<ActionError> for ActionResponse<T> {
    fn from(e: ActionError) -> Self {
        match e {
            ActionError::Unauthenticated => ActionResponse::unauthenticated(),
            ActionError::Forbidden(msg) => ActionResponse::forbidden(msg),
            ActionError::NotFound(msg) => ActionResponse::error(ErrorKind::NotFound, msg),
            ActionError::Validation(msg) => ActionResponse::error(ErrorKind::Validation, msg),
            ActionError::Persistence(msg) => ActionResponse::error(ErrorKind::Persistence, msg),
            ActionError::Unknown(msg) => ActionResponse::error(ErrorKind::Unknown, msg),
        }
    }
}

impl<T> From<Result<T, ActionError>> for ActionResponse<T> {
    fn from(result: Result<T, ActionError>) -> Self {
        match result {
            Ok(data) => ActionResponse::success(data),
            Err(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_serializes_with_status_tag() {
        let resp = ActionResponse::success(json!({"likeCount": 2}));
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({"status": "success", "data": {"likeCount": 2}})
        );
    }

    #[test]
    fn unauthorized_carries_requires_auth() {
        let resp: ActionResponse<()> = ActionError::Unauthenticated.into();
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({
                "status": "unauthorized",
                "error": "Authentication required",
                "requiresAuth": true
            })
        );
    }

    #[test]
    fn error_kind_is_not_serialized() {
        let resp: ActionResponse<()> = ActionError::NotFound("Photo not found".into()).into();
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({"status": "error", "error": "Photo not found"})
        );
        assert!(matches!(
            resp,
            ActionResponse::Error {
                kind: ErrorKind::NotFound,
                ..
            }
        ));
    }

    #[test]
    fn map_keeps_failures() {
        let resp: ActionResponse<u32> = ActionResponse::forbidden("Admin access required");
        let mapped = resp.map(|n| n + 1);
        assert_eq!(mapped.error_message(), Some("Admin access required"));
        assert!(!mapped.is_success());
    }
}
