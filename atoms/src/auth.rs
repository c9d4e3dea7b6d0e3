//! Request-scoped authorization wrapper.
//!
//! Every gallery action runs through [`with_auth`] or [`with_role`]. Both resolve
//! the caller through an [`IdentityProvider`] and fold every outcome, including
//! handler failures, into an [`ActionResponse`]. Neither returns `Err` nor panics.

use std::future::Future;

use async_trait::async_trait;

use crate::action::ActionResponse;
use crate::error::{ActionError, IdentityError};
use crate::users::ServerUser;

/// Resolves the caller of the current request.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self) -> Result<ServerUser, IdentityError>;
}

/// Run `handler` for an authenticated caller.
pub async fn with_auth<I, F, Fut, T>(identity: &I, handler: F) -> ActionResponse<T>
where
    I: IdentityProvider + ?Sized,
    F: FnOnce(ServerUser) -> Fut,
    Fut: Future<Output = Result<T, ActionError>>,
{
    let user = match resolve(identity).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    handler(user).await.into()
}

/// Run `handler` for an authenticated caller who belongs to `role`.
/// The handler is never invoked for a caller outside the role.
pub async fn with_role<I, F, Fut, T>(identity: &I, role: &str, handler: F) -> ActionResponse<T>
where
    I: IdentityProvider + ?Sized,
    F: FnOnce(ServerUser) -> Fut,
    Fut: Future<Output = Result<T, ActionError>>,
{
    let user = match resolve(identity).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };

    if !user.has_role(role) {
        tracing::warn!(user_id = %user.user_id, role, "role check failed");
        return ActionResponse::forbidden(role_required_message(role));
    }

    handler(user).await.into()
}

async fn resolve<I, T>(identity: &I) -> Result<ServerUser, ActionResponse<T>>
where
    I: IdentityProvider + ?Sized,
{
    identity.current_user().await.map_err(|e| {
        match &e {
            IdentityError::Other(msg) => tracing::error!("identity lookup failed: {}", msg),
            _ => tracing::info!("request rejected: {}", e),
        }
        ActionError::from(e).into()
    })
}

/// "admin" -> "Admin access required"
pub fn role_required_message(role: &str) -> String {
    let mut chars = role.chars();
    match chars.next() {
        Some(first) => format!("{}{} access required", first.to_uppercase(), chars.as_str()),
        None => "Access denied".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Denial, ErrorKind};
    use crate::testing::StaticIdentity;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn with_auth_without_identity_never_runs_handler() {
        let identity = StaticIdentity::anonymous();
        let called = AtomicBool::new(false);

        let resp: ActionResponse<()> = with_auth(&identity, |_| async {
            called.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await;

        assert!(!called.load(Ordering::SeqCst));
        assert!(matches!(
            resp,
            ActionResponse::Unauthorized {
                denial: Denial::Unauthenticated,
                requires_auth: true,
                ..
            }
        ));
        assert_eq!(resp.error_message(), Some("Authentication required"));
    }

    #[tokio::test]
    async fn with_auth_passes_user_and_result_through() {
        let identity = StaticIdentity::user("u-1", &[]);
        let resp = with_auth(&identity, |user| async move { Ok(user.user_id) }).await;
        assert_eq!(resp, ActionResponse::success("u-1".to_string()));
    }

    #[tokio::test]
    async fn with_auth_maps_handler_errors() {
        let identity = StaticIdentity::user("u-1", &[]);
        let resp: ActionResponse<()> = with_auth(&identity, |_| async {
            Err(ActionError::NotFound("Photo not found".into()))
        })
        .await;
        assert!(matches!(
            resp,
            ActionResponse::Error {
                kind: ErrorKind::NotFound,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn identity_backend_failure_is_a_generic_error() {
        let identity = StaticIdentity::failing(IdentityError::Other("timeout".into()));
        let resp: ActionResponse<()> = with_auth(&identity, |_| async { Ok(()) }).await;
        assert!(matches!(
            resp,
            ActionResponse::Error {
                kind: ErrorKind::Unknown,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn with_role_rejects_non_admin_without_running_handler() {
        let identity = StaticIdentity::user("u-1", &["editors"]);
        let called = AtomicBool::new(false);

        let resp: ActionResponse<()> = with_role(&identity, "admin", |_| async {
            called.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await;

        assert!(!called.load(Ordering::SeqCst));
        assert!(matches!(
            resp,
            ActionResponse::Unauthorized {
                denial: Denial::Forbidden,
                ..
            }
        ));
        assert_eq!(resp.error_message(), Some("Admin access required"));
    }

    #[tokio::test]
    async fn with_role_accepts_mixed_case_group() {
        let identity = StaticIdentity::user("u-1", &["Admin"]);
        let resp = with_role(&identity, "admin", |_| async { Ok(7) }).await;
        assert_eq!(resp, ActionResponse::success(7));
    }

    #[tokio::test]
    async fn with_role_without_identity_is_unauthenticated() {
        let identity = StaticIdentity::anonymous();
        let resp: ActionResponse<()> = with_role(&identity, "admin", |_| async { Ok(()) }).await;
        assert!(matches!(
            resp,
            ActionResponse::Unauthorized {
                denial: Denial::Unauthenticated,
                ..
            }
        ));
    }

    #[test]
    fn role_message_capitalizes() {
        assert_eq!(role_required_message("admin"), "Admin access required");
        assert_eq!(role_required_message("editor"), "Editor access required");
        assert_eq!(role_required_message(""), "Access denied");
    }
}
