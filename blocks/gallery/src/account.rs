use gallery_atoms::auth::{with_auth, IdentityProvider};
use gallery_atoms::users::ServerUser;
use gallery_atoms::ActionResponse;

/// GET /me
pub async fn current_user<I>(identity: &I) -> ActionResponse<ServerUser>
where
    I: IdentityProvider + ?Sized,
{
    with_auth(identity, |user| async move { Ok(user) }).await
}
