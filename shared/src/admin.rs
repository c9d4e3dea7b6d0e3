//! User and group administration over the Cognito user pool. Admin only.

use aws_sdk_cognitoidentityprovider::types::{AttributeType, GroupType, UserType};
use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use gallery_atoms::auth::{with_role, IdentityProvider};
use gallery_atoms::users::{GroupMembership, ManagedUser, ServerUser, UserGroup, ADMIN_ROLE};
use gallery_atoms::{ActionError, ActionResponse};

/// GET /admin/users
pub async fn list_users<I>(
    identity: &I,
    cognito: &CognitoClient,
    user_pool_id: &str,
) -> ActionResponse<Vec<ManagedUser>>
where
    I: IdentityProvider + ?Sized,
{
    with_role(identity, ADMIN_ROLE, |_| async move {
        let mut users = Vec::new();
        let mut pagination_token: Option<String> = None;

        loop {
            let output = cognito
                .list_users()
                .user_pool_id(user_pool_id)
                .set_pagination_token(pagination_token.take())
                .send()
                .await
                .map_err(|e| ActionError::Unknown(format!("Cognito list_users error: {}", e)))?;

            users.extend(output.users().iter().map(managed_user));

            match output.pagination_token() {
                Some(next) => pagination_token = Some(next.to_string()),
                None => break,
            }
        }

        Ok(users)
    })
    .await
}

/// GET /admin/groups
pub async fn list_groups<I>(
    identity: &I,
    cognito: &CognitoClient,
    user_pool_id: &str,
) -> ActionResponse<Vec<UserGroup>>
where
    I: IdentityProvider + ?Sized,
{
    with_role(identity, ADMIN_ROLE, |_| async move {
        let mut groups = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = cognito
                .list_groups()
                .user_pool_id(user_pool_id)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| ActionError::Unknown(format!("Cognito list_groups error: {}", e)))?;

            groups.extend(output.groups().iter().filter_map(user_group));

            match output.next_token() {
                Some(next) => next_token = Some(next.to_string()),
                None => break,
            }
        }

        Ok(groups)
    })
    .await
}

/// POST /admin/users/{username}/groups/{group}
pub async fn add_user_to_group<I>(
    identity: &I,
    cognito: &CognitoClient,
    user_pool_id: &str,
    username: &str,
    group_name: &str,
) -> ActionResponse<GroupMembership>
where
    I: IdentityProvider + ?Sized,
{
    with_role(identity, ADMIN_ROLE, |admin| async move {
        check_membership_change(&admin, username, group_name, true)?;

        cognito
            .admin_add_user_to_group()
            .user_pool_id(user_pool_id)
            .username(username)
            .group_name(group_name)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(se) if se.is_user_not_found_exception() => {
                    ActionError::NotFound("User not found".to_string())
                }
                Some(se) if se.is_resource_not_found_exception() => {
                    ActionError::NotFound("Group not found".to_string())
                }
                _ => ActionError::Unknown(format!("Cognito admin_add_user_to_group error: {}", e)),
            })?;

        tracing::info!(admin = %admin.user_id, username, group_name, "user added to group");
        Ok(GroupMembership {
            username: username.to_string(),
            group_name: group_name.to_string(),
            member: true,
        })
    })
    .await
}

/// DELETE /admin/users/{username}/groups/{group}
pub async fn remove_user_from_group<I>(
    identity: &I,
    cognito: &CognitoClient,
    user_pool_id: &str,
    username: &str,
    group_name: &str,
) -> ActionResponse<GroupMembership>
where
    I: IdentityProvider + ?Sized,
{
    with_role(identity, ADMIN_ROLE, |admin| async move {
        check_membership_change(&admin, username, group_name, false)?;

        cognito
            .admin_remove_user_from_group()
            .user_pool_id(user_pool_id)
            .username(username)
            .group_name(group_name)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(se) if se.is_user_not_found_exception() => {
                    ActionError::NotFound("User not found".to_string())
                }
                Some(se) if se.is_resource_not_found_exception() => {
                    ActionError::NotFound("Group not found".to_string())
                }
                _ => ActionError::Unknown(format!(
                    "Cognito admin_remove_user_from_group error: {}",
                    e
                )),
            })?;

        tracing::info!(admin = %admin.user_id, username, group_name, "user removed from group");
        Ok(GroupMembership {
            username: username.to_string(),
            group_name: group_name.to_string(),
            member: false,
        })
    })
    .await
}

/// Reject empty names, and an admin dropping their own admin membership.
fn check_membership_change(
    admin: &ServerUser,
    username: &str,
    group_name: &str,
    adding: bool,
) -> Result<(), ActionError> {
    if username.trim().is_empty() {
        return Err(ActionError::Validation("Username is required".to_string()));
    }
    if group_name.trim().is_empty() || group_name.len() > 128 {
        return Err(ActionError::Validation("Invalid group name".to_string()));
    }
    if !adding && username == admin.username && group_name.eq_ignore_ascii_case(ADMIN_ROLE) {
        return Err(ActionError::Validation(
            "You cannot remove your own admin access".to_string(),
        ));
    }
    Ok(())
}

fn attribute<'u>(attributes: &'u [AttributeType], name: &str) -> Option<&'u str> {
    attributes
        .iter()
        .find(|a| a.name() == name)
        .and_then(|a| a.value())
}

fn managed_user(user: &UserType) -> ManagedUser {
    ManagedUser {
        username: user.username().unwrap_or_default().to_string(),
        email: attribute(user.attributes(), "email").map(str::to_string),
        preferred_username: attribute(user.attributes(), "preferred_username").map(str::to_string),
        enabled: user.enabled(),
        status: user.user_status().map(|s| s.as_str().to_string()),
        created_at: user
            .user_create_date()
            .and_then(|d| chrono::DateTime::from_timestamp(d.secs(), 0))
            .map(|d| d.to_rfc3339()),
    }
}

fn user_group(group: &GroupType) -> Option<UserGroup> {
    Some(UserGroup {
        group_name: group.group_name()?.to_string(),
        description: group.description().map(str::to_string),
    })
}
