//! Cognito-backed identity for one request.
//!
//! The access token comes from `Authorization: Bearer ..` or the
//! `access_token` cookie. Cognito `GetUser` validates it and supplies the
//! user's attributes; the groups are read from the same token's
//! `cognito:groups` claim once Cognito has accepted it.

use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use gallery_atoms::auth::IdentityProvider;
use gallery_atoms::users::ServerUser;
use gallery_atoms::IdentityError;
use lambda_http::http::header::{AUTHORIZATION, COOKIE};
use lambda_http::http::HeaderMap;
use serde::Deserialize;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

pub struct CognitoIdentity<'a> {
    client: &'a CognitoClient,
    access_token: Option<String>,
}

impl<'a> CognitoIdentity<'a> {
    pub fn new(client: &'a CognitoClient, access_token: Option<String>) -> Self {
        CognitoIdentity {
            client,
            access_token,
        }
    }

    pub fn from_headers(client: &'a CognitoClient, headers: &HeaderMap) -> Self {
        Self::new(client, access_token_from_headers(headers))
    }
}

#[async_trait]
impl IdentityProvider for CognitoIdentity<'_> {
    async fn current_user(&self) -> Result<ServerUser, IdentityError> {
        let token = self
            .access_token
            .as_deref()
            .ok_or(IdentityError::Unauthenticated)?;

        let output = self
            .client
            .get_user()
            .access_token(token)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(se)
                    if se.is_not_authorized_exception()
                        || se.is_user_not_found_exception()
                        || se.is_user_not_confirmed_exception() =>
                {
                    IdentityError::Unauthenticated
                }
                _ => IdentityError::Other(format!("Cognito get_user error: {}", e)),
            })?;

        let attribute = |name: &str| {
            output
                .user_attributes()
                .iter()
                .find(|a| a.name() == name)
                .and_then(|a| a.value())
                .map(|v| v.to_string())
        };

        let username = output.username().to_string();
        let user = ServerUser {
            user_id: attribute("sub").unwrap_or_else(|| username.clone()),
            preferred_username: attribute("preferred_username"),
            groups: token_groups(token),
            username,
        };

        tracing::debug!(user_id = %user.user_id, groups = ?user.groups, "caller resolved");
        Ok(user)
    }
}

/// Bearer token first, then the `access_token` cookie.
pub fn access_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|header| cookie_value(header, ACCESS_TOKEN_COOKIE))
        .map(|t| t.to_string())
}

/// Value of cookie `name` in a `Cookie` header.
pub fn cookie_value<'h>(cookie_header: &'h str, name: &str) -> Option<&'h str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

#[derive(Deserialize)]
struct TokenClaims {
    #[serde(rename = "cognito:groups", default)]
    groups: Vec<String>,
}

/// `cognito:groups` from a JWT payload. Anything unreadable yields no groups.
pub fn token_groups(token: &str) -> Vec<String> {
    token
        .split('.')
        .nth(1)
        .and_then(|payload| URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok())
        .and_then(|bytes| serde_json::from_slice::<TokenClaims>(&bytes).ok())
        .map(|claims| claims.groups)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_http::http::HeaderValue;

    fn jwt(claims: &str) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256"}"#),
            URL_SAFE_NO_PAD.encode(claims)
        )
    }

    #[test]
    fn groups_come_from_token_claims() {
        let token = jwt(r#"{"sub":"u-1","cognito:groups":["Admin","editors"]}"#);
        assert_eq!(token_groups(&token), vec!["Admin", "editors"]);
    }

    #[test]
    fn token_without_groups_has_none() {
        assert!(token_groups(&jwt(r#"{"sub":"u-1"}"#)).is_empty());
        assert!(token_groups("not-a-jwt").is_empty());
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(COOKIE, HeaderValue::from_static("access_token=xyz"));
        assert_eq!(access_token_from_headers(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn cookie_token_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; access_token=xyz; other=1"),
        );
        assert_eq!(access_token_from_headers(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn no_credentials_means_no_token() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("access_token="));
        assert_eq!(access_token_from_headers(&headers), None);
        assert_eq!(access_token_from_headers(&HeaderMap::new()), None);
    }
}
