use std::borrow::Cow;
use std::sync::Arc;

use gallery_atoms::auth::IdentityProvider;
use gallery_atoms::comments::CreateCommentPayload;
use gallery_atoms::photos::{CreatePhotoPayload, UpdatePhotoPayload};
use gallery_atoms::{ActionError, ActionResponse};
use gallery_block::{account, comments, photos};
use gallery_shared::auth::CognitoIdentity;
use gallery_shared::config::Config;
use gallery_shared::{admin, contact, AppState};
use lambda_http::http::header::{HeaderValue, VARY};
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, Response,
};
use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;

use crate::response::{action_response, created_response, method_not_allowed, not_found};

/// A matched API route with its percent-decoded path parameters.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Route<'a> {
    Contact,
    Me,
    ListPhotos,
    CreatePhoto,
    GetPhoto(Cow<'a, str>),
    UpdatePhoto(Cow<'a, str>),
    DeletePhoto(Cow<'a, str>),
    ToggleLike(Cow<'a, str>),
    ListComments(Cow<'a, str>),
    AddComment(Cow<'a, str>),
    DeleteComment(Cow<'a, str>, Cow<'a, str>),
    ListUsers,
    ListGroups,
    AddUserToGroup(Cow<'a, str>, Cow<'a, str>),
    RemoveUserFromGroup(Cow<'a, str>, Cow<'a, str>),
    RecountCounts,
    MethodNotAllowed,
    NotFound,
}

/// Decode one raw path segment, e.g. `bob%40example.com` to `bob@example.com`.
fn segment(raw: &str) -> Cow<'_, str> {
    percent_decode_str(raw).decode_utf8_lossy()
}

pub(crate) fn parse_route<'a>(method: &Method, path: &'a str) -> Route<'a> {
    let parts: Vec<&'a str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (method, parts.as_slice()) {
        (&Method::POST, ["contact"]) => Route::Contact,
        (&Method::GET, ["me"]) => Route::Me,

        // --- PHOTOS ---
        (&Method::GET, ["photos"]) => Route::ListPhotos,
        (&Method::POST, ["photos"]) => Route::CreatePhoto,
        (&Method::GET, ["photos", photo_id]) => Route::GetPhoto(segment(*photo_id)),
        (&Method::PATCH, ["photos", photo_id]) => Route::UpdatePhoto(segment(*photo_id)),
        (&Method::DELETE, ["photos", photo_id]) => Route::DeletePhoto(segment(*photo_id)),
        (&Method::POST, ["photos", photo_id, "like"]) => Route::ToggleLike(segment(*photo_id)),

        // --- COMMENTS ---
        (&Method::GET, ["photos", photo_id, "comments"]) => {
            Route::ListComments(segment(*photo_id))
        }
        (&Method::POST, ["photos", photo_id, "comments"]) => Route::AddComment(segment(*photo_id)),
        (&Method::DELETE, ["photos", photo_id, "comments", comment_id]) => {
            Route::DeleteComment(segment(*photo_id), segment(*comment_id))
        }

        // --- ADMIN ---
        (&Method::GET, ["admin", "users"]) => Route::ListUsers,
        (&Method::GET, ["admin", "groups"]) => Route::ListGroups,
        (&Method::POST, ["admin", "users", username, "groups", group]) => {
            Route::AddUserToGroup(segment(*username), segment(*group))
        }
        (&Method::DELETE, ["admin", "users", username, "groups", group]) => {
            Route::RemoveUserFromGroup(segment(*username), segment(*group))
        }
        (&Method::POST, ["admin", "migrations", "recount"]) => Route::RecountCounts,

        (_, ["contact"])
        | (_, ["me"])
        | (_, ["photos"])
        | (_, ["photos", _])
        | (_, ["photos", _, "like"])
        | (_, ["photos", _, "comments"])
        | (_, ["photos", _, "comments", _])
        | (_, ["admin", "users"])
        | (_, ["admin", "groups"])
        | (_, ["admin", "users", _, "groups", _])
        | (_, ["admin", "migrations", "recount"]) => Route::MethodNotAllowed,

        _ => Route::NotFound,
    }
}

fn with_cors_headers(
    mut resp: Response<Body>,
    config: &Config,
    request_origin: Option<&str>,
) -> Response<Body> {
    let cors_origin = config.cors_origin(request_origin);

    let headers = resp.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_str(&cors_origin).unwrap_or_else(|_| HeaderValue::from_static("null")),
    );
    headers.insert("Access-Control-Allow-Credentials", HeaderValue::from_static("true"));
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,PATCH,DELETE,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type,Authorization,Cookie"),
    );
    headers.append(VARY, HeaderValue::from_static("Origin"));

    resp
}

/// Main Lambda handler - resolves the route and runs the matching action
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    let request_origin = event.headers().get("Origin").and_then(|v| v.to_str().ok());
    tracing::info!("Gallery API invoked - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if method == &Method::OPTIONS {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp, &state.config, request_origin));
    }

    let route = parse_route(method, path);
    if matches!(route, Route::NotFound) {
        tracing::warn!("No route matched - Method: {} Path: {}", method, path);
    }

    // Built per request; only resolved by actions that need a caller.
    let identity = CognitoIdentity::from_headers(&state.cognito_client, event.headers());

    let resp = dispatch(route, &state, &identity, event.body()).await;
    resp.map(|r| with_cors_headers(r, &state.config, request_origin))
}

async fn dispatch<I>(
    route: Route<'_>,
    state: &AppState,
    identity: &I,
    body: &[u8],
) -> Result<Response<Body>, Error>
where
    I: IdentityProvider + ?Sized,
{
    let store = &state.store;
    let media = &state.media;
    let cognito = &state.cognito_client;
    let user_pool_id = state.config.user_pool_id.as_str();

    match route {
        Route::Contact => {
            action_response(contact::submit_contact(&state.ses_client, &state.config, body).await)
        }
        Route::Me => action_response(account::current_user(identity).await),

        Route::ListPhotos => action_response(photos::get_all_photos(identity, store, media).await),
        Route::CreatePhoto => match parse_body::<CreatePhotoPayload>(body) {
            Ok(payload) => {
                created_response(photos::create_photo(identity, store, media, payload).await)
            }
            Err(e) => action_response(ActionResponse::<()>::from(e)),
        },
        Route::GetPhoto(photo_id) => {
            action_response(photos::get_photo_by_id(identity, store, media, &photo_id).await)
        }
        Route::UpdatePhoto(photo_id) => match parse_body::<UpdatePhotoPayload>(body) {
            Ok(payload) => {
                action_response(photos::update_photo(identity, store, &photo_id, payload).await)
            }
            Err(e) => action_response(ActionResponse::<()>::from(e)),
        },
        Route::DeletePhoto(photo_id) => {
            action_response(photos::delete_photo(identity, store, media, &photo_id).await)
        }
        Route::ToggleLike(photo_id) => {
            action_response(photos::toggle_photo_like(identity, store, &photo_id).await)
        }

        Route::ListComments(photo_id) => {
            action_response(comments::list_photo_comments(identity, store, &photo_id).await)
        }
        Route::AddComment(photo_id) => match parse_body::<CreateCommentPayload>(body) {
            Ok(payload) => created_response(
                comments::add_photo_comment(identity, store, &photo_id, payload).await,
            ),
            Err(e) => action_response(ActionResponse::<()>::from(e)),
        },
        Route::DeleteComment(photo_id, comment_id) => action_response(
            comments::delete_photo_comment(identity, store, &photo_id, &comment_id).await,
        ),

        Route::ListUsers => {
            action_response(admin::list_users(identity, cognito, user_pool_id).await)
        }
        Route::ListGroups => {
            action_response(admin::list_groups(identity, cognito, user_pool_id).await)
        }
        Route::AddUserToGroup(username, group) => action_response(
            admin::add_user_to_group(identity, cognito, user_pool_id, &username, &group).await,
        ),
        Route::RemoveUserFromGroup(username, group) => action_response(
            admin::remove_user_from_group(identity, cognito, user_pool_id, &username, &group).await,
        ),
        Route::RecountCounts => action_response(photos::recount_all_photos(identity, store).await),

        Route::MethodNotAllowed => method_not_allowed(),
        Route::NotFound => not_found(),
    }
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ActionError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::error!("Failed to parse request body: {}", e);
        ActionError::Validation(format!("Invalid request body: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config() -> Config {
        let vars = HashMap::from([
            ("COGNITO_USER_POOL_ID", "pool"),
            ("ALLOWED_ORIGINS", "https://gallery.example.com"),
        ]);
        Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
    }

    #[test]
    fn photo_routes_resolve() {
        assert_eq!(parse_route(&Method::GET, "/photos"), Route::ListPhotos);
        assert_eq!(parse_route(&Method::GET, "/photos/p1/"), Route::GetPhoto("p1".into()));
        assert_eq!(parse_route(&Method::POST, "/photos/p1/like"), Route::ToggleLike("p1".into()));
        assert_eq!(
            parse_route(&Method::DELETE, "/photos/p1/comments/c9"),
            Route::DeleteComment("p1".into(), "c9".into())
        );
    }

    #[test]
    fn admin_routes_resolve() {
        assert_eq!(
            parse_route(&Method::POST, "/admin/users/bob/groups/admin"),
            Route::AddUserToGroup("bob".into(), "admin".into())
        );
        assert_eq!(
            parse_route(&Method::POST, "/admin/migrations/recount"),
            Route::RecountCounts
        );
    }

    #[test]
    fn path_segments_are_percent_decoded() {
        assert_eq!(
            parse_route(&Method::POST, "/admin/users/bob%40example.com/groups/photo%20editors"),
            Route::AddUserToGroup("bob@example.com".into(), "photo editors".into())
        );
        assert_eq!(
            parse_route(&Method::DELETE, "/admin/users/bob%40example.com/groups/admin"),
            Route::RemoveUserFromGroup("bob@example.com".into(), "admin".into())
        );
        assert_eq!(parse_route(&Method::GET, "/photos/p%2D1"), Route::GetPhoto("p-1".into()));
    }

    #[test]
    fn wrong_method_and_unknown_path() {
        assert_eq!(parse_route(&Method::PUT, "/photos/p1"), Route::MethodNotAllowed);
        assert_eq!(parse_route(&Method::GET, "/contact"), Route::MethodNotAllowed);
        assert_eq!(parse_route(&Method::GET, "/albums"), Route::NotFound);
    }

    #[test]
    fn bad_body_is_validation_error() {
        let err = parse_body::<CreatePhotoPayload>(b"{not json").unwrap_err();
        assert!(matches!(err, ActionError::Validation(_)));
    }

    #[test]
    fn cors_headers_echo_allowed_origin() {
        let resp = Response::builder().body(Body::Empty).unwrap();
        let resp = with_cors_headers(resp, &config(), Some("https://gallery.example.com"));
        assert_eq!(
            resp.headers()["Access-Control-Allow-Origin"],
            "https://gallery.example.com"
        );
        assert_eq!(resp.headers()["Access-Control-Allow-Credentials"], "true");
    }
}
