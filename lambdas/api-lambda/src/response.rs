use gallery_atoms::action::{Denial, ErrorKind};
use gallery_atoms::ActionResponse;
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Serialize;

/// HTTP status for an action outcome. `success` is used for the success case.
pub(crate) fn status_for<T>(resp: &ActionResponse<T>, success: StatusCode) -> StatusCode {
    match resp {
        ActionResponse::Success { .. } => success,
        ActionResponse::Unauthorized {
            denial: Denial::Unauthenticated,
            ..
        } => StatusCode::UNAUTHORIZED,
        ActionResponse::Unauthorized {
            denial: Denial::Forbidden,
            ..
        } => StatusCode::FORBIDDEN,
        ActionResponse::Error { kind, .. } => match kind {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Persistence | ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

pub(crate) fn action_response<T: Serialize>(
    resp: ActionResponse<T>,
) -> Result<Response<Body>, Error> {
    action_response_with(resp, StatusCode::OK)
}

pub(crate) fn created_response<T: Serialize>(
    resp: ActionResponse<T>,
) -> Result<Response<Body>, Error> {
    action_response_with(resp, StatusCode::CREATED)
}

fn action_response_with<T: Serialize>(
    resp: ActionResponse<T>,
    success: StatusCode,
) -> Result<Response<Body>, Error> {
    let status = status_for(&resp, success);
    if status.is_server_error() {
        tracing::error!(
            status = status.as_u16(),
            "action failed: {}",
            resp.error_message().unwrap_or_default()
        );
    }

    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(serde_json::to_string(&resp)?.into())
        .map_err(Box::new)?)
}

pub(crate) fn method_not_allowed() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("Content-Type", "application/json")
        .body(
            serde_json::json!({"error": "Method not allowed"})
                .to_string()
                .into(),
        )
        .map_err(Box::new)?)
}

pub(crate) fn not_found() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .body(serde_json::json!({"error": "Not found"}).to_string().into())
        .map_err(Box::new)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gallery_atoms::ActionError;

    fn status(err: ActionError) -> StatusCode {
        let resp: ActionResponse<()> = err.into();
        status_for(&resp, StatusCode::OK)
    }

    #[test]
    fn failures_map_to_http_statuses() {
        let cases = [
            (ActionError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (ActionError::Forbidden("Admin access required".into()), StatusCode::FORBIDDEN),
            (ActionError::NotFound("Photo not found".into()), StatusCode::NOT_FOUND),
            (ActionError::Validation("Title is required".into()), StatusCode::BAD_REQUEST),
            (ActionError::Persistence("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ActionError::Unknown("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(status(err), expected);
        }
    }

    #[test]
    fn created_uses_201_and_keeps_envelope() {
        let resp =
            created_response(ActionResponse::success(serde_json::json!({"id": "p1"}))).unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: serde_json::Value = match resp.body() {
            Body::Text(text) => serde_json::from_str(text).unwrap(),
            other => panic!("unexpected body {:?}", other),
        };
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["id"], "p1");
    }
}
