use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

use super::error::{error_response, ErrorKind};

/// Answer 408 with an [`ErrorBody`](super::ErrorBody) once a request has run
///  for longer than `limit`. The handler future is dropped at that point.
pub async fn middleware(State(limit): State<Duration>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(%path, ?limit, "request timed out");
            error_response(
                StatusCode::REQUEST_TIMEOUT,
                ErrorKind::Timeout,
                format!("request did not complete within {:?}", limit),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::http::ErrorBody;

    fn app(limit: Duration) -> Router {
        Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "done"
                }),
            )
            .route("/fast", get(|| async { "done" }))
            .layer(axum::middleware::from_fn_with_state(limit, middleware))
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_request_gets_error_body() {
        let request = Request::get("/slow").body(Body::empty()).unwrap();
        let response = app(Duration::from_secs(1)).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.kind, ErrorKind::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_request_passes_through() {
        let request = Request::get("/fast").body(Body::empty()).unwrap();
        let response = app(Duration::from_secs(1)).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
