//! Single-slot request and response hooks.
//!
//! Exactly one hook of each kind is retained per client; a later
//! registration replaces an earlier one. There is no middleware chain.

use crate::error::{BoxError, HttpError, HttpResult};
use crate::request::RequestOptions;
use crate::response::Response;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Rewrites the composed descriptor before the transfer starts. May suspend.
pub type BeforeRequestHook =
    Arc<dyn Fn(RequestOptions) -> BoxFuture<'static, Result<RequestOptions, BoxError>> + Send + Sync>;

/// Transforms the completed response before delivery to the caller.
pub type ResponseHook = Arc<dyn Fn(Response) -> Result<Response, BoxError> + Send + Sync>;

/// Apply the pre-request hook. A failure rejects the whole operation before
/// any network transfer is attempted.
pub(crate) async fn run_before(
    hook: Option<&BeforeRequestHook>,
    options: RequestOptions,
) -> HttpResult<RequestOptions> {
    match hook {
        Some(hook) => hook(options).await.map_err(HttpError::RequestHook),
        None => Ok(options),
    }
}

/// Apply the post-response hook. On failure the error is attached to the
/// response and the operation rejects with that response, keeping status and
/// header context for the caller.
pub(crate) fn run_response(
    hook: Option<&ResponseHook>,
    response: Response,
) -> HttpResult<Response> {
    match hook {
        Some(hook) => match hook(response.clone()) {
            Ok(transformed) => Ok(transformed),
            Err(error) => {
                let mut response = response;
                response.error = Some(error.to_string());
                Err(HttpError::ResponseHook(Box::new(response)))
            }
        },
        None => Ok(response),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::CallOptions;
    use std::collections::HashMap;

    fn options() -> RequestOptions {
        CallOptions::new().into_options()
    }

    fn response(status: u16) -> Response {
        Response::new(status, HashMap::new(), Vec::new(), options())
    }

    #[tokio::test]
    async fn test_run_before_passthrough_without_hook() {
        let out = run_before(None, options()).await.unwrap();
        assert_eq!(out.url, "");
    }

    #[tokio::test]
    async fn test_run_before_rewrites_options() {
        let hook: BeforeRequestHook = Arc::new(|mut options| {
            Box::pin(async move {
                options.url = "/rewritten".to_string();
                Ok(options)
            })
        });
        let out = run_before(Some(&hook), options()).await.unwrap();
        assert_eq!(out.url, "/rewritten");
    }

    #[tokio::test]
    async fn test_run_before_failure_propagates() {
        let hook: BeforeRequestHook =
            Arc::new(|_| Box::pin(async { Err("no token".into()) }));
        let error = run_before(Some(&hook), options()).await.unwrap_err();
        assert!(matches!(error, HttpError::RequestHook(_)));
    }

    #[test]
    fn test_run_response_failure_attaches_error() {
        let hook: ResponseHook = Arc::new(|_| Err("bad envelope".into()));
        let error = run_response(Some(&hook), response(200)).unwrap_err();
        match error {
            HttpError::ResponseHook(response) => {
                assert_eq!(response.status, 200);
                assert_eq!(response.error.as_deref(), Some("bad envelope"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_run_response_transforms() {
        let hook: ResponseHook = Arc::new(|mut response| {
            response.body = b"transformed".to_vec();
            Ok(response)
        });
        let out = run_response(Some(&hook), response(200)).unwrap();
        assert_eq!(out.body, b"transformed");
    }
}
