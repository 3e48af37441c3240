use axum::http::Request;
use metrics::{counter, histogram};
use std::{cell::RefCell, fmt, future::Future, time::Instant};
use tower_http::{
    classify::{SharedClassifier, StatusInRangeAsFailures},
    trace::{
        DefaultOnBodyChunk, DefaultOnEos, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse,
        MakeSpan, TraceLayer,
    },
};
use uuid::Uuid;

use tracing::{debug, error};

/// Request ID tracking information
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

impl Default for RequestId {
    fn default() -> Self {
        RequestId(Uuid::new_v4().to_string())
    }
}

impl RequestId {
    pub fn new(value: impl Into<String>) -> Self {
        RequestId(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

tokio::task_local! {
    static CURRENT_REQUEST_ID: RefCell<Option<RequestId>>;
}

/// Runs `future` with `request_id` visible to [`current_request_id`].
pub async fn scope_request_id<Fut, R>(request_id: RequestId, future: Fut) -> R
where
    Fut: Future<Output = R>,
{
    CURRENT_REQUEST_ID
        .scope(RefCell::new(Some(request_id)), future)
        .await
}

pub fn current_request_id() -> Option<RequestId> {
    CURRENT_REQUEST_ID
        .try_with(|cell| cell.borrow().clone())
        .ok()
        .flatten()
}

#[derive(Clone, Default)]
pub struct RequestSpanMaker;

impl<B> MakeSpan<B> for RequestSpanMaker {
    fn make_span(&mut self, request: &Request<B>) -> tracing::Span {
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .cloned()
            .or_else(|| {
                request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .map(RequestId::new)
            })
            .unwrap_or_default();

        tracing::info_span!(
            "http.request",
            request_id = %request_id.as_str(),
            method = %request.method(),
            uri = %request.uri(),
        )
    }
}

/// HTTP trace layer; only 5xx responses are classified as failures.
pub fn configure_http_tracing() -> TraceLayer<
    SharedClassifier<StatusInRangeAsFailures>,
    RequestSpanMaker,
    DefaultOnRequest,
    DefaultOnResponse,
    DefaultOnBodyChunk,
    DefaultOnEos,
    DefaultOnFailure,
> {
    let classifier = SharedClassifier::new(StatusInRangeAsFailures::new(500..=599));
    TraceLayer::new(classifier)
        .make_span_with(RequestSpanMaker)
        .on_request(DefaultOnRequest::default())
        .on_response(DefaultOnResponse::default())
        .on_body_chunk(DefaultOnBodyChunk::default())
        .on_eos(DefaultOnEos::default())
        .on_failure(DefaultOnFailure::default())
}

/// Runs a task, logs its outcome and records `operation_duration_seconds`.
pub async fn with_metrics<F, Fut, T, E>(
    operation_name: &'static str,
    task: F,
) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let start = Instant::now();
    let result = task().await;
    let elapsed = start.elapsed();

    histogram!("operation_duration_seconds", elapsed.as_secs_f64(), "operation" => operation_name);

    match &result {
        Ok(_) => {
            debug!(
                operation = operation_name,
                duration_ms = %elapsed.as_millis(),
                "Operation completed successfully"
            );
        }
        Err(e) => {
            counter!("operation_failures_total", 1, "operation" => operation_name);
            error!(
                operation = operation_name,
                duration_ms = %elapsed.as_millis(),
                error = %e,
                "Operation failed"
            );
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn request_id_is_visible_only_inside_scope() {
        assert!(current_request_id().is_none());

        let seen = scope_request_id(RequestId::new("abc"), async {
            current_request_id().map(|id| id.to_string())
        })
        .await;

        assert_eq!(seen.as_deref(), Some("abc"));
        assert!(current_request_id().is_none());
    }

    #[test]
    fn default_request_id_is_a_uuid() {
        let id = RequestId::default();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[tokio::test]
    async fn with_metrics_passes_result_through() {
        let ok: Result<i32, String> = with_metrics("test_operation", || async { Ok(42) }).await;
        assert_eq!(ok.unwrap(), 42);

        let err: Result<i32, String> = with_metrics("failed_operation", || async {
            Err("Something went wrong".to_string())
        })
        .await;
        assert!(err.is_err());
    }
}
