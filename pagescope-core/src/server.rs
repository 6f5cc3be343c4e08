// HTTP endpoint for page analysis

use crate::analysis::{AnalyzeRequest, Analyzer, PageAnalysis};
use crate::error::AnalyzeError;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Error body returned by every failing route: `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<AnalyzeError> for ApiError {
    fn from(error: AnalyzeError) -> Self {
        let status = match &error {
            AnalyzeError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            AnalyzeError::FetchTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            AnalyzeError::Fetch { .. }
            | AnalyzeError::FetchStatus { .. }
            | AnalyzeError::PageTooLarge { .. } => {
                StatusCode::BAD_GATEWAY
            }
            AnalyzeError::Client(_)
            | AnalyzeError::Scan(_)
            | AnalyzeError::Config(_)
            | AnalyzeError::Keywords(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, error.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub fn router(analyzer: Arc<Analyzer>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/api/analyze", post(analyze))
        .route("/health", get(health))
        .with_state(analyzer)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(StatusCode::GATEWAY_TIMEOUT, request_timeout))
        .layer(CorsLayer::permissive())
}

/// Serve until Ctrl-C.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on http://{}", addr);
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn analyze(
    State(analyzer): State<Arc<Analyzer>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<PageAnalysis>, ApiError> {
    let Json(request) = payload?;
    match analyzer.analyze(&request).await {
        Ok(analysis) => Ok(Json(analysis)),
        Err(e) => {
            warn!("Analysis of {} failed: {}", request.url, e);
            Err(e.into())
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use serde_json::Value;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    async fn spawn_app(request_timeout: Duration) -> String {
        let analyzer = Arc::new(Analyzer::new(&Settings::default()).unwrap());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(analyzer, request_timeout);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (AnalyzeError::InvalidUrl("x".to_string()), StatusCode::BAD_REQUEST),
            (
                AnalyzeError::FetchTimeout {
                    url: "https://a.test".to_string(),
                    timeout_secs: 1,
                },
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                AnalyzeError::FetchStatus {
                    url: "https://a.test".to_string(),
                    status: 404,
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                AnalyzeError::PageTooLarge {
                    url: "https://a.test".to_string(),
                    limit: 1,
                },
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(ApiError::from(error).status(), expected);
        }
    }

    #[tokio::test]
    async fn test_health() {
        let base = spawn_app(Duration::from_secs(30)).await;
        let response = reqwest::get(format!("{}/health", base)).await.unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_analyze_endpoint() {
        let site = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(concat!(
                "<html><head><title>Hello</title></head>",
                r#"<body><a href="/missing">m</a></body></html>"#,
            )))
            .mount(&site)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&site)
            .await;

        let base = spawn_app(Duration::from_secs(30)).await;
        let response = reqwest::Client::new()
            .post(format!("{}/api/analyze", base))
            .json(&json!({ "url": site.uri() }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["title"], "Hello");
        assert_eq!(body["confirmedBrokenLinksCount"], 1);
        assert_eq!(body["brokenLinks"][0]["status"], 404);
        assert_eq!(body["brokenLinks"][0]["category"], "ClientError");
    }

    #[tokio::test]
    async fn test_invalid_url_is_bad_request() {
        let base = spawn_app(Duration::from_secs(30)).await;
        let response = reqwest::Client::new()
            .post(format!("{}/api/analyze", base))
            .json(&json!({ "url": "notaurl" }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("Invalid URL"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let base = spawn_app(Duration::from_secs(30)).await;
        let response = reqwest::Client::new()
            .post(format!("{}/api/analyze", base))
            .header("content-type", "application/json")
            .body("{\"nope\": true}")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_upstream_failure_is_bad_gateway() {
        let site = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&site)
            .await;

        let base = spawn_app(Duration::from_secs(30)).await;
        let response = reqwest::Client::new()
            .post(format!("{}/api/analyze", base))
            .json(&json!({ "url": site.uri(), "checkLinks": false }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 502);
    }

    #[tokio::test]
    async fn test_request_timeout_layer() {
        let site = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&site)
            .await;

        let base = spawn_app(Duration::from_millis(500)).await;
        let response = reqwest::Client::new()
            .post(format!("{}/api/analyze", base))
            .json(&json!({ "url": site.uri() }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 504);
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let base = spawn_app(Duration::from_secs(30)).await;
        let response = reqwest::Client::new()
            .get(format!("{}/health", base))
            .header("origin", "https://dashboard.example")
            .send()
            .await
            .unwrap();

        assert!(response.headers().contains_key("access-control-allow-origin"));
    }
}
