//! Client for the external fusion service.
//!
//! The service exposes two endpoints:
//! - `GET {base}/elements/base` returns the starting elements.
//! - `GET {base}/fusion?id1=&id2=` returns the combined element, or a
//!   non-200 status when the pair has no recipe.

use alchemy_protocol::{Element, ElementRecord, FusionStatus};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://redalchemy.redriottank.com/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum FusionError {
    #[error("network error: {0}")]
    Network(String),

    #[error("no combination (status {0})")]
    NoCombination(u16),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl FusionError {
    pub fn status(&self) -> FusionStatus {
        match self {
            FusionError::NoCombination(_) => FusionStatus::NoCombination,
            FusionError::Network(_) | FusionError::Malformed(_) => FusionStatus::Unavailable,
        }
    }
}

/// Logs a failed fusion. Callers treat every failure as "nothing happened".
pub fn report_failure(a: &Element, b: &Element, err: &FusionError) {
    match err {
        FusionError::NoCombination(status) => {
            tracing::debug!(id1 = %a.id, id2 = %b.id, status, "no fusion for these elements");
        }
        other => {
            tracing::warn!(id1 = %a.id, id2 = %b.id, error = %other, "fusion request failed");
        }
    }
}

#[async_trait]
pub trait FusionService: Send + Sync {
    async fn fetch_base_elements(&self) -> Result<Vec<Element>, FusionError>;

    async fn fuse(&self, a: &Element, b: &Element) -> Result<Element, FusionError>;

    /// Single best-effort attempt: no retries, and every error becomes `None`.
    /// `Board` calls [`FusionService::fuse`] instead since it records the
    /// error kind in `last_fusion`.
    async fn attempt_fusion(&self, a: &Element, b: &Element) -> Option<Element> {
        match self.fuse(a, b).await {
            Ok(el) => Some(el),
            Err(e) => {
                report_failure(a, b, &e);
                None
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpFusionClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpFusionClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FusionError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FusionError::Network(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_body(&self, url: &str, query: &[(&str, &str)]) -> Result<String, FusionError> {
        tracing::debug!(url = %url, "querying fusion service");
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| FusionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FusionError::NoCombination(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FusionError::Network(e.to_string()))
    }
}

fn into_element(record: ElementRecord) -> Result<Element, FusionError> {
    let name = record.name.clone();
    record
        .into_element()
        .ok_or_else(|| FusionError::Malformed(format!("element {name:?} has no id")))
}

#[async_trait]
impl FusionService for HttpFusionClient {
    async fn fetch_base_elements(&self) -> Result<Vec<Element>, FusionError> {
        let url = format!("{}/elements/base", self.base_url);
        // A failing base endpoint is an outage, not a missing recipe.
        let body = self.get_body(&url, &[]).await.map_err(|e| match e {
            FusionError::NoCombination(status) => {
                FusionError::Network(format!("base elements returned status {status}"))
            }
            other => other,
        })?;
        let records: Vec<ElementRecord> =
            serde_json::from_str(&body).map_err(|e| FusionError::Malformed(e.to_string()))?;
        let elements = records
            .into_iter()
            .map(into_element)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::info!(count = elements.len(), "loaded base elements");
        Ok(elements)
    }

    async fn fuse(&self, a: &Element, b: &Element) -> Result<Element, FusionError> {
        let url = format!("{}/fusion", self.base_url);
        let body = self
            .get_body(&url, &[("id1", a.id.as_str()), ("id2", b.id.as_str())])
            .await?;
        let record: ElementRecord =
            serde_json::from_str(&body).map_err(|e| FusionError::Malformed(e.to_string()))?;
        let element = into_element(record)?;
        tracing::info!(id1 = %a.id, id2 = %b.id, result = %element.id, "fusion succeeded");
        Ok(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;

    async fn fusion(Query(q): Query<HashMap<String, String>>) -> Response {
        let pair = (
            q.get("id1").map(String::as_str),
            q.get("id2").map(String::as_str),
        );
        match pair {
            (Some("water"), Some("fire")) => Json(serde_json::json!({
                "id": "steam1", "name": "steam", "icon": "💨"
            }))
            .into_response(),
            (Some("earth"), Some("earth")) => "<html>oops</html>".into_response(),
            _ => (StatusCode::NOT_FOUND, "no recipe").into_response(),
        }
    }

    async fn spawn_stub() -> String {
        let app = Router::new()
            .route(
                "/api/elements/base",
                get(|| async {
                    Json(serde_json::json!([
                        { "id": "water", "name": "water", "emoji": "💧" },
                        { "id": "fire", "name": "fire", "icon": "🔥" },
                        { "id": "air", "name": "air" }
                    ]))
                }),
            )
            .route("/api/fusion", get(fusion));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api/")
    }

    fn client(base: &str) -> HttpFusionClient {
        HttpFusionClient::new(base, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn base_elements_are_normalised() {
        let c = client(&spawn_stub().await);
        let base = c.fetch_base_elements().await.unwrap();
        let glyphs: Vec<_> = base.iter().map(|el| el.emoji.as_str()).collect();
        assert_eq!(glyphs, ["💧", "🔥", alchemy_protocol::PLACEHOLDER_GLYPH]);
    }

    #[tokio::test]
    async fn fuse_returns_result_element() {
        let c = client(&spawn_stub().await);
        let water = Element::new("water", "water", "💧");
        let fire = Element::new("fire", "fire", "🔥");
        let steam = c.fuse(&water, &fire).await.unwrap();
        assert_eq!(steam, Element::new("steam1", "steam", "💨"));
    }

    #[tokio::test]
    async fn non_success_is_no_combination() {
        let c = client(&spawn_stub().await);
        let water = Element::new("water", "water", "💧");
        let err = c.fuse(&water, &water).await.unwrap_err();
        assert!(matches!(err, FusionError::NoCombination(404)));
        assert_eq!(err.status(), FusionStatus::NoCombination);
        assert!(c.attempt_fusion(&water, &water).await.is_none());
    }

    #[tokio::test]
    async fn unexpected_body_is_malformed() {
        let c = client(&spawn_stub().await);
        let earth = Element::new("earth", "earth", "🌍");
        let err = c.fuse(&earth, &earth).await.unwrap_err();
        assert!(matches!(err, FusionError::Malformed(_)));
        assert_eq!(err.status(), FusionStatus::Unavailable);
    }

    #[tokio::test]
    async fn unreachable_service_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let c = client(&format!("http://{addr}/api"));
        let err = c.fetch_base_elements().await.unwrap_err();
        assert!(matches!(err, FusionError::Network(_)));

        let a = Element::new("water", "water", "💧");
        assert!(c.attempt_fusion(&a, &a).await.is_none());
    }

    #[tokio::test]
    async fn failing_base_endpoint_is_network_error() {
        let app = Router::new().route(
            "/api/elements/base",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let err = client(&format!("http://{addr}/api")).fetch_base_elements().await.unwrap_err();
        assert!(matches!(&err, FusionError::Network(msg) if msg.contains("500")));
        assert_eq!(err.status(), FusionStatus::Unavailable);
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let c = client("http://localhost:1/api/");
        assert_eq!(c.base_url(), "http://localhost:1/api");
    }
}
