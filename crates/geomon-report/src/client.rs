// SPDX-FileCopyrightText: 2026 Geomon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP transport for the backend reporting API.
//!
//! Provides [`HttpReportTransport`] which handles request construction,
//! authentication, and transient error retry for the event report and
//! seen acknowledgement endpoints.

use std::time::Duration;

use async_trait::async_trait;
use geomon_config::model::ReportingConfig;
use geomon_core::traits::ReportTransport;
use geomon_core::types::{EventReportBody, EventReportResponse, SeenReportBody};
use geomon_core::GeomonError;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

/// HTTP client for the backend reporting endpoints.
///
/// Manages authentication headers and retry logic for transient errors
/// (429, 500, 503).
#[derive(Debug, Clone)]
pub struct HttpReportTransport {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl HttpReportTransport {
    pub fn new(config: &ReportingConfig) -> Result<Self, GeomonError> {
        let mut headers = HeaderMap::new();
        if let Some(application_code) = &config.application_code {
            headers.insert(
                "authorization",
                HeaderValue::from_str(&format!("App {application_code}")).map_err(|e| {
                    GeomonError::Config(format!("invalid application code header value: {e}"))
                })?,
            );
        }
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| GeomonError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            max_retries: 1,
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Sends `body` as JSON to `path`, retrying once on transient errors,
    /// and returns the raw response body of a successful request.
    async fn post_json<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<String, GeomonError> {
        let url = format!("{}{path}", self.base_url);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, path, "retrying request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&url)
                .json(body)
                .send()
                .await
                .map_err(|e| GeomonError::Transport {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, path, "response received");

            if status.is_success() {
                return response.text().await.map_err(|e| GeomonError::Transport {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            let text = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %text, "transient error, will retry");
                last_error = Some(GeomonError::Transport {
                    message: format!("API returned {status}: {text}"),
                    source: None,
                });
                continue;
            }

            return Err(GeomonError::Transport {
                message: format!("API returned {status}: {text}"),
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| GeomonError::Transport {
            message: "request failed after retries".into(),
            source: None,
        }))
    }
}

#[async_trait]
impl ReportTransport for HttpReportTransport {
    async fn send_event_reports(
        &self,
        body: &EventReportBody,
    ) -> Result<EventReportResponse, GeomonError> {
        let text = self.post_json("/geo/event", body).await?;
        // A response the SDK cannot parse must not look like a success, or
        // the queue would drain without reconciliation.
        serde_json::from_str(&text).map_err(|e| GeomonError::Transport {
            message: format!("failed to parse event report response: {e}"),
            source: Some(Box::new(e)),
        })
    }

    async fn send_seen_reports(&self, body: &SeenReportBody) -> Result<(), GeomonError> {
        self.post_json("/messages/seen", body).await?;
        Ok(())
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;

    use geomon_core::types::{EventReportEntry, GeoEventType, MessagePayload, SeenEntry};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_transport(base_url: &str) -> HttpReportTransport {
        HttpReportTransport::new(&ReportingConfig {
            api_base_url: "https://unused.example.com".into(),
            application_code: Some("test-app-code".into()),
            batch_delay_ms: 5000,
        })
        .unwrap()
        .with_base_url(base_url.to_string())
    }

    fn event_body() -> EventReportBody {
        EventReportBody {
            messages: vec![MessagePayload {
                message_id: "signal-1".into(),
            }],
            reports: vec![EventReportEntry {
                event: GeoEventType::Entry,
                geo_area_id: "area-1".into(),
                message_id: "signal-1".into(),
                sdk_message_id: "sdk-1".into(),
                campaign_id: "campaign-1".into(),
                timestamp_delta: -1500,
            }],
        }
    }

    #[tokio::test]
    async fn event_reports_are_posted_with_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/geo/event"))
            .and(header("authorization", "App test-app-code"))
            .and(body_partial_json(serde_json::json!({
                "messages": [{"messageId": "signal-1"}],
                "reports": [{
                    "event": "entry",
                    "geoAreaId": "area-1",
                    "campaignId": "campaign-1",
                }],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messageIds": {"sdk-1": "server-1"},
                "finishedCampaignIds": ["campaign-9"],
                "suspendedCampaignIds": [],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = test_transport(&server.uri());
        let response = transport.send_event_reports(&event_body()).await.unwrap();

        assert_eq!(response.message_ids.get("sdk-1").unwrap(), "server-1");
        assert_eq!(response.finished_campaign_ids, vec!["campaign-9"]);
        assert!(response.suspended_campaign_ids.is_empty());
    }

    #[tokio::test]
    async fn missing_response_fields_default_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/geo/event"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let transport = test_transport(&server.uri());
        let response = transport.send_event_reports(&event_body()).await.unwrap();

        assert!(response.message_ids.is_empty());
        assert!(response.finished_campaign_ids.is_empty());
        assert!(response.suspended_campaign_ids.is_empty());
    }

    #[tokio::test]
    async fn malformed_response_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/geo/event"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let transport = test_transport(&server.uri());
        let result = transport.send_event_reports(&event_body()).await;

        assert!(matches!(result, Err(GeomonError::Transport { .. })));
    }

    #[tokio::test]
    async fn client_error_status_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/geo/event"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = test_transport(&server.uri());
        let result = transport.send_event_reports(&event_body()).await;

        assert!(matches!(result, Err(GeomonError::Transport { .. })));
    }

    #[tokio::test]
    async fn transient_error_is_retried_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages/seen"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/messages/seen"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = test_transport(&server.uri());
        let body = SeenReportBody {
            messages: vec![SeenEntry {
                message_id: "server-1".into(),
                timestamp_delta: -200,
            }],
        };
        transport.send_seen_reports(&body).await.unwrap();
    }
}
