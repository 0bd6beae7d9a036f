// SPDX-FileCopyrightText: 2026 Hookline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP implementation of the downstream CRM client.

use std::time::Duration;

use async_trait::async_trait;
use hookline_config::model::DownstreamConfig;
use hookline_core::{DownstreamClient, HooklineError, TenantKey};
use serde_json::json;

/// Reqwest-backed client for the platform's setup and token endpoints.
pub struct HttpDownstream {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpDownstream {
    pub fn new(config: &DownstreamConfig) -> Result<Self, HooklineError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HooklineError::Downstream {
                message: "failed to build HTTP client".into(),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout,
        })
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<(), HooklineError> {
        let url = format!("{}{path}", self.base_url);
        let mut req = self.client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            req = req.header("x-api-key", key.as_str());
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                HooklineError::Timeout {
                    duration: self.timeout,
                }
            } else {
                HooklineError::Downstream {
                    message: format!("request to {path} failed"),
                    source: Some(Box::new(e)),
                }
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(HooklineError::Downstream {
                message: format!("{path} returned {status}"),
                source: None,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DownstreamClient for HttpDownstream {
    async fn setup_tenant(&self, key: &TenantKey) -> Result<(), HooklineError> {
        tracing::debug!(%key, "downstream tenant setup");
        self.post(
            "/v1/tenants/setup",
            json!({
                "companyId": key.company_id,
                "locationId": key.location_id,
            }),
        )
        .await
    }

    async fn refresh_tokens(&self, location_id: &str) -> Result<(), HooklineError> {
        tracing::debug!(location_id, "downstream token refresh");
        self.post("/v1/tokens/refresh", json!({ "locationId": location_id }))
            .await
    }
}

/// In-process fake for pipeline tests: counts calls and fails on demand.
#[cfg(test)]
pub(crate) mod fake {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use hookline_core::{DownstreamClient, HooklineError, TenantKey};

    #[derive(Default)]
    pub struct FakeDownstream {
        pub setup_calls: AtomicUsize,
        pub refresh_calls: AtomicUsize,
        pub fail_setup: AtomicBool,
        pub fail_refresh: AtomicBool,
    }

    impl FakeDownstream {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_setup() -> Self {
            let fake = Self::default();
            fake.fail_setup.store(true, Ordering::SeqCst);
            fake
        }

        pub fn setup_count(&self) -> usize {
            self.setup_calls.load(Ordering::SeqCst)
        }

        pub fn refresh_count(&self) -> usize {
            self.refresh_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DownstreamClient for FakeDownstream {
        async fn setup_tenant(&self, _key: &TenantKey) -> Result<(), HooklineError> {
            self.setup_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_setup.load(Ordering::SeqCst) {
                return Err(HooklineError::Downstream {
                    message: "setup endpoint returned 503".into(),
                    source: None,
                });
            }
            Ok(())
        }

        async fn refresh_tokens(&self, _location_id: &str) -> Result<(), HooklineError> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_refresh.load(Ordering::SeqCst) {
                return Err(HooklineError::Downstream {
                    message: "refresh endpoint returned 503".into(),
                    source: None,
                });
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str, api_key: Option<&str>) -> DownstreamConfig {
        DownstreamConfig {
            base_url: base_url.to_string(),
            api_key: api_key.map(String::from),
            timeout_secs: 2,
        }
    }

    #[tokio::test]
    async fn setup_posts_tenant_key_with_api_key_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/tenants/setup"))
            .and(header("x-api-key", "secret"))
            .and(body_partial_json(serde_json::json!({"locationId": "loc-1"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpDownstream::new(&config(&server.uri(), Some("secret"))).unwrap();
        let key = TenantKey::new(Some("co-1".into()), Some("loc-1".into())).unwrap();
        client.setup_tenant(&key).await.unwrap();
    }

    #[tokio::test]
    async fn non_success_status_is_a_downstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/tokens/refresh"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = HttpDownstream::new(&config(&server.uri(), None)).unwrap();
        let err = client.refresh_tokens("loc-1").await.unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("503"));
    }
}
