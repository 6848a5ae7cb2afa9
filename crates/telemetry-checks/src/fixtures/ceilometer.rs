//! Telemetry v2 REST client fixture.

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::LazyLock;
use std::time::Duration;
use telemetry_common::api::TelemetryApi;
use telemetry_common::config::Config;
use telemetry_common::error::{CollaboratorError, Result};
use telemetry_common::query::ResourceFilter;
use telemetry_common::secret::{ExposeSecret, SecretString};
use telemetry_common::types::{
    Aggregate, Alarm, AlarmId, AlarmSpec, AlarmState, Comparison, NewSample, Resource, ResourceId,
    Sample, Statistic,
};
use tracing::{debug, instrument};

/// Maximum length for error body in error messages.
const MAX_ERROR_BODY_LEN: usize = 256;

/// Regex pattern for auth tokens echoed back in error bodies
/// (`X-Auth-Token: ...` headers and Fernet `gAAAAA...` tokens).
static TOKEN_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)x-auth-token[\x22']?\s*[:=]\s*[\x22']?[A-Za-z0-9_\-=]+|gAAAAA[A-Za-z0-9_\-=]+").ok()
});

/// Sanitize error response body to remove tokens and bound its length.
fn sanitize_error_body(body: &str) -> String {
    let sanitized = match TOKEN_PATTERN.as_ref() {
        Some(pattern) => pattern.replace_all(body, "[TOKEN_REDACTED]").into_owned(),
        None => body.to_string(),
    };

    if sanitized.len() <= MAX_ERROR_BODY_LEN {
        return sanitized;
    }
    let mut cut = MAX_ERROR_BODY_LEN;
    while !sanitized.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...[truncated]", sanitized.get(..cut).unwrap_or_default())
}

fn transport_error(err: &reqwest::Error) -> CollaboratorError {
    if err.is_decode() {
        CollaboratorError::InvalidResponse(err.to_string())
    } else {
        CollaboratorError::Transport(err.to_string())
    }
}

/// Threshold rule of an alarm creation request.
#[derive(Debug, Serialize)]
struct ThresholdRule<'a> {
    meter_name: &'a str,
    threshold: f64,
    period: u64,
    statistic: Aggregate,
    comparison_operator: Comparison,
}

/// Alarm creation request body.
#[derive(Debug, Serialize)]
struct AlarmRequest<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    alarm_type: &'static str,
    threshold_rule: ThresholdRule<'a>,
}

impl<'a> From<&'a AlarmSpec> for AlarmRequest<'a> {
    fn from(spec: &'a AlarmSpec) -> Self {
        Self {
            name: &spec.name,
            alarm_type: "threshold",
            threshold_rule: ThresholdRule {
                meter_name: &spec.meter_name,
                threshold: spec.threshold,
                period: spec.period,
                statistic: spec.statistic,
                comparison_operator: spec.comparison_operator,
            },
        }
    }
}

/// Client for the telemetry v2 API.
pub struct CeilometerClient {
    base_url: String,
    auth_token: Option<SecretString>,
    http_client: Client,
}

impl std::fmt::Debug for CeilometerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CeilometerClient")
            .field("base_url", &self.base_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl CeilometerClient {
    /// Create a client with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `CollaboratorError::Transport` if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        auth_token: Option<SecretString>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| {
                CollaboratorError::Transport(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token,
            http_client,
        })
    }

    /// Create a client from the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `CollaboratorError::Transport` if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.telemetry_url.clone(),
            config.auth_token.clone(),
            config.request_timeout,
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v2/{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.header("X-Auth-Token", token.expose_secret()),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        Self::decode(response, what).await
    }

    async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        let status = response.status();
        let body = response.text().await.map_err(|e| transport_error(&e))?;

        if !status.is_success() {
            let body = sanitize_error_body(&body);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    CollaboratorError::Unauthorized(format!("{what}: {body}"))
                }
                StatusCode::NOT_FOUND => CollaboratorError::NotFound(what.to_string()),
                _ => CollaboratorError::RequestFailed {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| CollaboratorError::InvalidResponse(format!("{what}: {e}")))
    }
}

#[async_trait]
impl TelemetryApi for CeilometerClient {
    #[instrument(skip_all, fields(meter = %meter))]
    async fn list_samples(&self, meter: &str, filter: &ResourceFilter) -> Result<Vec<Sample>> {
        let request = self
            .http_client
            .get(self.url(&format!("meters/{meter}")))
            .query(&filter.to_query_pairs());
        let samples: Vec<Sample> = self.send(request, &format!("samples of {meter}")).await?;
        debug!(target: "telemetry.checks.client", count = samples.len(), "Listed samples");
        Ok(samples)
    }

    #[instrument(skip_all, fields(meter = %meter))]
    async fn statistics(&self, meter: &str, filter: &ResourceFilter) -> Result<Vec<Statistic>> {
        let request = self
            .http_client
            .get(self.url(&format!("meters/{meter}/statistics")))
            .query(&filter.to_query_pairs());
        self.send(request, &format!("statistics of {meter}")).await
    }

    #[instrument(skip_all, fields(meter = %sample.counter_name))]
    async fn create_sample(&self, sample: &NewSample) -> Result<Vec<Sample>> {
        let request = self
            .http_client
            .post(self.url(&format!("meters/{}", sample.counter_name)))
            .json(&[sample]);
        self.send(request, &format!("sample of {}", sample.counter_name))
            .await
    }

    #[instrument(skip_all, fields(alarm = %spec.name))]
    async fn create_alarm(&self, spec: &AlarmSpec) -> Result<Alarm> {
        let request = self
            .http_client
            .post(self.url("alarms"))
            .json(&AlarmRequest::from(spec));
        self.send(request, &format!("alarm {}", spec.name)).await
    }

    #[instrument(skip_all, fields(alarm_id = %alarm_id))]
    async fn alarm_state(&self, alarm_id: &AlarmId) -> Result<AlarmState> {
        let request = self
            .http_client
            .get(self.url(&format!("alarms/{alarm_id}/state")));
        self.send(request, &format!("state of alarm {alarm_id}"))
            .await
    }

    #[instrument(skip_all, fields(resource_id = %resource_id))]
    async fn get_resource(&self, resource_id: &ResourceId) -> Result<Resource> {
        let request = self
            .http_client
            .get(self.url(&format!("resources/{resource_id}")));
        self.send(request, &format!("resource {resource_id}")).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use telemetry_common::types::CounterType;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> CeilometerClient {
        CeilometerClient::new(
            server.uri(),
            Some(SecretString::from("tok-abc")),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_sanitize_redacts_tokens() {
        let body = r#"{"error": "bad X-Auth-Token: gAAAAABkSecret123"}"#;
        let sanitized = sanitize_error_body(body);
        assert!(!sanitized.contains("gAAAAABkSecret123"));
        assert!(sanitized.contains("[TOKEN_REDACTED]"));
    }

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let sanitized = sanitize_error_body(&"e".repeat(1000));
        assert!(sanitized.ends_with("...[truncated]"));
        assert!(sanitized.len() <= MAX_ERROR_BODY_LEN + "...[truncated]".len());
    }

    #[test]
    fn test_debug_hides_token() {
        let client =
            CeilometerClient::new("http://x", Some(SecretString::from("hidden")), Duration::from_secs(1))
                .unwrap();
        assert!(!format!("{client:?}").contains("hidden"));
    }

    #[tokio::test]
    async fn test_list_samples_sends_filter_and_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/meters/instance"))
            .and(query_param("q.field", "resource"))
            .and(query_param("q.op", "eq"))
            .and(query_param("q.value", "inst-1"))
            .and(header("X-Auth-Token", "tok-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "resource_id": "inst-1",
                "counter_name": "instance",
                "counter_type": "gauge",
                "counter_unit": "instance",
                "counter_volume": 1.0,
                "timestamp": "2014-01-01T00:00:00",
                "resource_metadata": {"flavor": "m1.tiny"}
            }])))
            .mount(&server)
            .await;

        let samples = client(&server)
            .list_samples("instance", &ResourceFilter::resource(&ResourceId::new("inst-1")))
            .await
            .unwrap();

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].counter_name, "instance");
        assert_eq!(samples[0].resource_metadata["flavor"], "m1.tiny");
    }

    #[tokio::test]
    async fn test_statistics_decode() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/meters/cpu_util/statistics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "sum": 12.0, "avg": 6.0, "min": 2.0, "max": 10.0, "count": 2, "period": 0
            }])))
            .mount(&server)
            .await;

        let stats = client(&server)
            .statistics("cpu_util", &ResourceFilter::new())
            .await
            .unwrap();
        assert!((stats[0].sum - 12.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_create_alarm_sends_threshold_rule() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/alarms"))
            .and(body_partial_json(serde_json::json!({
                "name": "cpu-alarm",
                "type": "threshold",
                "threshold_rule": {
                    "meter_name": "cpu_util",
                    "statistic": "sum",
                    "comparison_operator": "lt",
                    "period": 600
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "alarm_id": "a-1",
                "name": "cpu-alarm",
                "state": "insufficient data"
            })))
            .mount(&server)
            .await;

        let alarm = client(&server)
            .create_alarm(&AlarmSpec {
                name: "cpu-alarm".to_string(),
                meter_name: "cpu_util".to_string(),
                threshold: 9.0,
                period: 600,
                statistic: Aggregate::Sum,
                comparison_operator: Comparison::Lt,
            })
            .await
            .unwrap();

        assert_eq!(alarm.alarm_id, AlarmId::new("a-1"));
        assert_eq!(alarm.state, AlarmState::InsufficientData);
    }

    #[tokio::test]
    async fn test_alarm_state_is_a_json_string() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/alarms/a-1/state"))
            .respond_with(ResponseTemplate::new(200).set_body_string("\"ok\""))
            .mount(&server)
            .await;

        let state = client(&server).alarm_state(&AlarmId::new("a-1")).await.unwrap();
        assert_eq!(state, AlarmState::Ok);
    }

    #[tokio::test]
    async fn test_create_sample_posts_list() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/meters/image"))
            .and(body_partial_json(serde_json::json!([{
                "resource_id": "img-1",
                "counter_type": "delta"
            }])))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "resource_id": "img-1",
                "counter_name": "image",
                "counter_type": "delta",
                "counter_unit": "image",
                "counter_volume": 1.0
            }])))
            .mount(&server)
            .await;

        let created = client(&server)
            .create_sample(&NewSample {
                resource_id: ResourceId::new("img-1"),
                counter_name: "image".to_string(),
                counter_type: CounterType::Delta,
                counter_unit: "image".to_string(),
                counter_volume: 1.0,
                resource_metadata: BTreeMap::new(),
            })
            .await
            .unwrap();
        assert_eq!(created[0].resource_id, ResourceId::new("img-1"));
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/resources/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/resources/forbidden"))
            .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/resources/broken"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad query"))
            .mount(&server)
            .await;

        let client = client(&server);

        let err = client.get_resource(&ResourceId::new("missing")).await.unwrap_err();
        assert!(matches!(err, CollaboratorError::NotFound(_)));
        assert!(err.is_transient());

        let err = client.get_resource(&ResourceId::new("forbidden")).await.unwrap_err();
        assert!(matches!(err, CollaboratorError::Unauthorized(_)));

        let err = client.get_resource(&ResourceId::new("broken")).await.unwrap_err();
        assert_eq!(
            err,
            CollaboratorError::RequestFailed {
                status: 400,
                body: "bad query".to_string()
            }
        );
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_undecodable_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/resources/r-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(&server)
            .get_resource(&ResourceId::new("r-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, CollaboratorError::InvalidResponse(_)));
    }
}
