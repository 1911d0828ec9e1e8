//! NWS active-alerts client.
//!
//! [`NwsClient`] issues
//! `GET <base>/alerts/active?status=actual&message_type=alert,update&limit=N`
//! and decodes the GeoJSON reply into [`AlertRecord`]s.
//!
//! ## Example
//!
//! ```no_run
//! use stormwatch_fetch::{AlertSource, FetchConfig, NwsClient};
//!
//! # async fn example() -> stormwatch_fetch::Result<()> {
//! let client = NwsClient::new(FetchConfig::default())?;
//! let alerts = client.fetch(&["PA".to_string()], &[]).await?;
//! println!("{} active alerts", alerts.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use stormwatch_core::AlertRecord;
use tracing::debug;

use crate::error::{FetchError, Result};
use crate::geojson::{filter_events, parse_feature_collection};

/// Region type requested when no area filter is set. Marine zones are not supported.
pub const REGION_TYPE: &str = "land";

/// Something that can produce a snapshot of active alerts.
#[async_trait]
pub trait AlertSource: Send + Sync {
    /// Fetch the current snapshot.
    ///
    /// `areas` restricts to postal/region codes, `events` to event types;
    /// empty slices mean no restriction.
    async fn fetch(&self, areas: &[String], events: &[String]) -> Result<Vec<AlertRecord>>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// Connection settings for [`NwsClient`].
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// API base URL, e.g. `https://api.weather.gov/`
    pub base_url: String,
    /// User-Agent header value
    pub user_agent: String,
    /// Result cap per request
    pub limit: u32,
    /// Whole-request timeout
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.weather.gov/".to_string(),
            user_agent: concat!("stormwatch/", env!("CARGO_PKG_VERSION")).to_string(),
            limit: 500,
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP client for the NWS alerts endpoint.
pub struct NwsClient {
    config: FetchConfig,
    client: reqwest::Client,
}

impl NwsClient {
    /// Create a new client from config.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::ClientBuild(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Full URL of the active-alerts endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/alerts/active", self.config.base_url.trim_end_matches('/'))
    }

    /// Query parameters for one fetch.
    ///
    /// The API treats `area` and `region_type` as mutually exclusive, so an
    /// area filter replaces the region type. Event filtering is left to the
    /// client side.
    pub fn query(&self, areas: &[String]) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("status", "actual".to_string()),
            ("message_type", "alert,update".to_string()),
            ("limit", self.config.limit.to_string()),
        ];
        if areas.is_empty() {
            params.push(("region_type", REGION_TYPE.to_string()));
        } else {
            params.push(("area", areas.join(",")));
        }
        params
    }
}

#[async_trait]
impl AlertSource for NwsClient {
    async fn fetch(&self, areas: &[String], events: &[String]) -> Result<Vec<AlertRecord>> {
        let url = self.endpoint();
        debug!(%url, ?areas, "fetching active alerts");

        let response = self
            .client
            .get(&url)
            .header("accept", "application/geo+json")
            .query(&self.query(areas))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(FetchError::http_status(status.as_u16(), &body));
        }

        let records = parse_feature_collection(&body)?;
        let total = records.len();
        let records = filter_events(records, events);
        debug!(total, kept = records.len(), "parsed alert snapshot");
        Ok(records)
    }

    fn name(&self) -> &str {
        "nws"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> NwsClient {
        NwsClient::new(FetchConfig {
            base_url: "https://api.weather.gov/".to_string(),
            limit: 25,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_handles_trailing_slash() {
        assert_eq!(client().endpoint(), "https://api.weather.gov/alerts/active");
    }

    #[test]
    fn test_query_without_areas_uses_region_type() {
        let query = client().query(&[]);
        assert!(query.contains(&("region_type", "land".to_string())));
        assert!(query.contains(&("limit", "25".to_string())));
        assert!(query.contains(&("message_type", "alert,update".to_string())));
        assert!(!query.iter().any(|(k, _)| *k == "area"));
    }

    #[test]
    fn test_query_with_areas_drops_region_type() {
        let query = client().query(&["PA".to_string(), "NM".to_string()]);
        assert!(query.contains(&("area", "PA,NM".to_string())));
        assert!(!query.iter().any(|(k, _)| *k == "region_type"));
    }

    #[test]
    fn test_name() {
        assert_eq!(client().name(), "nws");
    }

    // ============ HTTP Mocking Tests with wiremock ============

    mod http_tests {
        use super::*;
        use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

        fn config_for(server: &MockServer) -> FetchConfig {
            FetchConfig {
                base_url: server.uri(),
                timeout: Duration::from_secs(2),
                ..Default::default()
            }
        }

        #[tokio::test]
        async fn test_fetch_sends_query_and_user_agent() {
            let server = MockServer::start().await;
            Mock::given(matchers::method("GET"))
                .and(matchers::path("/alerts/active"))
                .and(matchers::query_param("status", "actual"))
                .and(matchers::query_param("message_type", "alert,update"))
                .and(matchers::query_param("limit", "500"))
                .and(matchers::query_param("region_type", "land"))
                .and(matchers::header_exists("user-agent"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "type": "FeatureCollection",
                    "features": [{
                        "id": "https://api.weather.gov/alerts/A1",
                        "type": "Feature",
                        "geometry": null,
                        "properties": {"id": "A1", "event": "Flood Watch", "areaDesc": "Allegheny, PA"}
                    }]
                })))
                .expect(1)
                .mount(&server)
                .await;

            let client = NwsClient::new(config_for(&server)).unwrap();
            let records = client.fetch(&[], &[]).await.unwrap();

            assert_eq!(records.len(), 1);
            assert_eq!(records[0].id, "A1");
            assert_eq!(records[0].area_desc, "Allegheny, PA");
        }

        #[tokio::test]
        async fn test_server_error_is_network_error() {
            let server = MockServer::start().await;
            Mock::given(matchers::method("GET"))
                .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
                .mount(&server)
                .await;

            let client = NwsClient::new(config_for(&server)).unwrap();
            let err = client.fetch(&[], &[]).await.unwrap_err();

            assert!(err.is_network_error());
            assert_eq!(err.status(), Some(503));
        }

        #[tokio::test]
        async fn test_garbage_body_is_parse_error() {
            let server = MockServer::start().await;
            Mock::given(matchers::method("GET"))
                .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
                .mount(&server)
                .await;

            let client = NwsClient::new(config_for(&server)).unwrap();
            let err = client.fetch(&[], &[]).await.unwrap_err();
            assert!(err.is_parse_error());
        }
    }
}
