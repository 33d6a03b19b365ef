//! FMI open data WFS client.
//!
//! Builds stored query requests, performs them with a shared HTTP client,
//! decodes the feature collection and hands the members to the normalizer.

pub mod query;
pub mod response;

use self::query::StoredQuery;
use self::response::parse_response;

use crate::error::{CollectorError, Result};
use crate::models::{Member, TimeWindow, WeatherRow};
use crate::normalize::normalize;
use tracing::debug;

/// Source of typed weather rows for a location and time window
#[allow(async_fn_in_trait)]
pub trait WeatherFeed {
    async fn fetch<R: WeatherRow>(&self, location: &str, window: TimeWindow) -> Result<Vec<R>>;
}

/// Client for the WFS endpoint
#[derive(Debug, Clone)]
pub struct WfsClient {
    http: reqwest::Client,
    base_url: String,
}

impl WfsClient {
    /// Create a client for `base_url`, failing early if it is not a URL
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        reqwest::Url::parse(&base_url).map_err(|e| {
            CollectorError::configuration(format!("Invalid service URL '{}': {}", base_url, e))
        })?;

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform a stored query and decode its members
    async fn query(&self, query: &StoredQuery) -> Result<Vec<Member>> {
        let url = query.url(&self.base_url)?;
        debug!("GET {}", url);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| CollectorError::transport("request to weather service failed", e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| CollectorError::transport("failed to read weather service response", e))?;

        parse_response(status, &body)
    }
}

impl WeatherFeed for WfsClient {
    async fn fetch<R: WeatherRow>(&self, location: &str, window: TimeWindow) -> Result<Vec<R>> {
        let query = StoredQuery::for_rows::<R>(location, window);
        let members = self.query(&query).await?;
        Ok(normalize(&members, location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_SERVICE_URL;
    use crate::models::ObservationRow;
    use chrono::{TimeZone, Utc};
    use reqwest::Url;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    const EXCEPTION_REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ExceptionReport xmlns="http://www.opengis.net/ows/1.1" version="2.0.0">
  <Exception exceptionCode="OperationParsingFailed">
    <ExceptionText>Invalid parameter value</ExceptionText>
  </Exception>
</ExceptionReport>"#;

    const FEATURE_COLLECTION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wfs:FeatureCollection xmlns:wfs="http://www.opengis.net/wfs/2.0"
    xmlns:BsWfs="http://xml.fmi.fi/schema/wfs/2.0">
  <wfs:member><BsWfs:BsWfsElement>
    <BsWfs:Time>2024-05-08T05:00:00Z</BsWfs:Time>
    <BsWfs:ParameterName>t2m</BsWfs:ParameterName>
    <BsWfs:ParameterValue>6.5</BsWfs:ParameterValue>
  </BsWfs:BsWfsElement></wfs:member>
  <wfs:member><BsWfs:BsWfsElement>
    <BsWfs:Time>2024-05-08T06:00:00Z</BsWfs:Time>
    <BsWfs:ParameterName>t2m</BsWfs:ParameterName>
    <BsWfs:ParameterValue>7.25</BsWfs:ParameterValue>
  </BsWfs:BsWfsElement></wfs:member>
</wfs:FeatureCollection>"#;

    /// Answer a single request with `status` and `body`, returning the base
    /// URL and a handle yielding the request target that was received
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut request = Vec::new();
            let mut buffer = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let read = socket.read(&mut buffer).await.unwrap();
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buffer[..read]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/xml; charset=UTF-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();

            // "GET /wfs/fin?... HTTP/1.1"
            String::from_utf8_lossy(&request)
                .lines()
                .next()
                .and_then(|line| line.split(' ').nth(1))
                .unwrap_or_default()
                .to_string()
        });

        (format!("http://{}/wfs/fin", address), handle)
    }

    fn window() -> TimeWindow {
        let now = Utc.with_ymd_and_hms(2024, 5, 8, 6, 30, 0).unwrap();
        TimeWindow::trailing(now, 168)
    }

    #[tokio::test]
    async fn test_fetch_reports_service_exception() {
        let (base_url, server) = serve_once("400 Bad Request", EXCEPTION_REPORT).await;
        let client = WfsClient::new(base_url).unwrap();

        let error = client
            .fetch::<ObservationRow>("Helsinki", window())
            .await
            .unwrap_err();

        assert_eq!(
            error.to_string(),
            "api error: Invalid parameter value (400 Bad Request)"
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_decodes_rows_and_sends_query() {
        let (base_url, server) = serve_once("200 OK", FEATURE_COLLECTION).await;
        let client = WfsClient::new(base_url).unwrap();

        let rows = client
            .fetch::<ObservationRow>("Hämeenlinna", window())
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.location == "Hämeenlinna"));
        assert_eq!(
            rows[0].observation_time,
            Utc.with_ymd_and_hms(2024, 5, 8, 5, 0, 0).unwrap()
        );
        assert_eq!(rows[0].air_temperature, 6.5);
        assert_eq!(rows[1].air_temperature, 7.25);

        let target = server.await.unwrap();
        let url = Url::parse(&format!("http://localhost{}", target)).unwrap();
        assert_eq!(url.path(), "/wfs/fin");

        let params: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let expected = vec![
            ("service", "WFS".to_string()),
            ("version", "2.0.0".to_string()),
            ("request", "GetFeature".to_string()),
            ("storedquery_id", "fmi::observations::weather::simple".to_string()),
            ("parameters", ObservationRow::parameter_list()),
            ("place", "Hämeenlinna".to_string()),
            ("starttime", "2024-05-01T06:30:00Z".to_string()),
            ("endtime", "2024-05-08T06:30:00Z".to_string()),
        ];
        let expected: Vec<(String, String)> = expected
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        assert_eq!(params, expected);
    }

    #[test]
    fn test_client_accepts_default_url() {
        let client = WfsClient::new(DEFAULT_SERVICE_URL).unwrap();
        assert_eq!(client.base_url(), DEFAULT_SERVICE_URL);
    }

    #[test]
    fn test_client_rejects_invalid_url() {
        let result = WfsClient::new("opendata.fmi.fi/wfs");
        assert!(matches!(result, Err(CollectorError::Configuration { .. })));
    }
}
