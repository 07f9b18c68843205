//! HTTP page fetcher with a fixed header profile and per-host throttling.
//!
//! One [`PageFetcher`] is shared by every request of a run: it owns the
//! connection pool and the keyed rate limiter, so the politeness delay holds
//! across concurrent workers. Failures are reported, never retried.

use std::sync::Arc;

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use tracing::{debug, instrument};

use lekcjonarz_shared::{HttpConfig, LekcjonarzError, Result};

/// A downloaded page body.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL that was requested.
    pub url: String,
    /// HTTP status code (always 2xx).
    pub status: u16,
    /// Decoded response body.
    pub body: String,
}

/// Shared HTTP client for discovery and extraction.
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
    limiter: Option<Arc<DefaultKeyedRateLimiter<String>>>,
}

impl PageFetcher {
    /// Build a fetcher with the configured user agent, accept list and timeout.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let accept = HeaderValue::from_str(&config.accept)
            .map_err(|e| LekcjonarzError::config(format!("invalid accept header: {e}")))?;
        headers.insert(ACCEPT, accept);

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(config.timeout)
            .build()
            .map_err(|e| LekcjonarzError::Network(format!("failed to build HTTP client: {e}")))?;

        let limiter = config
            .min_interval
            .and_then(Quota::with_period)
            .map(|quota| Arc::new(RateLimiter::keyed(quota)));

        Ok(Self { client, limiter })
    }

    /// GET `url` and return its body. Non-2xx statuses, timeouts and
    /// connection failures all map to [`LekcjonarzError::Network`].
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        if let Some(limiter) = &self.limiter {
            limiter.until_key_ready(&host_key(url)).await;
        }

        debug!(%url, "fetching page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LekcjonarzError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LekcjonarzError::Network(format!("{url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| LekcjonarzError::Network(format!("{url}: body read failed: {e}")))?;

        Ok(FetchedPage {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

/// Throttle key: the URL's host (with port), or the raw string if unparsable.
fn host_key(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            _ => url.to_string(),
        },
        Err(_) => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> HttpConfig {
        HttpConfig {
            user_agent: "lekcjonarz-test/1.0".into(),
            accept: "text/html".into(),
            timeout: Duration::from_secs(5),
            min_interval: None,
        }
    }

    #[test]
    fn host_key_includes_port() {
        assert_eq!(host_key("https://liturgia.wiara.pl/doc/1"), "liturgia.wiara.pl");
        assert_eq!(host_key("http://127.0.0.1:8080/x"), "127.0.0.1:8080");
        assert_eq!(host_key("garbage"), "garbage");
    }

    #[tokio::test]
    async fn sends_header_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc/1"))
            .and(header("user-agent", "lekcjonarz-test/1.0"))
            .and(header("accept", "text/html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new(&test_config()).unwrap();
        let page = fetcher
            .fetch(&format!("{}/doc/1", server.uri()))
            .await
            .unwrap();

        assert_eq!(page.status, 200);
        assert_eq!(page.body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn non_success_status_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new(&test_config()).unwrap();
        let err = fetcher
            .fetch(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, LekcjonarzError::Network(_)));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn timeout_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let mut config = test_config();
        config.timeout = Duration::from_millis(200);
        let fetcher = PageFetcher::new(&config).unwrap();
        let err = fetcher
            .fetch(&format!("{}/slow", server.uri()))
            .await
            .unwrap_err();

        assert!(err.is_job_scoped());
    }

    #[tokio::test]
    async fn throttled_fetcher_still_serves_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x"))
            .expect(3)
            .mount(&server)
            .await;

        let mut config = test_config();
        config.min_interval = Some(Duration::from_millis(20));
        let fetcher = PageFetcher::new(&config).unwrap();

        for i in 0..3 {
            fetcher
                .fetch(&format!("{}/p/{i}", server.uri()))
                .await
                .unwrap();
        }
    }
}
