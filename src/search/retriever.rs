//! DuckDuckGo HTML search retriever

use super::extractor::{extract_limited, MAX_HITS};
use super::models::{SearchError, SearchOutcome};
use super::traits::{Pause, SearchTool, TokioPause};
use crate::config::SearchSettings;
use crate::network::HttpClient;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Marker the provider puts on its anti-bot challenge page
const CAPTCHA_MARKER: &[u8] = b"CAPTCHA";

/// Fetches the provider's HTML results page and extracts hits from it
pub struct Retriever {
    client: HttpClient,
    endpoint: String,
    delay: Duration,
    max_results: usize,
    pause: Arc<dyn Pause>,
}

impl Retriever {
    /// Create a retriever with default settings
    pub fn new(client: HttpClient) -> Self {
        Self::with_settings(client, &SearchSettings::default())
    }

    /// Create a retriever from search settings
    pub fn with_settings(client: HttpClient, settings: &SearchSettings) -> Self {
        Self {
            client,
            endpoint: settings.endpoint.clone(),
            delay: settings.rate_limit_delay(),
            max_results: settings.max_results,
            pause: Arc::new(TokioPause),
        }
    }

    /// Replace the pre-request delay implementation
    pub fn with_pause(mut self, pause: Arc<dyn Pause>) -> Self {
        self.pause = pause;
        self
    }

    /// Set the results endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the pre-request delay
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Full request URL for `query`
    pub fn search_url(&self, query: &str) -> String {
        format!("{}?q={}", self.endpoint, urlencoding::encode(query))
    }

    /// Search the provider for `query`
    ///
    /// A body carrying the CAPTCHA marker is reported as such whatever the
    /// status code, and is never handed to the extractor.
    pub async fn retrieve(&self, query: &str) -> Result<SearchOutcome, SearchError> {
        self.pause.pause(self.delay).await;

        let url = self.search_url(query);
        debug!("Searching with URL of {} bytes", url.len());

        let response = self
            .client
            .get_html(&url)
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.bytes().await;

        if let Ok(ref bytes) = body {
            if contains_captcha(bytes) {
                return Err(SearchError::CaptchaDetected);
            }
        }

        if status != 200 {
            return Err(SearchError::BadStatus(status));
        }

        let bytes = body.map_err(|e| SearchError::ReadFailure(e.to_string()))?;
        let html = std::str::from_utf8(&bytes)
            .map_err(|e| SearchError::ParseFailure(e.to_string()))?;

        let hits = extract_limited(html, self.max_results.min(MAX_HITS));
        debug!("Search returned {} hits", hits.len());

        Ok(SearchOutcome::from_hits(hits))
    }
}

fn contains_captcha(body: &[u8]) -> bool {
    body.windows(CAPTCHA_MARKER.len())
        .any(|window| window == CAPTCHA_MARKER)
}

#[async_trait]
impl SearchTool for Retriever {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Searches from DuckDuckGo"
    }

    async fn invoke(&self, query: &str) -> Result<SearchOutcome, SearchError> {
        self.retrieve(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{NoPause, SearchHit};
    use std::sync::Mutex;
    use wiremock::matchers::{header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct RecordingPause {
        calls: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Pause for RecordingPause {
        async fn pause(&self, duration: Duration) {
            self.calls.lock().unwrap().push(duration);
        }
    }

    const TWO_RESULTS: &str = r#"<html><body>
        <div class="result__body">
          <h2 class="result__title"><a href="https://go.dev">The Go Programming Language</a></h2>
          <a class="result__snippet">Go is an open source programming language.</a>
        </div>
        <div class="result__body">
          <h2 class="result__title"><a href="https://en.wikipedia.org/wiki/Go">Go (programming language)</a></h2>
          <a class="result__snippet">Go is a statically typed language.</a>
        </div>
        </body></html>"#;

    async fn retriever_for(server: &MockServer) -> Retriever {
        Retriever::new(HttpClient::new().unwrap())
            .with_endpoint(format!("{}/html/", server.uri()))
            .with_pause(Arc::new(NoPause))
    }

    #[test]
    fn test_search_url_encodes_query() {
        let retriever = Retriever::new(HttpClient::new().unwrap());
        assert_eq!(
            retriever.search_url("What is Go?\nUser: a&b"),
            "https://duckduckgo.com/html/?q=What%20is%20Go%3F%0AUser%3A%20a%26b"
        );
    }

    #[test]
    fn test_tool_identity() {
        let retriever = Retriever::new(HttpClient::new().unwrap());
        assert_eq!(retriever.name(), "search");
        assert_eq!(retriever.description(), "Searches from DuckDuckGo");
    }

    #[tokio::test]
    async fn test_retrieve_hits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/html/"))
            .and(query_param("q", "What is Go?"))
            .and(header_exists("User-Agent"))
            .respond_with(ResponseTemplate::new(200).set_body_string(TWO_RESULTS))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = retriever_for(&server).await.retrieve("What is Go?").await.unwrap();

        assert_eq!(
            outcome.hits(),
            &[
                SearchHit::new(
                    "The Go Programming Language",
                    "https://go.dev",
                    "Go is an open source programming language."
                ),
                SearchHit::new(
                    "Go (programming language)",
                    "https://en.wikipedia.org/wiki/Go",
                    "Go is a statically typed language."
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_page_is_no_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let outcome = retriever_for(&server).await.retrieve("nothing").await.unwrap();
        assert_eq!(outcome, SearchOutcome::NoResults);
    }

    #[tokio::test]
    async fn test_captcha_short_circuits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                "<html>Please solve this CAPTCHA {}</html>",
                TWO_RESULTS
            )))
            .mount(&server)
            .await;

        let err = retriever_for(&server).await.retrieve("go").await.unwrap_err();
        assert_eq!(err, SearchError::CaptchaDetected);
    }

    #[tokio::test]
    async fn test_captcha_wins_over_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("CAPTCHA"))
            .mount(&server)
            .await;

        let err = retriever_for(&server).await.retrieve("go").await.unwrap_err();
        assert_eq!(err, SearchError::CaptchaDetected);
    }

    #[tokio::test]
    async fn test_bad_status_carries_code() {
        for code in [202u16, 404, 429, 500, 503] {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(code).set_body_string(TWO_RESULTS))
                .mount(&server)
                .await;

            let err = retriever_for(&server).await.retrieve("go").await.unwrap_err();
            assert_eq!(err, SearchError::BadStatus(code));
        }
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_parse_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x3c, 0xff, 0xfe, 0x3e]))
            .mount(&server)
            .await;

        let err = retriever_for(&server).await.retrieve("go").await.unwrap_err();
        assert!(matches!(err, SearchError::ParseFailure(_)));
    }

    #[tokio::test]
    async fn test_truncated_body_is_read_failure() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n<html>")
                .await
                .unwrap();
        });

        let retriever = Retriever::new(HttpClient::new().unwrap())
            .with_endpoint(format!("http://{}/html/", addr))
            .with_pause(Arc::new(NoPause));

        let err = retriever.retrieve("go").await.unwrap_err();
        assert!(matches!(err, SearchError::ReadFailure(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let retriever = Retriever::new(HttpClient::new().unwrap())
            .with_endpoint("http://127.0.0.1:9/html/")
            .with_pause(Arc::new(NoPause));

        let err = retriever.retrieve("go").await.unwrap_err();
        assert!(matches!(err, SearchError::Network(_)));
    }

    #[tokio::test]
    async fn test_delay_applied_before_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(TWO_RESULTS))
            .mount(&server)
            .await;

        let pause = Arc::new(RecordingPause::default());
        let retriever = retriever_for(&server)
            .await
            .with_delay(Duration::from_secs(2))
            .with_pause(pause.clone());

        retriever.retrieve("go").await.unwrap();
        retriever.retrieve("rust").await.unwrap();

        assert_eq!(
            *pause.calls.lock().unwrap(),
            vec![Duration::from_secs(2), Duration::from_secs(2)]
        );
    }

    #[tokio::test]
    async fn test_long_query_is_fully_encoded() {
        let server = MockServer::start().await;
        let query = "User: what is rust?\nAssistant: a language & more\n".repeat(20);
        Mock::given(method("GET"))
            .and(query_param("q", query.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string(TWO_RESULTS))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = retriever_for(&server).await.retrieve(&query).await.unwrap();
        assert_eq!(outcome.len(), 2);
    }
}
