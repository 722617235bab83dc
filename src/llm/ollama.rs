use super::traits::{CompletionError, CompletionRequest, CompletionService, Delivery};
use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::time::Duration;
use url::Url;

const OLLAMA_CONNECTION_ERROR: &str = "No running Ollama server detected. Start it with: `ollama serve` (after installing). Install instructions: https://github.com/ollama/ollama";

/// One line of the NDJSON body returned by `/api/generate`
#[derive(Debug, Default, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

/// Ollama client for local model inference.
///
/// Expects a running Ollama server (see https://github.com/ollama/ollama).
/// Answers are requested in streaming mode and returned as fragments.
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    /// Create a new client. Does not contact the server; see [`OllamaClient::probe`].
    pub fn new(base_url: &str, model: &str) -> Result<Self, CompletionError> {
        if model.trim().is_empty() {
            return Err(CompletionError::Other("model name must not be empty".to_string()));
        }
        Url::parse(base_url).map_err(|e| {
            CompletionError::Other(format!("invalid Ollama URL '{}': {}", base_url, e))
        })?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| CompletionError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    /// Check the server is reachable and report whether the model is installed
    pub async fn probe(&self) -> Result<bool, CompletionError> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|_| CompletionError::Transport(OLLAMA_CONNECTION_ERROR.to_string()))?;

        if !resp.status().is_success() {
            return Err(CompletionError::Transport(OLLAMA_CONNECTION_ERROR.to_string()));
        }

        let val: JsonValue = resp
            .json()
            .await
            .map_err(|e| CompletionError::Other(format!("Failed to parse models response: {}", e)))?;

        let installed = val
            .get("models")
            .and_then(|m| m.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.get("name").and_then(|n| n.as_str()))
                    .any(|name| {
                        name == self.model || name.split(':').next() == Some(self.model.as_str())
                    })
            })
            .unwrap_or(false);

        Ok(installed)
    }
}

/// Parse one NDJSON line; blank lines yield `None`
fn parse_line(line: &[u8]) -> Result<Option<GenerateChunk>, CompletionError> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let chunk: GenerateChunk = serde_json::from_str(line)
        .map_err(|e| CompletionError::Other(format!("Failed to parse response: {}", e)))?;

    if let Some(error) = chunk.error {
        return Err(CompletionError::Other(error));
    }
    Ok(Some(chunk))
}

#[async_trait]
impl CompletionService for OllamaClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Delivery, CompletionError> {
        let url = format!("{}/api/generate", self.base_url);
        let payload = json!({
            "model": self.model,
            "prompt": request.prompt,
            "stream": true,
            "options": { "temperature": request.temperature }
        });

        let resp = self.client.post(&url).json(&payload).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CompletionError::Other(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let mut fragments = Vec::new();
        let mut buffer: Vec<u8> = Vec::new();
        let mut stream = resp.bytes_stream();

        'read: while let Some(chunk) = stream.next().await {
            buffer.extend_from_slice(&chunk?);

            while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                if let Some(chunk) = parse_line(&line)? {
                    if !chunk.response.is_empty() {
                        fragments.push(chunk.response);
                    }
                    if chunk.done {
                        break 'read;
                    }
                }
            }
        }

        if let Some(chunk) = parse_line(&buffer)? {
            if !chunk.response.is_empty() {
                fragments.push(chunk.response);
            }
        }

        tracing::debug!("Ollama streamed {} fragments", fragments.len());

        Ok(Delivery::Streamed {
            fragments,
            echo: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const STREAM_BODY: &str = concat!(
        "{\"model\":\"llama3.1\",\"response\":\"Go is \",\"done\":false}\n",
        "{\"model\":\"llama3.1\",\"response\":\"a language.\",\"done\":false}\n",
        "{\"model\":\"llama3.1\",\"response\":\"\",\"done\":true,\"eval_count\":7}\n",
    );

    #[test]
    fn test_new_rejects_bad_config() {
        assert!(OllamaClient::new("not a url", "llama3.1").is_err());
        assert!(OllamaClient::new("http://localhost:11434", "").is_err());
        assert!(OllamaClient::new("http://localhost:11434/", "llama3.1").is_ok());
    }

    #[test]
    fn test_parse_line() {
        assert!(parse_line(b"  \n").unwrap().is_none());

        let chunk = parse_line(b"{\"response\":\"hi\",\"done\":false}\n")
            .unwrap()
            .unwrap();
        assert_eq!(chunk.response, "hi");
        assert!(!chunk.done);

        let err = parse_line(b"{\"error\":\"model 'x' not found\"}").unwrap_err();
        assert_eq!(err, CompletionError::Other("model 'x' not found".to_string()));

        assert!(parse_line(b"not json").is_err());
    }

    #[tokio::test]
    async fn test_complete_streams_fragments() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama3.1",
                "stream": true,
                "options": { "temperature": 0.5 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(STREAM_BODY))
            .expect(1)
            .mount(&server)
            .await;

        let client = OllamaClient::new(&server.uri(), "llama3.1").unwrap();
        let delivery = client
            .complete(&CompletionRequest::new("What is Go?", 0.5))
            .await
            .unwrap();

        assert_eq!(
            delivery,
            Delivery::Streamed {
                fragments: vec!["Go is ".to_string(), "a language.".to_string()],
                echo: None,
            }
        );
        assert_eq!(delivery.into_text(), "Go is a language.");
    }

    #[tokio::test]
    async fn test_complete_reports_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let client = OllamaClient::new(&server.uri(), "llama3.1").unwrap();
        let err = client
            .complete(&CompletionRequest::new("hi", 0.5))
            .await
            .unwrap_err();

        assert_eq!(err, CompletionError::Other("HTTP 404: model not found".to_string()));
    }

    #[tokio::test]
    async fn test_probe_finds_model() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "models": [{ "name": "llama3.1:latest" }]
            })))
            .mount(&server)
            .await;

        let client = OllamaClient::new(&server.uri(), "llama3.1").unwrap();
        assert!(client.probe().await.unwrap());

        let other = OllamaClient::new(&server.uri(), "mistral").unwrap();
        assert!(!other.probe().await.unwrap());
    }

    #[tokio::test]
    async fn test_probe_without_server() {
        let client = OllamaClient::new("http://127.0.0.1:9", "llama3.1").unwrap();
        assert!(matches!(
            client.probe().await,
            Err(CompletionError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_without_server_is_transport_error() {
        let client = OllamaClient::new("http://127.0.0.1:9", "llama3.1").unwrap();
        let err = client
            .complete(&CompletionRequest::new("hi", 0.5))
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::Transport(_)));
    }
}
