//! OpenAI-compatible chat-completion client.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{CaseGenerator, GenerateError, prompt};
use crate::version::UNITGEN_VERSION;

/// Endpoint, model and credentials for [`OpenAiGenerator`].
///
/// Nothing here is read from the environment; the CLI fills it in from flags.
#[derive(Clone)]
pub struct GeneratorConfig {
    pub api_key: Option<String>,
    pub model: String,
    /// Base of the API; `/chat/completions` is appended.
    pub base_url: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.0,
            timeout: Duration::from_secs(60),
        }
    }
}

impl GeneratorConfig {
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
enum Role {
    System,
    User,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// First choice's content, exactly as the model wrote it.
fn decode_response(body: &str) -> Result<String, GenerateError> {
    let response: ChatResponse = serde_json::from_str(body)?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(GenerateError::EmptyResponse)
}

/// Local endpoints (a self-hosted model, a test server) are never reached through a proxy.
fn is_loopback(base_url: &str) -> bool {
    reqwest::Url::parse(base_url)
        .ok()
        .and_then(|url| url.host_str().map(|host| matches!(host, "localhost" | "127.0.0.1" | "[::1]")))
        .unwrap_or(false)
}

// ============================================================================
// Client
// ============================================================================

/// Generates cases with one blocking chat-completion request per source.
pub struct OpenAiGenerator {
    config: GeneratorConfig,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl OpenAiGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, GenerateError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(GenerateError::MissingApiKey)?;
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(format!("unitgen/{UNITGEN_VERSION}"))
            .timeout(config.timeout);
        if is_loopback(&config.base_url) {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;
        Ok(Self { config, api_key, client })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }
}

impl CaseGenerator for OpenAiGenerator {
    #[tracing::instrument(skip_all, fields(model = %self.config.model, source_len = source.len()))]
    fn generate(&self, source: &str) -> Result<String, GenerateError> {
        let user_prompt = prompt::render(source);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: Role::System,
                    content: prompt::SYSTEM_MESSAGE,
                },
                ChatMessage {
                    role: Role::User,
                    content: &user_prompt,
                },
            ],
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "model endpoint rejected the request");
            return Err(GenerateError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let cases = decode_response(&body)?;
        tracing::info!(lines = cases.lines().count(), "received generated cases");
        Ok(cases)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    /// Serve one HTTP response on a local port; returns the base URL and a handle yielding the raw request.
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}/v1", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut head = String::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                head.push_str(&line);
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            let mut request_body = vec![0; content_length];
            reader.read_exact(&mut request_body).unwrap();
            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            reader.get_mut().write_all(response.as_bytes()).unwrap();
            head + &String::from_utf8(request_body).unwrap()
        });
        (base_url, handle)
    }

    #[test]
    fn test_missing_api_key() {
        assert!(matches!(
            OpenAiGenerator::new(GeneratorConfig::default()),
            Err(GenerateError::MissingApiKey)
        ));
        assert!(matches!(
            OpenAiGenerator::new(GeneratorConfig::default().with_api_key("  ")),
            Err(GenerateError::MissingApiKey)
        ));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = GeneratorConfig::default().with_api_key("sk-secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"), "{rendered}");
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let config = GeneratorConfig::default().with_base_url("http://localhost:8080/v1/");
        assert_eq!(config.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: vec![ChatMessage {
                role: Role::System,
                content: "hi",
            }],
            temperature: 0.0,
        };
        insta::assert_snapshot!(serde_json::to_string(&request).unwrap(), @r#"{"model":"gpt-3.5-turbo","messages":[{"role":"system","content":"hi"}],"temperature":0.0}"#);
    }

    #[test]
    fn test_decode_response() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"```python\nadd(1, 2)\n```"}}]}"#;
        assert_eq!(decode_response(body).unwrap(), "```python\nadd(1, 2)\n```");
        assert!(matches!(decode_response(r#"{"choices":[]}"#), Err(GenerateError::EmptyResponse)));
        assert!(matches!(
            decode_response(r#"{"choices":[{"message":{"content":null}}]}"#),
            Err(GenerateError::EmptyResponse)
        ));
        assert!(matches!(
            decode_response(r#"{"choices":[{"message":{"content":" \n"}}]}"#),
            Err(GenerateError::EmptyResponse)
        ));
        assert!(matches!(decode_response("not json"), Err(GenerateError::Decode(_))));
    }

    #[test]
    fn test_generate_against_local_endpoint() {
        let (base_url, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"choices":[{"message":{"content":"add(1, 2)\nadd(-1, 1)"}}]}"#,
        );
        let config = GeneratorConfig::default().with_api_key("sk-test").with_base_url(base_url);
        let generator = OpenAiGenerator::new(config).unwrap();
        let cases = generator.generate("def add(a, b):\n    return a + b\n").unwrap();
        assert_eq!(cases, "add(1, 2)\nadd(-1, 1)");

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /v1/chat/completions "), "{request}");
        assert!(request.to_ascii_lowercase().contains("authorization: bearer sk-test"));
        assert!(request.contains(r#""model":"gpt-3.5-turbo""#));
        assert!(request.contains("You are a helpful assistant."));
    }

    #[test]
    fn test_generate_reports_http_status() {
        let (base_url, server) = serve_once("HTTP/1.1 401 Unauthorized", r#"{"error":"bad key"}"#);
        let config = GeneratorConfig::default().with_api_key("sk-test").with_base_url(base_url);
        let err = OpenAiGenerator::new(config).unwrap().generate("x = 1").unwrap_err();
        server.join().unwrap();
        match err {
            GenerateError::Status { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("bad key"));
            }
            other => panic!("expected a status error, got {other:?}"),
        }
    }
}
