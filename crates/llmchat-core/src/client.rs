use std::path::PathBuf;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::attachments::PendingFile;
use crate::state::ChatMessage;

pub const DEFAULT_ENDPOINT: &str = "/llm";

/// How much of a non-JSON body is echoed back in the error.
const BODY_SNIPPET_CHARS: usize = 100;

/// JSON body of a text request, tagged by backend action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LlmRequest {
    Chat {
        prompt: String,
        history: Vec<ChatMessage>,
    },
    Generate {
        prompt: String,
    },
    Search {
        query: String,
    },
    ScrapeSite {
        url: String,
        question: String,
        max_pages: u32,
    },
}

impl LlmRequest {
    pub fn action(&self) -> &'static str {
        match self {
            LlmRequest::Chat { .. } => "chat",
            LlmRequest::Generate { .. } => "generate",
            LlmRequest::Search { .. } => "search",
            LlmRequest::ScrapeSite { .. } => "scrape_site",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LlmReply {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl LlmReply {
    /// Text shown in place of the assistant placeholder.
    pub fn into_message(self) -> String {
        match self.response {
            Some(text) if !text.is_empty() => text,
            _ => format!(
                "Error: {}",
                self.error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| "No response".to_string())
            ),
        }
    }

    // Anything that isn't an object reads as an empty reply.
    fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("Non-JSON response: {0}")]
    NonJson(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("could not read {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    base_url: String,
    endpoint: String,
}

impl LlmClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = if endpoint.starts_with('/') {
            endpoint.to_string()
        } else {
            format!("/{}", endpoint)
        };
        self
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, self.endpoint)
    }

    /// POST a JSON request.
    ///
    /// 200 and 409 hand back the body; 401 and every other status become an
    /// error carrying whatever message the body offers.
    pub async fn send(&self, request: &LlmRequest) -> Result<LlmReply, ClientError> {
        let url = self.url();
        tracing::info!(action = request.action(), %url, "sending request");

        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        tracing::debug!(status = status.as_u16(), bytes = text.len(), "response received");

        let body: Value =
            serde_json::from_str(&text).map_err(|_| ClientError::NonJson(snippet(&text)))?;

        match status {
            StatusCode::OK | StatusCode::CONFLICT => Ok(LlmReply::from_value(body)),
            StatusCode::UNAUTHORIZED => {
                let message = body
                    .pointer("/result/message")
                    .and_then(Value::as_str)
                    .unwrap_or("Not Authenticated");
                Err(ClientError::Unauthorized(message.to_string()))
            }
            _ => {
                let message = ["message", "error"]
                    .iter()
                    .find_map(|key| body.get(*key).and_then(Value::as_str))
                    .unwrap_or("Unknown error occurred");
                tracing::warn!(status = status.as_u16(), reason = message, "request rejected");
                Err(ClientError::Status {
                    status: status.as_u16(),
                    message: message.to_string(),
                })
            }
        }
    }

    /// POST a multipart form with the prompt and one `file` part per file.
    pub async fn send_files(
        &self,
        prompt: &str,
        files: &[PendingFile],
    ) -> Result<LlmReply, ClientError> {
        let mut form = Form::new()
            .text("prompt", prompt.to_string())
            .text("action", "file_processing");

        for file in files {
            let bytes = tokio::fs::read(&file.path)
                .await
                .map_err(|source| ClientError::File {
                    path: file.path.clone(),
                    source,
                })?;
            let part = Part::bytes(bytes)
                .file_name(file.name.clone())
                .mime_str(file.mime_type())?;
            form = form.part("file", part);
        }

        let url = self.url();
        tracing::info!(action = "file_processing", files = files.len(), %url, "sending files");

        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("application/json"))
            .unwrap_or(false);
        let text = response.text().await?;
        tracing::debug!(status = status.as_u16(), is_json, "file response received");

        if !status.is_success() || !is_json {
            return Err(ClientError::NonJson(snippet(&text)));
        }

        let body: Value =
            serde_json::from_str(&text).map_err(|_| ClientError::NonJson(snippet(&text)))?;
        Ok(LlmReply::from_value(body))
    }
}

fn snippet(text: &str) -> String {
    text.chars().take(BODY_SNIPPET_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_request_shape() {
        let request = LlmRequest::Chat {
            prompt: "hi".to_string(),
            history: vec![ChatMessage::user("hi")],
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "action": "chat",
                "prompt": "hi",
                "history": [{"role": "user", "content": "hi"}]
            })
        );
    }

    #[test]
    fn test_scrape_request_shape() {
        let request = LlmRequest::ScrapeSite {
            url: "https://example.com".to_string(),
            question: "what is it?".to_string(),
            max_pages: 5,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "action": "scrape_site",
                "url": "https://example.com",
                "question": "what is it?",
                "max_pages": 5
            })
        );
    }

    #[test]
    fn test_search_and_generate_shapes() {
        let search = LlmRequest::Search {
            query: "top news".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&search).unwrap(),
            json!({"action": "search", "query": "top news"})
        );
        let generate = LlmRequest::Generate {
            prompt: "a haiku".to_string(),
        };
        assert_eq!(generate.action(), "generate");
        assert_eq!(
            serde_json::to_value(&generate).unwrap(),
            json!({"action": "generate", "prompt": "a haiku"})
        );
    }

    #[test]
    fn test_reply_prefers_response() {
        let reply = LlmReply {
            response: Some("answer".to_string()),
            error: Some("ignored".to_string()),
        };
        assert_eq!(reply.into_message(), "answer");
    }

    #[test]
    fn test_reply_falls_back_to_error_then_no_response() {
        let reply = LlmReply {
            response: Some(String::new()),
            error: Some("No prompt provided".to_string()),
        };
        assert_eq!(reply.into_message(), "Error: No prompt provided");
        assert_eq!(LlmReply::default().into_message(), "Error: No response");
    }

    #[test]
    fn test_non_object_body_reads_as_empty_reply() {
        assert_eq!(LlmReply::from_value(json!(null)), LlmReply::default());
        assert_eq!(LlmReply::from_value(json!("text")), LlmReply::default());
        assert_eq!(LlmReply::from_value(json!({"response": 3})), LlmReply::default());
    }

    #[test]
    fn test_snippet_is_char_bounded() {
        let long = "é".repeat(250);
        assert_eq!(snippet(&long).chars().count(), BODY_SNIPPET_CHARS);
        assert_eq!(snippet("short"), "short");
    }

    #[test]
    fn test_url_joins_base_and_endpoint() {
        let client = LlmClient::new("http://localhost:5000/");
        assert_eq!(client.url(), "http://localhost:5000/llm");
        let client = client.with_endpoint("api/llm");
        assert_eq!(client.url(), "http://localhost:5000/api/llm");
    }

    #[test]
    fn test_error_messages_are_user_facing() {
        assert_eq!(
            ClientError::NonJson("<html>".to_string()).to_string(),
            "Non-JSON response: <html>"
        );
        assert_eq!(
            ClientError::Status {
                status: 500,
                message: "boom".to_string()
            }
            .to_string(),
            "boom"
        );
    }
}
