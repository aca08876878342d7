//! OpenAI API client for chat completions.
//!
//! This module provides an HTTP client for the OpenAI chat completions API,
//! used for meeting summarization (structured JSON mode) and transcript chat
//! (plain-text mode).

use crate::error::{DomainErrorKind, Error, ExternalErrorKind, InternalErrorKind};
use crate::gateway::llm::{ChatMessage, ChatProvider, CompletionRequest, ResponseFormat};
use async_trait::async_trait;
use log::*;
use serde::{Deserialize, Serialize};

/// Request body for the chat completions endpoint
#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormatBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ResponseFormatBody {
    #[serde(rename = "type")]
    format_type: &'static str,
}

/// Response from the chat completions endpoint
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI API client
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    /// Create a new OpenAI client with the given API key, base URL, and model
    pub fn new(api_key: &str, base_url: &str, model: &str) -> Result<Self, Error> {
        let mut headers = reqwest::header::HeaderMap::new();

        let auth_value = format!("Bearer {}", api_key);
        let mut header_value =
            reqwest::header::HeaderValue::from_str(&auth_value).map_err(|e| {
                warn!("Failed to create auth header: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                        "Invalid API key format".to_string(),
                    )),
                }
            })?;
        header_value.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, header_value);

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, Error> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = ChatCompletionBody {
            model: &self.model,
            messages: &request.messages,
            response_format: match request.response_format {
                ResponseFormat::JsonObject => Some(ResponseFormatBody {
                    format_type: "json_object",
                }),
                ResponseFormat::Text => None,
            },
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(
            "Requesting chat completion: model={}, messages={}",
            self.model,
            request.messages.len()
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to call OpenAI chat completions: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
                }
            })?;

        if response.status().is_success() {
            let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
                warn!("Failed to parse OpenAI response: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::External(ExternalErrorKind::Other(
                        "Invalid response from OpenAI".to_string(),
                    )),
                }
            })?;

            let content = completion
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .unwrap_or_default();

            Ok(content)
        } else {
            let error_text = response.text().await.unwrap_or_default();
            error!("OpenAI API: {}", error_text);
            Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::Other(error_text)),
            })
        }
    }

    fn provider_id(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::llm::ChatMessage;

    #[tokio::test]
    async fn complete_returns_first_choice_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_body(
                r#"{"choices": [{"message": {"role": "assistant", "content": "hello there"}}]}"#,
            )
            .create_async()
            .await;

        let client = OpenAiClient::new("test-key", &server.url(), "gpt-4o-mini").unwrap();
        let content = client
            .complete(CompletionRequest::text(vec![ChatMessage::user("hi")]))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(content, "hello there");
    }

    #[tokio::test]
    async fn structured_requests_set_json_object_response_format() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "response_format": {"type": "json_object"}
            })))
            .with_status(200)
            .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": "{}"}}]}"#)
            .create_async()
            .await;

        let client = OpenAiClient::new("test-key", &server.url(), "gpt-4o-mini").unwrap();
        client
            .complete(CompletionRequest::structured_json(vec![ChatMessage::user(
                "analyze",
            )]))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn provider_error_status_surfaces_as_external_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body("upstream blew up")
            .create_async()
            .await;

        let client = OpenAiClient::new("test-key", &server.url(), "gpt-4o-mini").unwrap();
        let result = client
            .complete(CompletionRequest::text(vec![ChatMessage::user("hi")]))
            .await;

        assert!(matches!(
            result.unwrap_err().error_kind,
            DomainErrorKind::External(ExternalErrorKind::Other(_))
        ));
    }
}
