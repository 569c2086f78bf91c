use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::ExtractionError;
use crate::normalizer::DataPointNormalizer;
use crate::prompt;
use crate::schema::ExtractionResult;

/// Longest slice of an error body kept for diagnostics.
const MAX_ERROR_BODY: usize = 512;

/// Client for a chat-completions style service that returns data points
/// through a forced function call.
#[derive(Clone)]
pub struct StructuredExtractor {
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    tools: Vec<Tool>,
    tool_choice: Value,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct Tool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: FunctionDef,
}

#[derive(Serialize)]
struct FunctionDef {
    name: &'static str,
    description: &'static str,
    parameters: Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ServiceError>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
    function_call: Option<FunctionCall>,
}

#[derive(Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Deserialize)]
struct FunctionCall {
    arguments: String,
}

#[derive(Deserialize)]
struct ServiceError {
    message: String,
}

impl StructuredExtractor {
    pub fn new(base_url: String, model: String, api_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
            temperature: 0.3,
            client: reqwest::Client::new(),
        }
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn build_request<'a>(&'a self, text: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: prompt::system_instruction(),
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            tools: vec![Tool {
                kind: "function",
                function: FunctionDef {
                    name: prompt::FUNCTION_NAME,
                    description: "Record the numeric data points found in the text",
                    parameters: prompt::data_points_schema(),
                },
            }],
            tool_choice: serde_json::json!({
                "type": "function",
                "function": { "name": prompt::FUNCTION_NAME }
            }),
            temperature: self.temperature,
        }
    }

    /// Send `text` to the service and parse the structured payload.
    ///
    /// Makes exactly one request; retrying is left to the caller.
    pub async fn extract(&self, text: &str) -> Result<ExtractionResult, ExtractionError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = self.build_request(text);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "extraction request failed");
                ExtractionError::Transport(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(ExtractionError::Transport)?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "extraction service returned error status");
            return Err(ExtractionError::Status {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        let result = parse_response(&body)?;

        info!(
            model = %self.model,
            data_points = result.data_points.len(),
            "structured extraction complete"
        );

        Ok(result)
    }
}

/// Parse a raw service response body into a normalized result
pub fn parse_response(body: &str) -> Result<ExtractionResult, ExtractionError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ExtractionError::schema_from("response body is not a chat completion", e))?;

    if let Some(error) = response.error {
        return Err(ExtractionError::Service(error.message));
    }

    let message = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| ExtractionError::schema("response has no choices"))?;

    let arguments = message
        .tool_calls
        .into_iter()
        .next()
        .map(|call| call.function)
        .or(message.function_call)
        .map(|f| f.arguments)
        .ok_or_else(|| ExtractionError::schema("response carries no function-call arguments"))?;

    parse_arguments(&arguments)
}

/// Parse function-call arguments into a normalized result
pub fn parse_arguments(arguments: &str) -> Result<ExtractionResult, ExtractionError> {
    let mut result: ExtractionResult = serde_json::from_str(arguments)
        .map_err(|e| ExtractionError::schema_from("function arguments do not match the data point schema", e))?;

    DataPointNormalizer::new().normalize_result(&mut result)?;

    Ok(result)
}

fn truncate(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
