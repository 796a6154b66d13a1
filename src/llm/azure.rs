//! Azure OpenAI assistants client
//!
//! HTTP implementation of [`AssistantClient`] against the Azure OpenAI
//! assistants API (`/openai/assistants`, `/openai/threads/...`).
//!
//! # Example
//!
//! ```no_run
//! use license_assistant::llm::{AssistantClient, AzureAssistantClient, Credential};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AzureAssistantClient::new(
//!     "https://my-resource.openai.azure.com".to_string(),
//!     "gpt-4o".to_string(),
//!     "2024-05-01-preview".to_string(),
//!     Credential::ApiKey("secret".to_string()),
//!     Duration::from_secs(600),
//! )?;
//!
//! let thread_id = client.create_thread().await?;
//! client.add_message(&thread_id, "Hello").await?;
//! # Ok(())
//! # }
//! ```

use super::client::AssistantClient;
use super::error::BackendError;
use super::types::{
    MessageRole, RequiredAction, Run, RunError, RunStatus, ThreadMessage, ToolCall, ToolChoice,
    ToolOutput, SUBMIT_TOOL_OUTPUTS,
};
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, warn};

/// HTTP 429 responses are retried this many times before giving up
const MAX_HTTP_RETRIES: u32 = 5;

/// Used when a 429 response carries no Retry-After header
const DEFAULT_HTTP_RETRY_SECS: u64 = 10;

/// Page size for message listing (service maximum)
const MESSAGE_PAGE_SIZE: u32 = 100;

/// How requests authenticate against the service
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Resource key sent in the `api-key` header
    ApiKey(String),
    /// Entra ID access token sent as `Authorization: Bearer`
    BearerToken(String),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::ApiKey(_) => write!(f, "ApiKey(***)"),
            Credential::BearerToken(_) => write!(f, "BearerToken(***)"),
        }
    }
}

pub struct AzureAssistantClient {
    /// Resource endpoint without trailing slash
    endpoint: String,

    /// Deployment name used as the assistant model
    model: String,

    api_version: String,

    credential: Credential,

    /// Shared HTTP client with connection pooling
    http_client: Client,

    timeout: Duration,
}

impl AzureAssistantClient {
    pub fn new(
        endpoint: String,
        model: String,
        api_version: String,
        credential: Credential,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::ConfigurationError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
            api_version,
            credential,
            http_client,
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/openai/{}", self.endpoint, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credential {
            Credential::ApiKey(key) => request.header("api-key", key),
            Credential::BearerToken(token) => request.bearer_auth(token),
        }
    }

    fn map_transport_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            error!("Service request timed out after {:?}", self.timeout);
            BackendError::TimeoutError {
                seconds: self.timeout.as_secs(),
            }
        } else if e.is_connect() {
            error!("Cannot connect to service at {}", self.endpoint);
            BackendError::NetworkError {
                message: format!("Connection failed: {}", e),
            }
        } else {
            error!("Service request error: {}", e);
            BackendError::NetworkError {
                message: format!("Request failed: {}", e),
            }
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T, BackendError> {
        let mut attempt = 0;

        loop {
            let mut request = self
                .http_client
                .request(method.clone(), self.url(path))
                .query(&[("api-version", self.api_version.as_str())])
                .query(query);
            request = self.authorize(request);
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!(%method, path, attempt, "Sending assistants request");

            let response = request
                .send()
                .await
                .map_err(|e| self.map_transport_error(e))?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok());

                if attempt < MAX_HTTP_RETRIES {
                    attempt += 1;
                    let delay = retry_after.unwrap_or(DEFAULT_HTTP_RETRY_SECS);
                    warn!(
                        path,
                        attempt, delay, "Service throttled request, retrying after delay"
                    );
                    tokio::time::sleep(Duration::from_secs(delay)).await;
                    continue;
                }

                return Err(BackendError::RateLimitError { retry_after });
            }

            let text = response
                .text()
                .await
                .map_err(|e| self.map_transport_error(e))?;

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(BackendError::AuthenticationError {
                    message: format!("HTTP {}: {}", status, text),
                });
            }

            if !status.is_success() {
                error!("Service returned error status {}: {}", status, text);
                return Err(BackendError::ApiError {
                    message: format!("HTTP {}: {}", status, text),
                    status_code: Some(status.as_u16()),
                });
            }

            return serde_json::from_str(&text).map_err(|e| BackendError::InvalidResponse {
                message: format!("JSON parse error: {}", e),
                raw_response: Some(text),
            });
        }
    }
}

#[async_trait]
impl AssistantClient for AzureAssistantClient {
    async fn create_assistant(
        &self,
        name: &str,
        instructions: &str,
        tools: &[Value],
    ) -> Result<String, BackendError> {
        let body = json!({
            "name": name,
            "instructions": instructions,
            "tools": tools,
            "model": self.model,
        });
        let created: IdObject = self.send(Method::POST, "assistants", &[], Some(&body)).await?;
        debug!(assistant_id = %created.id, "Created assistant");
        Ok(created.id)
    }

    async fn create_thread(&self) -> Result<String, BackendError> {
        let created: IdObject = self
            .send(Method::POST, "threads", &[], Some(&json!({})))
            .await?;
        debug!(thread_id = %created.id, "Created thread");
        Ok(created.id)
    }

    async fn add_message(&self, thread_id: &str, content: &str) -> Result<(), BackendError> {
        let body = json!({ "role": "user", "content": content });
        let _: IdObject = self
            .send(
                Method::POST,
                &format!("threads/{}/messages", thread_id),
                &[],
                Some(&body),
            )
            .await?;
        Ok(())
    }

    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        tool_choice: &ToolChoice,
    ) -> Result<Run, BackendError> {
        let mut body = json!({ "assistant_id": assistant_id });
        if *tool_choice != ToolChoice::Auto {
            body["tool_choice"] = tool_choice.to_json();
        }
        let run: WireRun = self
            .send(
                Method::POST,
                &format!("threads/{}/runs", thread_id),
                &[],
                Some(&body),
            )
            .await?;
        Ok(run.into())
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, BackendError> {
        let run: WireRun = self
            .send(
                Method::GET,
                &format!("threads/{}/runs/{}", thread_id, run_id),
                &[],
                None,
            )
            .await?;
        Ok(run.into())
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run, BackendError> {
        let run: WireRun = self
            .send(
                Method::POST,
                &format!("threads/{}/runs/{}/cancel", thread_id, run_id),
                &[],
                None,
            )
            .await?;
        Ok(run.into())
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run, BackendError> {
        let body = json!({ "tool_outputs": outputs });
        let run: WireRun = self
            .send(
                Method::POST,
                &format!("threads/{}/runs/{}/submit_tool_outputs", thread_id, run_id),
                &[],
                Some(&body),
            )
            .await?;
        Ok(run.into())
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, BackendError> {
        let path = format!("threads/{}/messages", thread_id);
        let mut messages = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut query = vec![
                ("order", "asc".to_string()),
                ("limit", MESSAGE_PAGE_SIZE.to_string()),
            ];
            if let Some(cursor) = &after {
                query.push(("after", cursor.clone()));
            }

            let page: WireMessageList = self.send(Method::GET, &path, &query, None).await?;
            messages.extend(page.data.into_iter().map(ThreadMessage::from));

            match (page.has_more, page.last_id) {
                (true, Some(last_id)) => after = Some(last_id),
                _ => break,
            }
        }

        Ok(messages)
    }

    fn name(&self) -> &str {
        "azure-openai"
    }
}

impl fmt::Debug for AzureAssistantClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureAssistantClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_version", &self.api_version)
            .field("credential", &self.credential)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct IdObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct WireRun {
    id: String,
    thread_id: String,
    status: RunStatus,
    #[serde(default)]
    required_action: Option<WireRequiredAction>,
    #[serde(default)]
    last_error: Option<RunError>,
}

#[derive(Debug, Deserialize)]
struct WireRequiredAction {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    submit_tool_outputs: Option<WireSubmitToolOutputs>,
}

#[derive(Debug, Deserialize)]
struct WireSubmitToolOutputs {
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct WireMessageList {
    data: Vec<WireMessage>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    last_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    role: MessageRole,
    #[serde(default)]
    content: Vec<WireContent>,
}

#[derive(Debug, Deserialize)]
struct WireContent {
    #[serde(default)]
    text: Option<WireText>,
}

#[derive(Debug, Deserialize)]
struct WireText {
    value: String,
}

impl From<WireRun> for Run {
    fn from(wire: WireRun) -> Self {
        let required_action = wire
            .required_action
            .map(|action| match action.submit_tool_outputs {
                Some(submit) if action.kind == SUBMIT_TOOL_OUTPUTS => {
                    RequiredAction::SubmitToolOutputs {
                        tool_calls: submit
                            .tool_calls
                            .into_iter()
                            .map(|call| {
                                ToolCall::new(call.id, call.function.name, call.function.arguments)
                            })
                            .collect(),
                    }
                }
                _ => RequiredAction::Unsupported { kind: action.kind },
            });

        Run {
            id: wire.id,
            thread_id: wire.thread_id,
            status: wire.status,
            required_action,
            last_error: wire.last_error,
        }
    }
}

impl From<WireMessage> for ThreadMessage {
    fn from(wire: WireMessage) -> Self {
        let content = wire
            .content
            .into_iter()
            .filter_map(|part| part.text.map(|t| t.value))
            .collect::<Vec<_>>()
            .join("\n");

        ThreadMessage {
            role: wire.role,
            content,
        }
    }
}
