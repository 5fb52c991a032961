use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BackendError, Result};

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: String,
}

#[derive(Serialize)]
struct IngestRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct IngestResponse {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<Value>,
}

/// HTTP client for the assistant backend (`/`, `/chat`, `/ingest`)
#[derive(Clone, Debug)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Liveness probe. Any 2xx answer counts as alive.
    pub async fn probe(&self) -> Result<()> {
        let url = format!("{}/", self.base_url);
        let response = self.client.get(&url).send().await?;
        check_status(response).await?;
        Ok(())
    }

    pub async fn chat(&self, message: &str) -> Result<String> {
        let url = format!("{}/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { message })
            .send()
            .await?;

        let chat_response: ChatResponse = check_status(response).await?.json().await?;
        Ok(chat_response.response)
    }

    pub async fn ingest(&self, text: &str) -> Result<()> {
        let url = format!("{}/ingest", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&IngestRequest { text })
            .send()
            .await?;

        let response = check_status(response).await?;

        // The body is informational only; an empty or odd body is still a success.
        if let Ok(IngestResponse { message: Some(message) }) = response.json::<IngestResponse>().await {
            tracing::debug!(%message, "ingest acknowledged");
        }
        Ok(())
    }
}

/// Turn a non-2xx response into [`BackendError::Api`], pulling `detail` out
/// of the body when the backend sent one.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.detail)
        .map(|detail| match detail {
            Value::String(s) => s,
            other => other.to_string(),
        });

    Err(BackendError::Api { status, detail })
}
