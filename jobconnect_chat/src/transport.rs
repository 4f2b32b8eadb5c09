use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Reply text (and optional citations) returned by the completion endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

impl Reply {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(String),
    #[error("Endpoint responded with status {0}")]
    Status(u16),
    #[error("Failed to decode response body: {0}")]
    Decode(String),
}

pub trait Transport {
    fn complete(&self, message: &str)
    -> impl Future<Output = Result<Reply, TransportError>> + Send;

    fn boxed(self) -> Box<dyn TransportDyn>
    where
        Self: Sized + Send + Sync + 'static,
    {
        Box::new(self)
    }
}

pub trait TransportDyn: Send + Sync {
    fn complete<'a>(
        &'a self,
        message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Reply, TransportError>> + Send + 'a>>;
}

impl<T: Transport + Send + Sync + 'static> TransportDyn for T {
    fn complete<'a>(
        &'a self,
        message: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Reply, TransportError>> + Send + 'a>> {
        Box::pin(Transport::complete(self, message))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// POSTs `{"message": ...}` as JSON to a single chat endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Same as [`HttpTransport::new`] with a whole-request timeout. `None` waits forever.
    pub fn with_timeout(url: impl Into<String>, timeout: Option<Duration>) -> eyre::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            url: url.into(),
            client: builder.build()?,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for HttpTransport {
    async fn complete(&self, message: &str) -> Result<Reply, TransportError> {
        tracing::debug!(url = %self.url, "POST chat message");
        let response = self
            .client
            .post(&self.url)
            .json(&ChatRequest { message })
            .send()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;
        parse_reply(&body)
    }
}

/// Accepts either a bare JSON string or an object with a `reply` string.
/// Any other shape decodes to an empty reply.
pub fn parse_reply(body: &str) -> Result<Reply, TransportError> {
    let value: Value =
        serde_json::from_str(body).map_err(|err| TransportError::Decode(err.to_string()))?;
    let reply = match value {
        Value::String(text) => Reply::new(text),
        Value::Object(map) => {
            let text = map
                .get("reply")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            let sources = map
                .get("sources")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default();
            Reply { text, sources }
        }
        _ => Reply::default(),
    };
    Ok(reply)
}
