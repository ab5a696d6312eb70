//! Thin HTTP client for the feedback API

use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The service answered with `success: false`
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    /// This command needs `--token` or `FEEDBACK_TOKEN`
    #[error("No token given; run `feedback login` and set FEEDBACK_TOKEN")]
    MissingToken,

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected response (HTTP {status}): {body}")]
    Malformed { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// A decoded success envelope with the raw JSON kept for `--json`
#[derive(Debug, Clone)]
pub struct Envelope {
    pub status: StatusCode,
    pub raw: Value,
}

impl Envelope {
    /// Check the `success` flag and turn failures into [`ClientError::Api`]
    pub fn from_body(status: StatusCode, body: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(body).map_err(|_| ClientError::Malformed {
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        })?;

        match raw.get("success").and_then(Value::as_bool) {
            Some(true) => Ok(Self { status, raw }),
            Some(false) => {
                let message = raw
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Request failed")
                    .to_string();
                Err(ClientError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
            None => Err(ClientError::Malformed {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            }),
        }
    }

    /// Decode `data` (or another top-level field) into `T`
    pub fn field<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let value = self.raw.get(name).cloned().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| ClientError::Malformed {
            status: self.status.as_u16(),
            body: format!("field `{}`: {}", name, e),
        })
    }

    pub fn data<T: DeserializeOwned>(&self) -> Result<T> {
        self.field("data")
    }

    pub fn message(&self) -> Option<&str> {
        self.raw.get("message").and_then(Value::as_str)
    }
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|source| ClientError::Transport {
                url: base_url.to_string(),
                source,
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str, authenticated: bool) -> Result<RequestBuilder> {
        let builder = self.http.request(method, self.url(path));
        if !authenticated {
            return Ok(builder);
        }
        let token = self.token.as_deref().ok_or(ClientError::MissingToken)?;
        Ok(builder.bearer_auth(token))
    }

    async fn send(&self, builder: RequestBuilder, path: &str) -> Result<Envelope> {
        let transport = |source| ClientError::Transport {
            url: self.url(path),
            source,
        };
        let response = builder.send().await.map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        Envelope::from_body(status, &body)
    }

    /// GET with the bearer token
    pub async fn get(&self, path: &str) -> Result<Envelope> {
        let builder = self.request(Method::GET, path, true)?;
        self.send(builder, path).await
    }

    /// Authenticated GET with `query` appended
    pub async fn get_query<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> Result<Envelope> {
        let builder = self.request(Method::GET, path, true)?.query(query);
        self.send(builder, path).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Envelope> {
        let builder = self.request(Method::POST, path, false)?.json(body);
        self.send(builder, path).await
    }

    pub async fn delete(&self, path: &str) -> Result<Envelope> {
        let builder = self.request(Method::DELETE, path, true)?;
        self.send(builder, path).await
    }

    /// Raw probe call; health endpoints do not use the envelope
    pub async fn probe(&self, path: &str) -> Result<(StatusCode, Value)> {
        let url = self.url(path);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ClientError::Transport { url, source })?;
        let value = serde_json::from_str(&body).map_err(|_| ClientError::Malformed {
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        })?;
        Ok((status, value))
    }
}

/// Percent-encode one path segment
pub fn path_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
