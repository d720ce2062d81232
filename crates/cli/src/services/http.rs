use std::time::Duration;

use flowbid_core::error::ServiceError;
use reqwest::{Client, Method, RequestBuilder, Response, Url, header::HeaderMap};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;

/// Custody submissions wait for confirmation server side.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// JSON-over-HTTP client shared by the custody and auction service wrappers.
#[derive(Debug, Clone)]
pub struct JsonApi {
    client: Client,
    base_url: Url,
    service: &'static str,
}

impl JsonApi {
    pub fn new(
        service: &'static str,
        base_url: &str,
        headers: HeaderMap,
    ) -> Result<Self, ServiceError> {
        let base_url = Url::parse(base_url).map_err(|err| ServiceError::Decode {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| request_error(&Method::GET, base_url.as_str(), err))?;

        Ok(Self {
            client,
            base_url,
            service,
        })
    }

    pub fn url(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url.join(path).map_err(|err| ServiceError::Decode {
            url: format!("{}{path}", self.base_url),
            reason: err.to_string(),
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        let url = self.url(path)?;
        let request = self.client.get(url.clone());
        self.send(Method::GET, url, request).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ServiceError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        let request = self.client.post(url.clone()).json(body);
        self.send(Method::POST, url, request).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        request: RequestBuilder,
    ) -> Result<T, ServiceError> {
        debug!(service = self.service, %method, %url, "http request");
        let response = request
            .send()
            .await
            .map_err(|err| request_error(&method, url.as_str(), err))?;
        let status = response.status();
        let body = read_body(response, &method, &url).await?;

        if !status.is_success() {
            let fallback = format!(
                "{} API error: {} {}",
                self.service,
                status.as_u16(),
                status.canonical_reason().unwrap_or_default()
            );
            return Err(ServiceError::Status {
                status: status.as_u16(),
                method: method.to_string(),
                url: url.to_string(),
                message: error_message(&body).unwrap_or(fallback),
            });
        }

        serde_json::from_value(body).map_err(|err| ServiceError::Decode {
            url: url.to_string(),
            reason: err.to_string(),
        })
    }
}

/// Empty bodies read as `null`; non-JSON bodies are kept as `{ "rawText": .. }`.
async fn read_body(response: Response, method: &Method, url: &Url) -> Result<Value, ServiceError> {
    let text = response
        .text()
        .await
        .map_err(|err| request_error(method, url.as_str(), err))?;
    Ok(parse_body(&text))
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::json!({ "rawText": text }))
}

/// `message` wins over `error`; blank strings are ignored.
fn error_message(body: &Value) -> Option<String> {
    ["message", "error"].iter().find_map(|key| {
        body.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(String::from)
    })
}

fn request_error(method: &Method, url: &str, err: reqwest::Error) -> ServiceError {
    ServiceError::Request {
        method: method.to_string(),
        url: url.to_string(),
        source: Box::new(err),
    }
}
