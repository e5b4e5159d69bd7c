//! HTTP session against the proxy under test
//!
//! [`ProxyClient`] owns one connection pool for the lifetime of a check. Every
//! endpoint method follows the same path: send, read status/headers/body,
//! reject anything but 200, measure headers, parse.

use crate::config::ProxyConfig;
use crate::error::{ProbeError, ProbeResult};
use crate::headers::check_response_headers;
use crate::logging::{log_debug, log_error, log_warn};
use crate::types::{
    greeting_messages, ChatCompletionRequest, CompletionRequest, CompletionResponse,
    EmbeddingRequest, ImageGenerationRequest, ImageOutcome, IssuedKey, KeyRequest,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub const KEY_GENERATE_PATH: &str = "/key/generate";
pub const USER_NEW_PATH: &str = "/user/new";
pub const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";
pub const COMPLETIONS_PATH: &str = "/completions";
pub const EMBEDDINGS_PATH: &str = "/embeddings";
pub const IMAGE_GENERATIONS_PATH: &str = "/images/generations";

/// Everything read off the wire for one call
#[derive(Debug)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// Scoped session for one check. Dropping it releases the connection pool.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: reqwest::Client,
    config: ProxyConfig,
}

impl ProxyClient {
    /// Create a session for `config`
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::ConfigurationError`] if the config fails
    /// validation or the HTTP client cannot be built.
    pub fn new(config: ProxyConfig) -> ProbeResult<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                ProbeError::configuration_error(format!("Failed to build HTTP client: {e}"))
            })?;

        log_debug!(
            base_url = %config.base_url,
            timeout_seconds = config.request_timeout.as_secs(),
            header_limit = config.header_limit,
            "Proxy session opened"
        );

        Ok(Self { client, config })
    }

    /// Session configured from the `PROXY_PROBE_*` environment variables
    pub fn from_env() -> ProbeResult<Self> {
        Self::new(ProxyConfig::from_env()?)
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Bearer authorization plus JSON content type
    pub fn build_auth_headers(key: &str) -> ProbeResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {key}")).map_err(|e| {
                ProbeError::configuration_error(format!("Invalid bearer key format: {e}"))
            })?,
        );

        Ok(headers)
    }

    /// Issue a key with the admin credential for `config.key_models`
    pub async fn generate_key(&self) -> ProbeResult<IssuedKey> {
        self.issue_key(KEY_GENERATE_PATH, &self.config.key_models).await
    }

    /// Create a user with the admin credential for `config.user_models`
    pub async fn new_user(&self) -> ProbeResult<IssuedKey> {
        self.issue_key(USER_NEW_PATH, &self.config.user_models).await
    }

    async fn issue_key(&self, path: &str, models: &[String]) -> ProbeResult<IssuedKey> {
        let request = KeyRequest::without_expiry(models);
        let response = self
            .post_json(path, &self.config.admin_key, &request)
            .await?;
        let body = self.require_success(path, response)?;
        let issued: IssuedKey = parse_body(path, &body)?;

        if issued.key.is_empty() {
            return Err(ProbeError::response_parsing_error(format!(
                "{path} returned an empty key"
            )));
        }
        Ok(issued)
    }

    /// Send the greeting conversation to `model`
    pub async fn chat_completion(&self, key: &str, model: &str) -> ProbeResult<Value> {
        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages: greeting_messages(),
        };
        let response = self
            .post_json(CHAT_COMPLETIONS_PATH, key, &request)
            .await?;
        let body = self.require_success(CHAT_COMPLETIONS_PATH, response)?;
        parse_body(CHAT_COMPLETIONS_PATH, &body)
    }

    pub async fn completion(&self, key: &str, request: &CompletionRequest) -> ProbeResult<Value> {
        let response = self.post_json(COMPLETIONS_PATH, key, request).await?;
        let body = self.require_success(COMPLETIONS_PATH, response)?;
        parse_body(COMPLETIONS_PATH, &body)
    }

    /// Completion whose body must match the OpenAI text completion format
    pub async fn typed_completion(
        &self,
        key: &str,
        request: &CompletionRequest,
    ) -> ProbeResult<CompletionResponse> {
        let response = self.post_json(COMPLETIONS_PATH, key, request).await?;
        let body = self.require_success(COMPLETIONS_PATH, response)?;
        let completion: CompletionResponse = parse_body(COMPLETIONS_PATH, &body)?;

        if completion.choices.is_empty() {
            return Err(ProbeError::response_parsing_error(
                "Completion response has no choices",
            ));
        }
        Ok(completion)
    }

    /// Embed `input`; success is a 200 within the header budget, whatever the body
    ///
    /// Returns the parsed body when it is JSON.
    pub async fn embeddings(
        &self,
        key: &str,
        model: &str,
        input: &[String],
    ) -> ProbeResult<Option<Value>> {
        let request = EmbeddingRequest {
            model: model.to_string(),
            input: input.to_vec(),
        };
        let response = self.post_json(EMBEDDINGS_PATH, key, &request).await?;
        let body = self.require_success(EMBEDDINGS_PATH, response)?;
        Ok(parse_body_lenient(EMBEDDINGS_PATH, &body))
    }

    /// Generate an image, tolerating upstream connection errors when configured
    ///
    /// Like [`embeddings`](Self::embeddings), a 200 passes even when the body
    /// is not JSON.
    pub async fn image_generation(
        &self,
        key: &str,
        model: &str,
        prompt: &str,
    ) -> ProbeResult<ImageOutcome> {
        let request = ImageGenerationRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
        };
        let response = self
            .post_json(IMAGE_GENERATIONS_PATH, key, &request)
            .await?;

        if response.status != StatusCode::OK
            && self.config.tolerate_upstream_connection_error
            && response.body.contains(&self.config.upstream_error_marker)
        {
            // Masks real upstream outages; surfaced as a distinct outcome.
            log_warn!(
                endpoint = IMAGE_GENERATIONS_PATH,
                status = %response.status,
                "Image generation failed with an upstream connection error, tolerated"
            );
            return Ok(ImageOutcome::UpstreamUnavailable {
                status: response.status.as_u16(),
            });
        }

        let body = self.require_success(IMAGE_GENERATIONS_PATH, response)?;
        Ok(ImageOutcome::Generated(parse_body_lenient(
            IMAGE_GENERATIONS_PATH,
            &body,
        )))
    }

    /// POST `body` as JSON to `path` with `key` as the bearer credential
    ///
    /// Only transport failures are errors here; status handling is left to
    /// the caller.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        key: &str,
        body: &B,
    ) -> ProbeResult<ProxyResponse> {
        let url = self.config.endpoint_url(path);
        let headers = Self::build_auth_headers(key)?;

        log_debug!(url = %url, "Sending proxy request");

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                log_error!(
                    url = %url,
                    error = %e,
                    "HTTP request failed"
                );
                ProbeError::request_failed(
                    format!("Request to {url} failed: {e}"),
                    Some(Box::new(e)),
                )
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(|e| {
            ProbeError::request_failed(
                format!("Failed to read {path} response body: {e}"),
                Some(Box::new(e)),
            )
        })?;

        log_debug!(
            endpoint = %path,
            status = %status,
            body = %body,
            "Proxy response"
        );

        Ok(ProxyResponse {
            status,
            headers,
            body,
        })
    }

    /// Reject non-200 responses and oversized headers, returning the body
    pub fn require_success(&self, path: &str, response: ProxyResponse) -> ProbeResult<String> {
        if response.status != StatusCode::OK {
            log_debug!(endpoint = %path, status = %response.status, "Rejecting non-200 response");
            return Err(ProbeError::unexpected_status(
                response.status.as_u16(),
                response.body,
            ));
        }

        check_response_headers(&response.headers, self.config.header_limit)?;
        Ok(response.body)
    }
}

fn parse_body<T: DeserializeOwned>(path: &str, body: &str) -> ProbeResult<T> {
    serde_json::from_str(body).map_err(|e| {
        log_error!(
            endpoint = %path,
            error = %e,
            raw_body = %body,
            "Failed to parse response"
        );
        ProbeError::response_parsing_error(format!("Invalid {path} response: {e}"))
    })
}

/// JSON body if there is one; endpoints whose contract is status-only use this
fn parse_body_lenient(path: &str, body: &str) -> Option<Value> {
    match serde_json::from_str(body) {
        Ok(value) => Some(value),
        Err(e) => {
            log_debug!(
                endpoint = %path,
                error = %e,
                body_length = body.len(),
                "Successful response body is not JSON"
            );
            None
        }
    }
}
