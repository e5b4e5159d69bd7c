//! End-to-end checks against a running proxy
//!
//! Each scenario is a linear sequence of awaited calls on one [`ProxyClient`].
//! Keys issued by `/key/generate` and `/user/new` are used straight away as
//! bearer credentials, so a passing scenario also shows that freshly issued
//! keys authorize traffic.

use crate::client::ProxyClient;
use crate::error::{ProbeError, ProbeResult};
use crate::logging::{log_debug, log_info, log_warn};
use crate::types::{CompletionRequest, CompletionResponse, ImageOutcome};
use futures_util::future::join_all;
use std::fmt;
use std::time::{Duration, Instant};

pub const COMPLETION_PROMPT: &str = "Hello!";
pub const FORMAT_CHECK_PROMPT: &str = "Say this is a test";
pub const EMBEDDING_INPUT: &str = "hello world";
pub const IMAGE_PROMPT: &str = "A cute baby sea otter";

/// Generate a key and chat with it, then create a user and chat with that key
pub async fn chat_completion_with_issued_keys(client: &ProxyClient) -> ProbeResult<()> {
    let model = &client.config().models.chat;

    let key = client.generate_key().await?.key;
    client.chat_completion(&key, model).await?;

    let user_key = client.new_user().await?.key;
    client.chat_completion(&user_key, model).await?;
    Ok(())
}

/// How the concurrent calls of the rate-limit race ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitOutcome {
    pub succeeded: usize,
    pub failed: usize,
    /// Proxy status per failed call; `None` when the call never got a response
    pub failure_statuses: Vec<Option<u16>>,
}

/// Fire concurrent chat calls at the rate-limited model and require a rejection
///
/// The model is expected to allow one request per minute, so with two or more
/// calls in flight at least one must fail. Every call is awaited before the
/// verdict so each outcome gets logged.
///
/// # Errors
///
/// Returns [`ProbeError::ExpectationFailed`] if every call succeeded.
pub async fn chat_completion_rate_limit(client: &ProxyClient) -> ProbeResult<RateLimitOutcome> {
    let config = client.config();
    let model = &config.models.rate_limited;
    let calls = (0..config.rate_limit_parallel_calls)
        .map(|_| client.chat_completion(&config.admin_key, model));

    let results = join_all(calls).await;

    let mut outcome = RateLimitOutcome {
        succeeded: 0,
        failed: 0,
        failure_statuses: Vec::new(),
    };
    for (index, result) in results.iter().enumerate() {
        match result {
            Ok(_) => outcome.succeeded += 1,
            Err(e) => {
                log_debug!(call = index, error = %e, "Rate-limited call rejected");
                outcome.failed += 1;
                outcome.failure_statuses.push(e.status());
            }
        }
    }

    log_info!(
        model = %model,
        succeeded = outcome.succeeded,
        failed = outcome.failed,
        "Rate-limit race finished"
    );

    if outcome.failed == 0 {
        return Err(ProbeError::expectation_failed(format!(
            "Expected at least 1 of {} parallel calls to {model} to fail",
            outcome.succeeded
        )));
    }
    Ok(outcome)
}

/// Chat with each configured legacy key until one authenticates
///
/// Returns the key that worked. Different deployments hold different
/// pre-generated keys, so the list comes from configuration.
///
/// # Errors
///
/// Returns [`ProbeError::ConfigurationError`] when no legacy keys are
/// configured, otherwise the error of the last key tried.
pub async fn chat_completion_legacy_key(client: &ProxyClient) -> ProbeResult<String> {
    let config = client.config();
    let mut last_error = None;

    for key in &config.legacy_keys {
        match client.chat_completion(key, &config.models.chat).await {
            Ok(_) => return Ok(key.clone()),
            Err(e) => {
                log_warn!(error = %e, "Legacy key rejected, trying the next one");
                last_error = Some(e);
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| ProbeError::configuration_error("No legacy keys configured")))
}

/// Completion with an issued key, then an OpenAI-format completion with a user key
///
/// The second call pins `max_tokens` and `temperature` the way an SDK client
/// would and requires the body to deserialize as a text completion.
pub async fn completion_with_issued_keys(client: &ProxyClient) -> ProbeResult<CompletionResponse> {
    let model = &client.config().models.chat;

    let key = client.generate_key().await?.key;
    client
        .completion(&key, &CompletionRequest::new(model, COMPLETION_PROMPT))
        .await?;

    let user_key = client.new_user().await?.key;
    let request = CompletionRequest {
        max_tokens: Some(7),
        temperature: Some(0.0),
        ..CompletionRequest::new(model, FORMAT_CHECK_PROMPT)
    };
    client.typed_completion(&user_key, &request).await
}

pub async fn embeddings_with_issued_keys(client: &ProxyClient) -> ProbeResult<()> {
    let model = &client.config().models.embedding;
    let input = vec![EMBEDDING_INPUT.to_string()];

    let key = client.generate_key().await?.key;
    client.embeddings(&key, model, &input).await?;

    let user_key = client.new_user().await?.key;
    client.embeddings(&user_key, model, &input).await?;
    Ok(())
}

/// Image generation with an issued key and a user key; one outcome per call
pub async fn image_generation_with_issued_keys(
    client: &ProxyClient,
) -> ProbeResult<Vec<ImageOutcome>> {
    let model = &client.config().models.image;

    let key = client.generate_key().await?.key;
    let first = client.image_generation(&key, model, IMAGE_PROMPT).await?;

    let user_key = client.new_user().await?.key;
    let second = client
        .image_generation(&user_key, model, IMAGE_PROMPT)
        .await?;
    Ok(vec![first, second])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    ChatCompletion,
    ChatCompletionRateLimit,
    ChatCompletionLegacyKey,
    Completion,
    Embeddings,
    ImageGeneration,
}

impl Scenario {
    pub const ALL: [Scenario; 6] = [
        Scenario::ChatCompletion,
        Scenario::ChatCompletionRateLimit,
        Scenario::ChatCompletionLegacyKey,
        Scenario::Completion,
        Scenario::Embeddings,
        Scenario::ImageGeneration,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ChatCompletion => "chat_completion",
            Self::ChatCompletionRateLimit => "chat_completion_ratelimit",
            Self::ChatCompletionLegacyKey => "chat_completion_old_key",
            Self::Completion => "completion",
            Self::Embeddings => "embeddings",
            Self::ImageGeneration => "image_generation",
        }
    }

    pub async fn run(self, client: &ProxyClient) -> ProbeResult<()> {
        match self {
            Self::ChatCompletion => chat_completion_with_issued_keys(client).await,
            Self::ChatCompletionRateLimit => chat_completion_rate_limit(client).await.map(|_| ()),
            Self::ChatCompletionLegacyKey => chat_completion_legacy_key(client).await.map(|_| ()),
            Self::Completion => completion_with_issued_keys(client).await.map(|_| ()),
            Self::Embeddings => embeddings_with_issued_keys(client).await,
            Self::ImageGeneration => image_generation_with_issued_keys(client).await.map(|_| ()),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    pub outcome: ProbeResult<()>,
    pub elapsed: Duration,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Run every scenario in order on one session, continuing past failures
pub async fn run_suite(client: &ProxyClient) -> Vec<ScenarioReport> {
    let mut reports = Vec::with_capacity(Scenario::ALL.len());

    for scenario in Scenario::ALL {
        let start_time = Instant::now();
        let outcome = scenario.run(client).await;
        let elapsed = start_time.elapsed();

        match &outcome {
            Ok(()) => log_info!(
                scenario = %scenario,
                elapsed_ms = elapsed.as_millis() as u64,
                "Scenario passed"
            ),
            Err(e) => log_warn!(
                scenario = %scenario,
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "Scenario failed"
            ),
        }

        reports.push(ScenarioReport {
            scenario,
            outcome,
            elapsed,
        });
    }

    reports
}
