//! # proxy-probe
//!
//! Black-box endpoint checks for a running OpenAI-compatible LLM proxy.
//!
//! ## What gets checked
//!
//! - **Key issuance**: `/key/generate` and `/user/new` return a usable bearer key
//! - **Traffic**: chat completions, completions, embeddings and image generation
//!   succeed with issued keys
//! - **Header budget**: every successful response keeps its headers under the
//!   reverse-proxy limit (4096 bytes by default)
//! - **Rate limiting**: concurrent calls to a 1 RPM model are not all accepted
//! - **Backward compatibility**: pre-generated keys still authenticate
//!
//! ## Example
//!
//! ```rust,no_run
//! use proxy_probe::{scenarios, ProxyClient, ProxyConfig};
//!
//! # async fn example() -> proxy_probe::ProbeResult<()> {
//! let client = ProxyClient::new(ProxyConfig::for_base_url("http://0.0.0.0:4000"))?;
//! let key = client.generate_key().await?.key;
//! client.chat_completion(&key, "gpt-4").await?;
//!
//! for report in scenarios::run_suite(&client).await {
//!     println!("{}: {}", report.scenario, report.passed());
//! }
//! # Ok(())
//! # }
//! ```

// Allow missing errors documentation - errors are self-documenting via type signatures
#![allow(clippy::missing_errors_doc)]

pub(crate) mod logging;

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod scenarios;
pub mod types;

#[cfg(test)]
mod tests;

pub use client::{ProxyClient, ProxyResponse};
pub use config::{ProxyConfig, ScenarioModels};
pub use error::{ProbeError, ProbeResult};
pub use headers::{check_response_headers, response_header_size};
pub use scenarios::{RateLimitOutcome, Scenario, ScenarioReport};
pub use types::{CompletionRequest, CompletionResponse, ImageOutcome, IssuedKey};
