//! Reqwest-based client for the Piston-compatible execution service.

use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::execution::{format_elapsed, Backend, ExecutionRequest, ExecutionResult};

/// Why a remote submission failed. The dispatcher only branches on
/// failed-vs-succeeded; the variants exist for diagnostics.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("could not reach the execution service: {0}")]
    Network(reqwest::Error),
    #[error("execution service returned status {0}")]
    HttpStatus(StatusCode),
    #[error("execution service did not answer within {0:?}")]
    Timeout(Duration),
    #[error("malformed response from the execution service: {0}")]
    Protocol(String),
}

/// Seam between the dispatcher and the HTTP layer; tests substitute an
/// instrumented implementation.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    async fn submit(&self, request: &ExecutionRequest) -> Result<ExecutionResult, RemoteError>;
}

/// Single-attempt client. Retries are deliberately absent: a failed call
/// falls through to the dispatcher's fallback policy instead.
#[derive(Debug)]
pub struct RemoteClient {
    http: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl RemoteClient {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let timeout = Duration::from_secs(cfg.get_u64("REQUEST_TIMEOUT").unwrap_or(10));
        let endpoint = cfg.execution_api_url();

        // This wall clock caps the whole HTTP call and can fire before
        // the server-side run/compile budgets are spent; kept as-is.
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { http, endpoint, timeout })
    }
}

#[async_trait]
impl RemoteTransport for RemoteClient {
    async fn submit(&self, request: &ExecutionRequest) -> Result<ExecutionResult, RemoteError> {
        let body = serde_json::json!({
            "language": request.runtime,
            "version": request.version,
            "files": request.files,
            "stdin": request.stdin,
            "run_timeout": request.run_timeout_ms,
            "compile_timeout": request.compile_timeout_ms,
        });

        let started = Instant::now();
        let resp = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RemoteError::HttpStatus(status));
        }

        let parsed: ExecuteResponse = resp.json().await.map_err(|e| self.classify(e))?;
        let run = parsed
            .run
            .ok_or_else(|| RemoteError::Protocol("missing run outcome object".into()))?;

        debug!(elapsed = ?started.elapsed(), "remote execution finished");
        Ok(normalize(run, started.elapsed()))
    }
}

impl RemoteClient {
    fn classify(&self, e: reqwest::Error) -> RemoteError {
        if e.is_timeout() {
            RemoteError::Timeout(self.timeout)
        } else if e.is_decode() {
            RemoteError::Protocol(e.to_string())
        } else {
            RemoteError::Network(e)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    run: Option<RunOutcome>,
}

/// Nested execution outcome as reported by the service.
#[derive(Debug, Deserialize)]
pub(crate) struct RunOutcome {
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    /// Absent when the process died to a signal.
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub signal: Option<String>,
}

/// Collapse the service's stdout/stderr/code/signal quadruple into one
/// terminal-panel narrative.
pub(crate) fn normalize(run: RunOutcome, elapsed: Duration) -> ExecutionResult {
    let mut output = run.stdout;
    let mut is_error = run.code != Some(0) || run.signal.is_some() || !run.stderr.is_empty();

    if !run.stderr.is_empty() {
        output.push_str(&format!("\nError Output:\n{}", run.stderr));
    }

    if let Some(signal) = &run.signal {
        output.push_str(&format!("\nProcess terminated by signal: {signal}"));
        is_error = true;
    }

    if output.trim().is_empty() {
        output = "Program completed with no output.".to_string();
    }

    ExecutionResult {
        output,
        error: is_error,
        execution_time: Some(format_elapsed(elapsed)),
        memory_usage: Some("N/A".to_string()),
        backend: Backend::Remote,
    }
}
