//! The execution dispatcher: entry resolution, strategy selection,
//! remote submission, and the fallback-or-terminal policy.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::execution::js;
use crate::execution::python::PythonEngine;
use crate::execution::remote::{RemoteClient, RemoteTransport};
use crate::execution::{Backend, ExecutionRequest, ExecutionResult};
use crate::language::{self, Language, LocalRuntime, Strategy};
use crate::project::Project;

/// Per-invocation orchestrator. Every `run` terminates in exactly one
/// `ExecutionResult`; the caller never observes an error from this type.
pub struct Dispatcher {
    transport: Arc<dyn RemoteTransport>,
    python: Arc<PythonEngine>,
    run_timeout_ms: u64,
    compile_timeout_ms: u64,
}

impl Dispatcher {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Ok(Self::new(
            Arc::new(RemoteClient::from_config(cfg)?),
            Arc::new(PythonEngine::from_config(cfg)),
            cfg.get_u64("RUN_TIMEOUT").unwrap_or(3000),
            cfg.get_u64("COMPILE_TIMEOUT").unwrap_or(10000),
        ))
    }

    /// Wire the dispatcher with explicit collaborators; tests use this to
    /// substitute an instrumented transport or fetcher.
    pub fn new(
        transport: Arc<dyn RemoteTransport>,
        python: Arc<PythonEngine>,
        run_timeout_ms: u64,
        compile_timeout_ms: u64,
    ) -> Self {
        Self {
            transport,
            python,
            run_timeout_ms,
            compile_timeout_ms,
        }
    }

    /// Execute the project's entry file, preferring the remote service
    /// and degrading to an in-process engine when one exists for the
    /// language.
    pub async fn run(
        &self,
        project: &Project,
        entry_file_id: &str,
        stdin: Option<&str>,
    ) -> ExecutionResult {
        let Some(entry) = project.file(entry_file_id) else {
            return ExecutionResult::terminal("Error: No file found.");
        };

        // Markup renders in the preview pane; no execution backend is
        // involved at all.
        if entry.language == Language::Html {
            return ExecutionResult {
                output: "Ready for browser preview...".to_string(),
                error: false,
                execution_time: Some("0ms".to_string()),
                memory_usage: Some("0MB".to_string()),
                backend: Backend::None,
            };
        }

        match language::resolve(entry.language) {
            Strategy::Unsupported => ExecutionResult::terminal(format!(
                "Execution for {} is not supported in this environment yet.\n{}",
                entry.language,
                language::supported_summary()
            )),
            Strategy::Local(runtime) => {
                debug!(phase = "local", language = %entry.language, "running in-process");
                self.run_local(runtime, &entry.content, stdin).await
            }
            Strategy::Remote {
                runtime,
                version,
                fallback,
            } => {
                let request = ExecutionRequest::from_project(
                    project,
                    entry_file_id,
                    runtime,
                    version,
                    stdin,
                    self.run_timeout_ms,
                    self.compile_timeout_ms,
                );
                debug!(
                    phase = "dispatching",
                    runtime,
                    files = request.files.len(),
                    "submitting to remote execution service"
                );

                match self.transport.submit(&request).await {
                    Ok(result) => {
                        info!(phase = "succeeded", runtime, "remote execution finished");
                        result
                    }
                    Err(err) => match fallback {
                        Some(local) => {
                            warn!(phase = "falling_back", error = %err, "remote failed, running in-process");
                            self.run_local(local, &entry.content, stdin).await
                        }
                        None => {
                            warn!(phase = "terminal", error = %err, "remote failed, no local fallback");
                            ExecutionResult::terminal(format!(
                                "[Connection Error] Could not reach the cloud compiler.\n\n\
                                 Details: {err}\n\n\
                                 Note: Local fallback is only available for JavaScript and Python. \
                                 C, C++, and Java require an active connection to the compilation server."
                            ))
                        }
                    },
                }
            }
        }
    }

    /// In-process engines only ever see the entry file's content;
    /// cross-file imports do not resolve locally.
    async fn run_local(
        &self,
        runtime: LocalRuntime,
        code: &str,
        stdin: Option<&str>,
    ) -> ExecutionResult {
        match runtime {
            LocalRuntime::JsEval => js::execute(code),
            LocalRuntime::PythonWasm => self.python.execute(code, stdin).await,
        }
    }
}
