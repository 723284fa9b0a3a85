//! Code execution: request/result types, the remote client, the local
//! fallback engines, and the dispatcher that ties them together.

use serde::Serialize;

use crate::language::LocalRuntime;
use crate::project::Project;

pub mod dispatcher;
pub mod js;
pub mod python;
pub mod remote;

pub use dispatcher::Dispatcher;
pub use python::{PythonEngine, RuntimeFetcher};
pub use remote::{RemoteClient, RemoteError, RemoteTransport};

/// Which strategy actually produced a result. Diagnostic only; never
/// shown to the user or persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Remote,
    Local(LocalRuntime),
    /// Configuration errors, previews and terminal failures that ran
    /// nothing.
    None,
}

/// Outcome of one run invocation. Exactly one of these is produced per
/// invocation; target-program failures are carried in `error`/`output`,
/// never as an `Err` anywhere in this module.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub output: String,
    pub error: bool,
    /// Advisory wall-clock string, e.g. "0.412s".
    pub execution_time: Option<String>,
    /// Advisory memory note; the remote service does not report one.
    pub memory_usage: Option<String>,
    pub backend: Backend,
}

impl ExecutionResult {
    /// A terminal result that ran nothing: config errors, unreachable
    /// service without fallback.
    pub fn terminal(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            error: true,
            execution_time: Some("0ms".to_string()),
            memory_usage: Some("0MB".to_string()),
            backend: Backend::None,
        }
    }
}

/// One file as submitted to the execution service.
#[derive(Debug, Clone, Serialize)]
pub struct RequestFile {
    pub name: String,
    pub content: String,
}

/// Snapshot of everything one run needs. Built fresh per invocation and
/// never persisted.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub runtime: String,
    pub version: String,
    /// Entry file first; the service treats the first file as the
    /// program entry point.
    pub files: Vec<RequestFile>,
    pub stdin: String,
    pub run_timeout_ms: u64,
    pub compile_timeout_ms: u64,
}

impl ExecutionRequest {
    /// Capture a project snapshot with the entry file placed first and
    /// the remaining files in their collection order.
    pub fn from_project(
        project: &Project,
        entry_file_id: &str,
        runtime: &str,
        version: &str,
        stdin: Option<&str>,
        run_timeout_ms: u64,
        compile_timeout_ms: u64,
    ) -> Self {
        let mut files = Vec::with_capacity(project.files.len());
        if let Some(entry) = project.file(entry_file_id) {
            files.push(RequestFile {
                name: entry.name.clone(),
                content: entry.content.clone(),
            });
        }
        files.extend(
            project
                .files
                .iter()
                .filter(|f| f.id != entry_file_id)
                .map(|f| RequestFile {
                    name: f.name.clone(),
                    content: f.content.clone(),
                }),
        );
        Self {
            runtime: runtime.to_string(),
            version: version.to_string(),
            files,
            stdin: stdin.unwrap_or_default().to_string(),
            run_timeout_ms,
            compile_timeout_ms,
        }
    }
}

/// Render elapsed wall time the way the terminal panel expects it.
pub(crate) fn format_elapsed(elapsed: std::time::Duration) -> String {
    format!("{:.3}s", elapsed.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;

    #[test]
    fn entry_file_is_submitted_first() {
        let mut project = Project::new("demo", Language::Javascript);
        let first = project.files[0].id.clone();
        project.rename_file(&first, "utils.js").unwrap();
        let main = project.add_file("main.js");
        project.set_content(&main, "require('./utils')").unwrap();
        project.set_entry(&main).unwrap();

        let req = ExecutionRequest::from_project(
            &project, &main, "javascript", "*", None, 3000, 10000,
        );
        assert_eq!(req.files.len(), 2);
        assert_eq!(req.files[0].name, "main.js");
        assert_eq!(req.files[1].name, "utils.js");
    }

    #[test]
    fn stdin_defaults_to_empty() {
        let project = Project::new("demo", Language::Python);
        let entry = project.entry_file_id.clone();
        let req =
            ExecutionRequest::from_project(&project, &entry, "python", "*", None, 3000, 10000);
        assert_eq!(req.stdin, "");

        let req = ExecutionRequest::from_project(
            &project, &entry, "python", "*", Some("42\n"), 3000, 10000,
        );
        assert_eq!(req.stdin, "42\n");
    }

    #[test]
    fn elapsed_renders_three_decimals() {
        let s = format_elapsed(std::time::Duration::from_millis(412));
        assert_eq!(s, "0.412s");
    }
}
