//! Execution core for the CloudCode browser editor.
//!
//! The editor UI owns rendering, auth and file navigation; this crate
//! owns everything that happens after the Run button: the project/file
//! model and its invariants, the remote execution client, the in-process
//! fallback engines, and the dispatcher that decides which of them
//! answers a given run.

pub mod config;
pub mod execution;
pub mod language;
pub mod project;

pub use config::Config;
pub use execution::{
    Backend, Dispatcher, ExecutionRequest, ExecutionResult, RemoteClient, RemoteError,
    RemoteTransport, RequestFile,
};
pub use language::{Language, LocalRuntime, Strategy};
pub use project::store::{DirStore, ProjectStore};
pub use project::{Project, ProjectError, SourceFile, TextSource};
