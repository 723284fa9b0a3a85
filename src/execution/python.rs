//! WASM-hosted Python: the local fallback for python projects.
//!
//! The interpreter is a RustPython WASI build downloaded on first use and
//! shared process-wide afterwards. Initialization is guarded by async
//! once-semantics: under concurrent first-use calls exactly one
//! download/compile proceeds and the rest await it. Each run gets its own
//! store and stdio pipes; the shared state is only the compiled module.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use wasmtime::{Engine, Linker, Module, Store};
use wasmtime_wasi::p2::pipe::{MemoryInputPipe, MemoryOutputPipe};
use wasmtime_wasi::p2::WasiCtxBuilder;
use wasmtime_wasi::preview1::WasiP1Ctx;

use crate::config::Config;
use crate::execution::{format_elapsed, Backend, ExecutionResult};
use crate::language::LocalRuntime;

/// Source of the interpreter asset. A seam so tests can count
/// initializations and inject tiny modules.
#[async_trait]
pub trait RuntimeFetcher: Send + Sync {
    async fn fetch(&self) -> Result<Vec<u8>, String>;
}

struct HttpFetcher {
    url: String,
    http: reqwest::Client,
}

#[async_trait]
impl RuntimeFetcher for HttpFetcher {
    async fn fetch(&self) -> Result<Vec<u8>, String> {
        // No timeout here: the asset is tens of megabytes and slow links
        // are common. A stuck download blocks the first python run
        // indefinitely; known gap.
        let resp = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| format!("failed to download the Python runtime: {e}"))?;
        if !resp.status().is_success() {
            return Err(format!(
                "Python runtime download failed with status {}",
                resp.status()
            ));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| format!("failed to download the Python runtime: {e}"))?;
        Ok(bytes.to_vec())
    }
}

struct Interpreter {
    engine: Engine,
    module: Module,
}

impl Interpreter {
    fn compile(bytes: &[u8]) -> Result<Self, String> {
        let engine = Engine::default();
        let module = Module::new(&engine, bytes)
            .map_err(|e| format!("invalid Python runtime module: {e}"))?;
        Ok(Self { engine, module })
    }
}

/// Lazily-initialized Python engine. Cheap to construct; all the weight
/// is behind the first `execute`.
pub struct PythonEngine {
    fetcher: Arc<dyn RuntimeFetcher>,
    interpreter: OnceCell<Interpreter>,
}

impl PythonEngine {
    pub fn from_config(cfg: &Config) -> Self {
        Self::with_fetcher(Arc::new(HttpFetcher {
            url: cfg.python_runtime_url(),
            http: reqwest::Client::new(),
        }))
    }

    pub fn with_fetcher(fetcher: Arc<dyn RuntimeFetcher>) -> Self {
        Self {
            fetcher,
            interpreter: OnceCell::new(),
        }
    }

    async fn interpreter(&self) -> Result<&Interpreter, String> {
        self.interpreter
            .get_or_try_init(|| async {
                info!("initializing Python WASM runtime");
                let bytes = self.fetcher.fetch().await?;
                tokio::task::spawn_blocking(move || Interpreter::compile(&bytes))
                    .await
                    .map_err(|e| format!("runtime initialization panicked: {e}"))?
            })
            .await
    }

    /// Run a python script with optional stdin text. Never fails: fetch,
    /// compile and interpreter faults all land in the result's output
    /// with the error flag set. Once started, a run cannot be cancelled.
    pub async fn execute(&self, code: &str, stdin: Option<&str>) -> ExecutionResult {
        let started = Instant::now();

        let interpreter = match self.interpreter().await {
            Ok(i) => i,
            Err(message) => {
                warn!(%message, "python runtime unavailable");
                return failure(message, started);
            }
        };

        let engine = interpreter.engine.clone();
        let module = interpreter.module.clone();
        let code = code.to_string();
        let stdin = stdin.unwrap_or_default().to_string();

        let outcome =
            tokio::task::spawn_blocking(move || run_script(&engine, &module, &code, &stdin)).await;

        match outcome {
            Ok(Ok(run)) => render(run, started),
            Ok(Err(message)) => failure(message, started),
            Err(e) => failure(format!("interpreter task failed: {e}"), started),
        }
    }
}

struct ScriptOutput {
    stdout: String,
    stderr: String,
    exit_code: i32,
}

/// One interpreter invocation: fresh store, fresh WASI pipes, code via
/// `-c` argv, stdin via the stdin pipe.
fn run_script(
    engine: &Engine,
    module: &Module,
    code: &str,
    stdin: &str,
) -> Result<ScriptOutput, String> {
    let stdin_pipe = MemoryInputPipe::new(stdin.as_bytes().to_vec());
    let stdout_pipe = MemoryOutputPipe::new(1024 * 1024);
    let stderr_pipe = MemoryOutputPipe::new(256 * 1024);

    let mut builder = WasiCtxBuilder::new();
    builder
        .stdin(stdin_pipe)
        .stdout(stdout_pipe.clone())
        .stderr(stderr_pipe.clone())
        .args(&["rustpython", "-c", code]);
    let wasi_ctx = builder.build_p1();

    let mut store = Store::new(engine, wasi_ctx);
    let mut linker = Linker::new(engine);
    wasmtime_wasi::preview1::add_to_linker_sync(&mut linker, |ctx: &mut WasiP1Ctx| ctx)
        .map_err(|e| format!("failed to link WASI: {e}"))?;

    let instance = linker
        .instantiate(&mut store, module)
        .map_err(|e| format!("failed to instantiate the Python runtime: {e}"))?;
    let start = instance
        .get_typed_func::<(), ()>(&mut store, "_start")
        .map_err(|e| format!("Python runtime has no entry point: {e}"))?;

    let exit_code = match start.call(&mut store, ()) {
        Ok(()) => 0,
        Err(e) => match e.downcast_ref::<wasmtime_wasi::I32Exit>() {
            Some(exit) => exit.0,
            None => return Err(format!("interpreter fault: {e}")),
        },
    };

    let stdout = String::from_utf8_lossy(&stdout_pipe.contents()).into_owned();
    let stderr = String::from_utf8_lossy(&stderr_pipe.contents()).into_owned();
    Ok(ScriptOutput {
        stdout,
        stderr,
        exit_code,
    })
}

fn render(run: ScriptOutput, started: Instant) -> ExecutionResult {
    let elapsed = started.elapsed();
    debug!(?elapsed, exit_code = run.exit_code, "local python run finished");

    let mut output = run.stdout;
    let error = run.exit_code != 0 || !run.stderr.is_empty();
    if !run.stderr.is_empty() {
        output.push_str(&format!("\nTraceback:\n{}", run.stderr));
    }
    if output.trim().is_empty() {
        output = "No output returned.".to_string();
    }

    ExecutionResult {
        output,
        error,
        execution_time: Some(format_elapsed(elapsed)),
        memory_usage: Some("Local (WASM)".to_string()),
        backend: Backend::Local(LocalRuntime::PythonWasm),
    }
}

fn failure(message: String, started: Instant) -> ExecutionResult {
    ExecutionResult {
        output: message,
        error: true,
        execution_time: Some(format_elapsed(started.elapsed())),
        memory_usage: Some("Local (WASM)".to_string()),
        backend: Backend::Local(LocalRuntime::PythonWasm),
    }
}
