//! Embedded JavaScript engine: the local fallback for script projects.
//!
//! The source runs inside a wrapper that shadows `console` with an
//! invocation-local sink, so log capture never touches shared state and
//! overlapping runs cannot leak lines into each other. Synchronous and
//! uninterruptible once started: the embedding UI must not hand this
//! engine code it knows to be unbounded.

use std::time::Instant;

use boa_engine::{Context, Source};
use serde::Deserialize;
use tracing::debug;

use crate::execution::{format_elapsed, Backend, ExecutionResult};
use crate::language::LocalRuntime;

/// Captured console traffic, deserialized from the wrapper's JSON
/// hand-back.
#[derive(Debug, Deserialize)]
struct Sink {
    lines: Vec<String>,
    error: bool,
}

/// Run a standalone script and capture its console output in call order.
/// Never fails: every failure mode ends up in the result's output text
/// with the error flag set. stdin is not part of this engine's contract.
pub fn execute(code: &str) -> ExecutionResult {
    let started = Instant::now();

    let (lines, error) = match eval_captured(code) {
        Ok(sink) => (sink.lines, sink.error),
        Err(message) => (vec![format!("Runtime Error: {message}")], true),
    };

    let elapsed = started.elapsed();
    debug!(?elapsed, error, lines = lines.len(), "local js run finished");

    let output = if lines.is_empty() {
        "No output returned.".to_string()
    } else {
        lines.join("\n")
    };

    ExecutionResult {
        output,
        error,
        execution_time: Some(format_elapsed(elapsed)),
        memory_usage: Some("Local (JS)".to_string()),
        backend: Backend::Local(LocalRuntime::JsEval),
    }
}

fn eval_captured(code: &str) -> Result<Sink, String> {
    let wrapper = format!(
        r#"(function() {{
    const __sink = {{ lines: [], error: false }};
    const __render = (args) => args.map((a) => {{
        if (typeof a === "object" && a !== null) {{
            try {{ return JSON.stringify(a, null, 2); }} catch (_) {{ return String(a); }}
        }}
        return String(a);
    }}).join(" ");
    const console = {{
        log: (...args) => {{ __sink.lines.push(__render(args)); }},
        info: (...args) => {{ __sink.lines.push(__render(args)); }},
        warn: (...args) => {{ __sink.lines.push("[Warn] " + __render(args)); }},
        error: (...args) => {{ __sink.error = true; __sink.lines.push("[Error] " + __render(args)); }},
    }};
    try {{
        (function() {{
{code}
        }})();
    }} catch (err) {{
        __sink.error = true;
        __sink.lines.push("Runtime Error: " + (err && err.message !== undefined ? err.message : String(err)));
    }}
    return JSON.stringify(__sink);
}})()"#
    );

    let mut context = Context::default();
    let value = context
        .eval(Source::from_bytes(&wrapper))
        .map_err(|e| e.to_string())?;
    let json = value
        .to_string(&mut context)
        .map_err(|e| e.to_string())?
        .to_std_string_escaped();
    serde_json::from_str(&json).map_err(|e| format!("console capture failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_logs_in_call_order() {
        let result = execute(r#"console.log("one"); console.log("two", 2);"#);
        assert!(!result.error);
        assert_eq!(result.output, "one\ntwo 2");
        assert_eq!(result.backend, Backend::Local(LocalRuntime::JsEval));
    }

    #[test]
    fn logs_survive_a_throw_plus_one_diagnostic() {
        let result = execute(
            r#"
console.log("a");
console.log("b");
console.log("c");
throw new Error("boom");
"#,
        );
        assert!(result.error);
        let lines: Vec<&str> = result.output.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(&lines[..3], &["a", "b", "c"]);
        assert_eq!(lines[3], "Runtime Error: boom");
    }

    #[test]
    fn console_error_sets_flag_without_aborting() {
        let result = execute(r#"console.error("bad"); console.log("after");"#);
        assert!(result.error);
        assert_eq!(result.output, "[Error] bad\nafter");
    }

    #[test]
    fn warn_is_prefixed_but_not_an_error() {
        let result = execute(r#"console.warn("careful");"#);
        assert!(!result.error);
        assert_eq!(result.output, "[Warn] careful");
    }

    #[test]
    fn silent_script_reports_no_output() {
        let result = execute("const x = 1 + 1;");
        assert!(!result.error);
        assert_eq!(result.output, "No output returned.");
        assert!(result.execution_time.is_some());
    }

    #[test]
    fn objects_are_pretty_printed() {
        let result = execute(r#"console.log({ a: 1 });"#);
        assert!(!result.error);
        assert!(result.output.contains("\"a\": 1"));
    }

    #[test]
    fn syntax_error_becomes_a_diagnostic_line() {
        let result = execute("function {");
        assert!(result.error);
        assert!(result.output.starts_with("Runtime Error: "));
        assert_eq!(result.output.lines().count(), 1);
    }

    #[test]
    fn starter_template_runs() {
        let result = execute(
            "console.log(\"App Started\");\n\nconst sum = (a, b) => a + b;\nconsole.log(\"Result:\", sum(5, 10));",
        );
        assert!(!result.error);
        assert_eq!(result.output, "App Started\nResult: 15");
    }
}
