//! Language tags and the execution-strategy registry.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Editor language tag. Serialized form matches the tags stored in
/// project snapshots ("javascript", "cpp", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Javascript,
    Python,
    Java,
    Cpp,
    C,
    Html,
    Sql,
    Css,
    Json,
    Markdown,
    Dockerfile,
    Plaintext,
}

impl Language {
    /// Detect a language from a file name's extension. Unknown
    /// extensions map to plaintext.
    pub fn from_file_name(name: &str) -> Self {
        let ext = name
            .rsplit_once('.')
            .map(|(_, e)| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "js" => Language::Javascript,
            "py" => Language::Python,
            "java" => Language::Java,
            "c" => Language::C,
            "cpp" => Language::Cpp,
            "html" => Language::Html,
            "sql" => Language::Sql,
            "css" => Language::Css,
            "json" => Language::Json,
            "md" => Language::Markdown,
            "dockerfile" => Language::Dockerfile,
            _ => Language::Plaintext,
        }
    }

    /// Canonical file extension for starter files.
    pub fn extension(self) -> &'static str {
        match self {
            Language::Javascript => "js",
            Language::Python => "py",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::Html => "html",
            Language::Sql => "sql",
            Language::Css => "css",
            Language::Json => "json",
            Language::Markdown => "md",
            Language::Dockerfile => "dockerfile",
            Language::Plaintext => "txt",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Language::Javascript => "javascript",
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::Html => "html",
            Language::Sql => "sql",
            Language::Css => "css",
            Language::Json => "json",
            Language::Markdown => "markdown",
            Language::Dockerfile => "dockerfile",
            Language::Plaintext => "plaintext",
        };
        f.write_str(s)
    }
}

/// In-process engine able to stand in when the remote service is down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalRuntime {
    /// Embedded JavaScript evaluator.
    JsEval,
    /// WASM-hosted Python interpreter.
    PythonWasm,
}

/// How a language can be executed. Remote capability and local
/// executability are independent: a compiled language may be remote-only,
/// and a future language could run locally with no remote runtime at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Remote {
        /// Runtime identifier understood by the execution service.
        runtime: &'static str,
        /// Version selector; "*" picks the service default.
        version: &'static str,
        fallback: Option<LocalRuntime>,
    },
    Local(LocalRuntime),
    Unsupported,
}

/// Resolve a language to its execution strategy. Pure lookup; adding a
/// language (or granting one a local fallback) is an edit to this table
/// only.
pub fn resolve(language: Language) -> Strategy {
    match language {
        Language::Javascript => Strategy::Remote {
            runtime: "javascript",
            version: "*",
            fallback: Some(LocalRuntime::JsEval),
        },
        Language::Python => Strategy::Remote {
            runtime: "python",
            version: "*",
            fallback: Some(LocalRuntime::PythonWasm),
        },
        Language::Java => Strategy::Remote {
            runtime: "java",
            version: "*",
            fallback: None,
        },
        Language::Cpp => Strategy::Remote {
            runtime: "cpp",
            version: "*",
            fallback: None,
        },
        Language::C => Strategy::Remote {
            runtime: "c",
            version: "*",
            fallback: None,
        },
        _ => Strategy::Unsupported,
    }
}

/// Remediation text shown when a language has no execution strategy.
pub fn supported_summary() -> &'static str {
    "Supported languages: JS, Python, Java, C, C++."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_languages_carry_a_fallback() {
        match resolve(Language::Javascript) {
            Strategy::Remote { runtime, fallback, .. } => {
                assert_eq!(runtime, "javascript");
                assert_eq!(fallback, Some(LocalRuntime::JsEval));
            }
            other => panic!("unexpected strategy: {other:?}"),
        }
        match resolve(Language::Python) {
            Strategy::Remote { fallback, .. } => {
                assert_eq!(fallback, Some(LocalRuntime::PythonWasm));
            }
            other => panic!("unexpected strategy: {other:?}"),
        }
    }

    #[test]
    fn compiled_languages_are_remote_only() {
        for lang in [Language::Java, Language::Cpp, Language::C] {
            match resolve(lang) {
                Strategy::Remote { fallback, .. } => assert!(fallback.is_none()),
                other => panic!("unexpected strategy for {lang}: {other:?}"),
            }
        }
    }

    #[test]
    fn markup_and_data_tags_resolve_unsupported() {
        for lang in [
            Language::Html,
            Language::Sql,
            Language::Css,
            Language::Json,
            Language::Markdown,
            Language::Dockerfile,
            Language::Plaintext,
        ] {
            assert_eq!(resolve(lang), Strategy::Unsupported);
        }
    }

    #[test]
    fn detection_by_extension() {
        assert_eq!(Language::from_file_name("main.js"), Language::Javascript);
        assert_eq!(Language::from_file_name("app.PY"), Language::Python);
        assert_eq!(Language::from_file_name("Main.java"), Language::Java);
        assert_eq!(Language::from_file_name("a.cpp"), Language::Cpp);
        assert_eq!(Language::from_file_name("index.html"), Language::Html);
        assert_eq!(Language::from_file_name("notes"), Language::Plaintext);
        assert_eq!(Language::from_file_name("weird.xyz"), Language::Plaintext);
    }

    #[test]
    fn serde_tags_are_lowercase() {
        assert_eq!(
            serde_json::to_string(&Language::Javascript).unwrap(),
            "\"javascript\""
        );
        assert_eq!(serde_json::to_string(&Language::Cpp).unwrap(), "\"cpp\"");
        let lang: Language = serde_json::from_str("\"markdown\"").unwrap();
        assert_eq!(lang, Language::Markdown);
    }
}
