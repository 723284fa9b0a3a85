use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::PathBuf,
};

use directories::BaseDirs;

/// Runtime configuration: defaults, overlaid by `.cloudcoderc`, overlaid
/// by environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        let mut map = default_map();
        let config_path = default_config_path();

        // Read .cloudcoderc if exists
        if config_path.exists() {
            if let Ok(file) = fs::File::open(&config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().flatten() {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((k, v)) = line.split_once('=') {
                        map.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            }
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, config_path }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        // ENV first
        if let Ok(v) = env::var(key) {
            return Some(v);
        }
        self.inner.get(key).cloned()
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.parse::<u64>().ok())
    }

    /// Endpoint of the remote execution service.
    pub fn execution_api_url(&self) -> String {
        self.get("EXECUTION_API_URL").unwrap()
    }

    /// URL of the WASM Python runtime asset fetched on first local run.
    pub fn python_runtime_url(&self) -> String {
        self.get("PYTHON_RUNTIME_URL").unwrap()
    }

    /// Directory holding one JSON snapshot per project.
    pub fn projects_path(&self) -> PathBuf {
        PathBuf::from(self.get("PROJECT_STORAGE_PATH").unwrap())
    }
}

fn is_config_key(k: &str) -> bool {
    // Accept known keys or CLOUDCODE_* for forward-compat
    const KEYS: &[&str] = &[
        "EXECUTION_API_URL",
        "REQUEST_TIMEOUT",
        "RUN_TIMEOUT",
        "COMPILE_TIMEOUT",
        "PYTHON_RUNTIME_URL",
        "PROJECT_STORAGE_PATH",
    ];

    KEYS.contains(&k) || k.starts_with("CLOUDCODE_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("cloudcode").join(".cloudcoderc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();
    // Paths
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    let app_dir = base.join("cloudcode");

    m.insert(
        "PROJECT_STORAGE_PATH".into(),
        app_dir.join("projects").to_string_lossy().into_owned(),
    );

    // Remote execution service (Piston-compatible)
    m.insert(
        "EXECUTION_API_URL".into(),
        "https://emkc.org/api/v2/piston/execute".into(),
    );

    // Seconds for the whole HTTP call; milliseconds for the server-side
    // phase budgets carried inside the request body.
    m.insert("REQUEST_TIMEOUT".into(), "10".into());
    m.insert("RUN_TIMEOUT".into(), "3000".into());
    m.insert("COMPILE_TIMEOUT".into(), "10000".into());

    // Interpreter asset for the local Python fallback
    m.insert(
        "PYTHON_RUNTIME_URL".into(),
        "https://registry-cdn.wapm.io/contents/_/rustpython/0.1.3/target/wasm32-wasi/release/rustpython.wasm".into(),
    );

    m
}
