mod config;

use std::{
    env,
    fs::{self, OpenOptions},
    path::PathBuf,
    sync::{Arc, Mutex},
};

use anyhow::{Context, Result, bail};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use swiftls_analyzer::dylib::DylibAnalyzer;
use swiftls_server::{LanguageServer, StaticBuildSettings};

use crate::config::SwiftlsConfig;

fn init_tracing(configured_path: Option<PathBuf>) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    let (log_file, init_warnings) = open_log_file(configured_path);

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // stdout and stderr belong to the LSP transport; if no log file can
    // be opened, prefer no logs over corrupting the frame stream.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file(configured_path: Option<PathBuf>) -> (Option<(PathBuf, std::fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates(configured_path) {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates(configured_path: Option<PathBuf>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(explicit) = env::var("SWIFTLS_LOG") {
        candidates.push(PathBuf::from(explicit));
    }
    if let Some(configured) = configured_path {
        candidates.push(configured);
    }
    if let Ok(state) = env::var("XDG_STATE_HOME") {
        candidates.push(PathBuf::from(state).join("swiftls").join("swiftls.log"));
    } else if let Ok(home) = env::var("HOME") {
        candidates.push(
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("swiftls")
                .join("swiftls.log"),
        );
    }
    candidates.push(env::temp_dir().join("swiftls.log"));
    candidates
}

fn resolve_library_path(config: &SwiftlsConfig) -> Result<PathBuf> {
    if let Ok(explicit) = env::var("SWIFTLS_ANALYZER_LIBRARY") {
        return Ok(PathBuf::from(explicit));
    }
    if let Some(path) = config
        .analyzer
        .as_ref()
        .and_then(|a| a.library_path.clone())
    {
        return Ok(path);
    }
    bail!(
        "no analyzer library configured; set SWIFTLS_ANALYZER_LIBRARY or \
         [analyzer] library_path in swiftls.toml"
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // First load only supplies the log path; the reload after tracing
    // init gets its parse warnings logged.
    let early_log_path = SwiftlsConfig::load().and_then(|c| c.log.and_then(|l| l.path));
    init_tracing(early_log_path);

    let config = SwiftlsConfig::load().unwrap_or_default();
    let library = resolve_library_path(&config)?;
    let analyzer = DylibAnalyzer::load(&library)
        .with_context(|| format!("loading analyzer library {}", library.display()))?;

    let build_settings = StaticBuildSettings {
        compiler_arguments: config
            .build
            .and_then(|b| b.compiler_arguments)
            .unwrap_or_default(),
    };

    tracing::info!(library = %library.display(), "swiftls starting on stdio");
    let server = LanguageServer::new(Arc::new(analyzer), Box::new(build_settings));
    server.run(tokio::io::stdin(), tokio::io::stdout()).await
}
