use serde::Deserialize;
use std::{env, path::PathBuf};

#[derive(Debug, Default, Deserialize)]
pub struct SwiftlsConfig {
    pub analyzer: Option<AnalyzerConfig>,
    pub build: Option<BuildConfig>,
    pub log: Option<LogConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzerConfig {
    /// Path to the native analyzer library (`.so` / `.dylib`).
    pub library_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BuildConfig {
    /// Compiler arguments applied to every Swift document.
    pub compiler_arguments: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogConfig {
    pub path: Option<PathBuf>,
}

impl SwiftlsConfig {
    pub fn load() -> Option<Self> {
        let path = Self::path()?;
        if !path.exists() {
            return None;
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return None;
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                None
            }
        }
    }

    pub fn path() -> Option<PathBuf> {
        if let Ok(explicit) = env::var("SWIFTLS_CONFIG") {
            return Some(PathBuf::from(explicit));
        }
        if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg).join("swiftls").join("swiftls.toml"));
        }
        let home = env::var("HOME").ok()?;
        Some(
            PathBuf::from(home)
                .join(".config")
                .join("swiftls")
                .join("swiftls.toml"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_parses() {
        let config: SwiftlsConfig = toml::from_str("").unwrap();
        assert!(config.analyzer.is_none());
        assert!(config.build.is_none());
    }

    #[test]
    fn test_full_config_parses() {
        let config: SwiftlsConfig = toml::from_str(
            r#"
            [analyzer]
            library_path = "/usr/lib/libswiftanalyzer.so"

            [build]
            compiler_arguments = ["-sdk", "/sdk"]

            [log]
            path = "/tmp/swiftls.log"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.analyzer.unwrap().library_path.unwrap(),
            PathBuf::from("/usr/lib/libswiftanalyzer.so")
        );
        assert_eq!(
            config.build.unwrap().compiler_arguments.unwrap(),
            vec!["-sdk", "/sdk"]
        );
        assert!(config.log.unwrap().path.is_some());
    }

    #[test]
    fn test_unknown_sections_tolerated() {
        let config: SwiftlsConfig = toml::from_str("[future]\nkey = 1\n").unwrap();
        assert!(config.analyzer.is_none());
    }
}
