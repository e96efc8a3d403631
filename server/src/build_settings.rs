//! Build-system collaborator: per-file compiler arguments.

use serde::Deserialize;
use url::Url;

/// Compile settings for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileSettings {
    pub compiler_arguments: Vec<String>,
}

/// Supplies compile settings for documents. Consulted for every analyzer
/// request that benefits from build context; `None` means the request
/// goes out without compiler arguments.
pub trait BuildSettingsProvider: Send + Sync {
    fn settings(&self, url: &Url, language: &str) -> Option<CompileSettings>;
}

/// No build system attached.
#[derive(Debug, Default)]
pub struct NullBuildSettings;

impl BuildSettingsProvider for NullBuildSettings {
    fn settings(&self, _url: &Url, _language: &str) -> Option<CompileSettings> {
        None
    }
}

/// Fixed arguments from configuration, with the file path appended the
/// way the compiler expects.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaticBuildSettings {
    #[serde(default)]
    pub compiler_arguments: Vec<String>,
}

impl BuildSettingsProvider for StaticBuildSettings {
    fn settings(&self, url: &Url, language: &str) -> Option<CompileSettings> {
        if language != "swift" {
            return None;
        }
        let path = url.to_file_path().ok()?;
        let mut compiler_arguments = self.compiler_arguments.clone();
        compiler_arguments.push(path.to_string_lossy().into_owned());
        Some(CompileSettings { compiler_arguments })
    }
}
