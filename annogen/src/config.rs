//! Run configuration, usually read from `annogen.toml`.
//!
//! ```toml
//! [runtime]
//! datastore = "my_runtime::store"
//!
//! [output]
//! apis = "routes_generated.rs"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name looked up by [`Config::discover`].
pub const CONFIG_FILE: &str = "annogen.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub runtime: RuntimeModules,
    #[serde(default)]
    pub output: OutputFiles,
}

/// Module paths of the runtime collaborators referenced by generated code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeModules {
    #[serde(default = "default_datastore_module")]
    pub datastore: String,
    #[serde(default = "default_cache_module")]
    pub cache: String,
    #[serde(default = "default_search_module")]
    pub search: String,
    #[serde(default = "default_form_module")]
    pub form: String,
    #[serde(default = "default_web_module")]
    pub web: String,
    #[serde(default = "default_enums_module")]
    pub enums: String,
}

impl Default for RuntimeModules {
    fn default() -> Self {
        Self {
            datastore: default_datastore_module(),
            cache: default_cache_module(),
            search: default_search_module(),
            form: default_form_module(),
            web: default_web_module(),
            enums: default_enums_module(),
        }
    }
}

fn default_datastore_module() -> String {
    "annogen_runtime::datastore".to_string()
}

fn default_cache_module() -> String {
    "annogen_runtime::cache".to_string()
}

fn default_search_module() -> String {
    "annogen_runtime::search".to_string()
}

fn default_form_module() -> String {
    "annogen_runtime::form".to_string()
}

fn default_web_module() -> String {
    "annogen_runtime::web".to_string()
}

fn default_enums_module() -> String {
    "annogen_runtime::enums".to_string()
}

/// Output file names, relative to the scanned package directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFiles {
    #[serde(default = "default_datastore_file")]
    pub datastore: String,
    #[serde(default = "default_apis_file")]
    pub apis: String,
    #[serde(default = "default_enums_file")]
    pub enums: String,
}

impl Default for OutputFiles {
    fn default() -> Self {
        Self {
            datastore: default_datastore_file(),
            apis: default_apis_file(),
            enums: default_enums_file(),
        }
    }
}

fn default_datastore_file() -> String {
    "generated_datastore.rs".to_string()
}

fn default_apis_file() -> String {
    "generated_apis.rs".to_string()
}

fn default_enums_file() -> String {
    "generated_enums.rs".to_string()
}

impl Config {
    /// Load configuration from an explicit file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Look for `annogen.toml` in `start` and its ancestors, falling back to
    /// defaults when none exists.
    pub fn discover(start: &Path) -> Result<Self, ConfigError> {
        match find_config_file(start) {
            Some(path) => {
                log::debug!("using configuration from {}", path.display());
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }
}

fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = dir.parent();
    }
    None
}
