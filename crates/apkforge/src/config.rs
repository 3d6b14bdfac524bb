//! Project configuration (`apkforge.toml`).
//!
//! The configuration file is owned by the project, not by this tool: the
//! orchestrator only reads it. It is searched for starting from the current
//! working directory and walking up to the repository root.
//!
//! ## Example
//!
//! ```toml
//! [app]
//! name = "helloworld"
//! formal_name = "Hello World"
//! bundle = "com.example"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use apkforge_core::{AppDescriptor, SUPPORTED_RUNTIME};

pub const CONFIG_FILE_NAME: &str = "apkforge.toml";

/// Root structure of `apkforge.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub app: AppConfig,
}

/// The `[app]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Machine-readable app name (e.g. "helloworld").
    pub name: String,

    /// Display name; also names the gradle bundle directory. Defaults to
    /// `name` when omitted.
    pub formal_name: Option<String>,

    /// Reverse-domain bundle prefix (e.g. "com.example").
    pub bundle: String,

    /// Support runtime version the app template embeds.
    #[serde(default = "default_runtime")]
    pub runtime: String,
}

fn default_runtime() -> String {
    SUPPORTED_RUNTIME.to_string()
}

impl ProjectConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Finds and loads `apkforge.toml` starting from `start_dir`, walking up
    /// until the repository root or the filesystem root.
    pub fn discover_from(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut current = start_dir.to_path_buf();
        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.is_file() {
                let config = Self::load(&config_path)?;
                return Ok(Some((config, config_path)));
            }
            if current.join(".git").exists() || !current.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Loads the project configuration for the current working directory, or
    /// fails with guidance when none exists.
    pub fn discover() -> Result<(Self, PathBuf)> {
        let cwd = std::env::current_dir().context("determining the current directory")?;
        match Self::discover_from(&cwd)? {
            Some(found) => Ok(found),
            None => bail!(
                "no {CONFIG_FILE_NAME} found in {} or any parent directory; \
                 run apkforge from inside a project",
                cwd.display()
            ),
        }
    }

    pub fn descriptor(&self) -> AppDescriptor {
        AppDescriptor {
            name: self.app.name.clone(),
            formal_name: self
                .app
                .formal_name
                .clone()
                .unwrap_or_else(|| self.app.name.clone()),
            bundle: self.app.bundle.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn minimal_config_gets_runtime_and_formal_name_defaults() {
        let config: ProjectConfig = toml::from_str(
            r#"
            [app]
            name = "helloworld"
            bundle = "com.example"
            "#,
        )
        .unwrap();
        assert_eq!(config.app.runtime, SUPPORTED_RUNTIME);
        let app = config.descriptor();
        assert_eq!(app.formal_name, "helloworld");
        assert_eq!(app.package_id(), "com.example.helloworld");
    }

    #[test]
    fn declared_fields_override_defaults() {
        let config: ProjectConfig = toml::from_str(
            r#"
            [app]
            name = "helloworld"
            formal_name = "Hello World"
            bundle = "com.example"
            runtime = "3.9"
            "#,
        )
        .unwrap();
        assert_eq!(config.app.runtime, "3.9");
        assert_eq!(config.descriptor().formal_name, "Hello World");
    }

    #[test]
    fn discovery_walks_up_to_the_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[app]\nname = \"helloworld\"\nbundle = \"com.example\"\n",
        )
        .unwrap();
        let nested = dir.path().join("android").join("Hello World");
        fs::create_dir_all(&nested).unwrap();

        let (config, path) = ProjectConfig::discover_from(&nested).unwrap().unwrap();
        assert_eq!(config.app.name, "helloworld");
        assert_eq!(path, dir.path().join(CONFIG_FILE_NAME));
    }

    #[test]
    fn discovery_stops_at_the_repository_root() {
        let dir = tempfile::tempdir().unwrap();
        // A .git marker without a config above it ends the search.
        fs::create_dir_all(dir.path().join("repo").join(".git")).unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[app]\nname = \"outside\"\nbundle = \"com.example\"\n",
        )
        .unwrap();

        let found = ProjectConfig::discover_from(&dir.path().join("repo")).unwrap();
        assert!(found.is_none());
    }
}
