//! Configuration management for lessonmd.
//!
//! Parses `.lessonmd.yaml` files with serde and discovers them in the
//! working directory or the home directory.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! `wrapper-class` in a config file may name environment variables as
//! `${VAR}` or `${VAR:-default}`, so one file can serve several courses.
//! Bare `$VAR` stays literal.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    pub no_wrap: Option<bool>,
    pub wrapper_class: Option<String>,
    pub include_highlight_js: Option<bool>,
    pub include_mermaid_js: Option<bool>,
    pub include_tabs_js: Option<bool>,
    pub include_stylesheet: Option<bool>,
    pub include_frontmatter: Option<bool>,
    pub use_mermaid_svg_renderer: Option<bool>,
}

/// Configuration filenames searched in each candidate directory, in order.
const CONFIG_FILENAMES: [&str; 2] = [".lessonmd.yaml", ".lessonmd.yml"];

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Emit the fragment without the wrapper `<div>`.
    pub no_wrap: bool,
    /// Class of the wrapper `<div>`.
    pub wrapper_class: String,
    pub include_highlight_js: bool,
    pub include_mermaid_js: bool,
    pub include_tabs_js: bool,
    pub include_stylesheet: bool,
    /// Render front matter as a table.
    pub include_frontmatter: bool,
    /// Render Mermaid diagrams to SVG with `mmdc` instead of in the browser.
    pub use_mermaid_svg_renderer: bool,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            no_wrap: false,
            wrapper_class: "item".to_owned(),
            include_highlight_js: false,
            include_mermaid_js: false,
            include_tabs_js: false,
            include_stylesheet: false,
            include_frontmatter: false,
            use_mermaid_svg_renderer: false,
            config_path: None,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config key (e.g., "wrapper-class").
        field: String,
        /// Error message (e.g., "${`LESSON_CLASS`}: environment variable not found").
        message: String,
    },
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file (`~` is expanded).
    /// Otherwise, searches the current directory and then the home directory
    /// for `.lessonmd.yaml` or `.lessonmd.yml`. Without a file, defaults are used.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to take
    /// precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            let path = expand_tilde(path);
            if !path.exists() {
                return Err(ConfigError::NotFound(path));
            }
            Self::load_from_file(&path)?
        } else if let Some(discovered) = discover_config(&search_dirs()) {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    pub fn apply_cli_settings(&mut self, settings: &CliSettings) {
        let flags = [
            (settings.no_wrap, &mut self.no_wrap),
            (settings.include_highlight_js, &mut self.include_highlight_js),
            (settings.include_mermaid_js, &mut self.include_mermaid_js),
            (settings.include_tabs_js, &mut self.include_tabs_js),
            (settings.include_stylesheet, &mut self.include_stylesheet),
            (settings.include_frontmatter, &mut self.include_frontmatter),
            (
                settings.use_mermaid_svg_renderer,
                &mut self.use_mermaid_svg_renderer,
            ),
        ];
        for (setting, field) in flags {
            if let Some(value) = setting {
                *field = value;
            }
        }
        if let Some(wrapper_class) = &settings.wrapper_class {
            self.wrapper_class.clone_from(wrapper_class);
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;
        config.expand_wrapper_class()?;
        config.config_path = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Substitute `${VAR}` references in the wrapper class from the
    /// environment. An unset variable without a default is an error.
    fn expand_wrapper_class(&mut self) -> Result<(), ConfigError> {
        if !self.wrapper_class.contains("${") {
            return Ok(());
        }
        let expanded = shellexpand::env_with_context(&self.wrapper_class, |var| {
            std::env::var(var).map(Some)
        })
        .map_err(|e| ConfigError::EnvVar {
            field: "wrapper-class".to_owned(),
            message: format!("${{{}}}: {}", e.var_name, e.cause),
        })?;
        self.wrapper_class = expanded.into_owned();
        Ok(())
    }

    /// Parse YAML configuration. An empty document yields the defaults.
    fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the wrapper class is empty or
    /// contains characters other than ASCII letters, digits, `-` and `_`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wrapper_class.is_empty() {
            return Err(ConfigError::Validation(
                "wrapper-class cannot be empty".to_owned(),
            ));
        }
        if let Some(bad) = self
            .wrapper_class
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_')))
        {
            return Err(ConfigError::Validation(format!(
                "wrapper-class contains invalid character {bad:?}"
            )));
        }
        Ok(())
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(raw) => PathBuf::from(shellexpand::tilde(raw).into_owned()),
        None => path.to_path_buf(),
    }
}

/// Current directory, then the home directory.
fn search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::with_capacity(2);
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    let home = shellexpand::tilde("~");
    if home != "~" {
        dirs.push(PathBuf::from(home.into_owned()));
    }
    dirs
}

/// First existing config file in `dirs`.
fn discover_config(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}
