use crate::config::types::{ProjectConfig, Settings};
use crate::config::validation::{validate, validate_settings};
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a project file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML project file
///
/// # Returns
///
/// * `Ok(ProjectConfig)` - Successfully loaded and validated project
/// * `Err(ConfigError)` - Failed to load, parse, or validate the project
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use deepcrawl::config::load_project;
///
/// let project = load_project(Path::new("quotes.toml")).unwrap();
/// println!("Max depth: {}", project.settings.max_depth);
/// ```
pub fn load_project(path: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_project(&content)
}

/// Parses and validates a project from TOML text
pub fn parse_project(content: &str) -> Result<ProjectConfig, ConfigError> {
    let project: ProjectConfig = toml::from_str(content)?;
    validate(&project)?;
    Ok(project)
}

impl Settings {
    /// Parses and validates settings from a TOML table
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content)?;
        validate_settings(&settings)?;
        Ok(settings)
    }
}
