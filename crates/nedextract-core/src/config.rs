use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ingest::RenderingOptions;

/// Extraction tasks that can be switched on per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    People,
    Orgs,
    Sectors,
}

impl Task {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::People => "people",
            Self::Orgs => "orgs",
            Self::Sectors => "sectors",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![Self::People, Self::Orgs, Self::Sectors]
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Task {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "people" => Ok(Self::People),
            "orgs" => Ok(Self::Orgs),
            "sectors" => Ok(Self::Sectors),
            other => Err(ConfigError::UnknownTask(other.to_string())),
        }
    }
}

/// Registry CSV layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Column holding the registry identifier
    pub id_column: String,
    /// Column holding the statutory name
    pub statutory_name_column: String,
    /// Column holding the short business name
    pub short_name_column: String,
    /// Organizational term tried in front of a name on the second match attempt
    pub name_prefix: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            id_column: "rsin".to_string(),
            statutory_name_column: "currentStatutoryName".to_string(),
            short_name_column: "shortBusinessName".to_string(),
            name_prefix: "Stichting".to_string(),
        }
    }
}

/// Tunables for the decision engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Tasks to run for every document
    pub tasks: Vec<Task>,
    /// Alternate renderings fed to NER; the first one is the primary rendering
    pub renderings: Vec<RenderingOptions>,
    /// Share of mentions that must be tagged ORG for a multi-mention candidate
    /// (strictly greater than)
    pub majority_threshold: f64,
    /// Minimum document occurrences of an accepted organization before it can
    /// absorb a single-mention candidate
    pub containment_min_mentions: usize,
    /// Minimum length of a role-stripped candidate
    pub min_stripped_len: usize,
    /// Tokens scanned on each side of a name for a sub role
    pub sub_role_window: usize,
    /// Rendering whose sentences are used to resolve people; the primary
    /// rendering is used when the index is out of range
    pub person_rendering: usize,
    pub registry: RegistryConfig,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            tasks: Task::all(),
            renderings: RenderingOptions::defaults(),
            majority_threshold: 0.5,
            containment_min_mentions: 3,
            min_stripped_len: 3,
            sub_role_window: 8,
            person_rendering: 1,
            registry: RegistryConfig::default(),
        }
    }
}

impl ExtractionConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Defaults with `NEDEXTRACT_*` environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// Apply `NEDEXTRACT_*` environment overrides on top of this config.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(tasks) = std::env::var("NEDEXTRACT_TASKS") {
            self.tasks = tasks
                .split(',')
                .filter(|t| !t.trim().is_empty())
                .map(str::parse)
                .collect::<Result<_, _>>()?;
        }
        if let Ok(v) = std::env::var("NEDEXTRACT_MAJORITY_THRESHOLD") {
            self.majority_threshold = v
                .parse()
                .map_err(|_| ConfigError::InvalidValue("NEDEXTRACT_MAJORITY_THRESHOLD", v))?;
        }
        if let Ok(v) = std::env::var("NEDEXTRACT_CONTAINMENT_MIN_MENTIONS") {
            self.containment_min_mentions = v
                .parse()
                .map_err(|_| ConfigError::InvalidValue("NEDEXTRACT_CONTAINMENT_MIN_MENTIONS", v))?;
        }
        if let Ok(v) = std::env::var("NEDEXTRACT_REGISTRY_PREFIX") {
            self.registry.name_prefix = v;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn has_task(&self, task: Task) -> bool {
        self.tasks.contains(&task)
    }

    /// Whether any enabled task needs NER output.
    pub fn needs_ner(&self) -> bool {
        self.has_task(Task::People) || self.has_task(Task::Orgs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.renderings.is_empty() {
            return Err(ConfigError::NoRenderings);
        }
        if !(0.0..1.0).contains(&self.majority_threshold) {
            return Err(ConfigError::InvalidValue(
                "majority_threshold",
                self.majority_threshold.to_string(),
            ));
        }
        if self.tasks.is_empty() {
            return Err(ConfigError::NoTasks);
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("At least one rendering must be configured")]
    NoRenderings,
    #[error("At least one task must be enabled")]
    NoTasks,
    #[error("Unknown task: {0}")]
    UnknownTask(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.renderings.len(), 3);
        assert_eq!(config.containment_min_mentions, 3);
        assert!(config.needs_ner());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ExtractionConfig::from_toml_str(
            r#"
            tasks = ["orgs"]
            containment_min_mentions = 5

            [registry]
            name_prefix = "Vereniging"
            "#,
        )
        .unwrap();

        assert_eq!(config.tasks, vec![Task::Orgs]);
        assert_eq!(config.containment_min_mentions, 5);
        assert_eq!(config.registry.name_prefix, "Vereniging");
        assert_eq!(config.registry.id_column, "rsin");
        assert!((config.majority_threshold - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sectors_only_skips_ner() {
        let config = ExtractionConfig {
            tasks: vec![Task::Sectors],
            ..Default::default()
        };
        assert!(!config.needs_ner());
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let config = ExtractionConfig {
            renderings: vec![],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoRenderings)));

        assert!(ExtractionConfig::from_toml_str("majority_threshold = 1.5").is_err());
        assert!(ExtractionConfig::from_toml_str("tasks = []").is_err());
        assert!("everything".parse::<Task>().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nedextract.toml");
        std::fs::write(&path, "sub_role_window = 4\n").unwrap();

        let config = ExtractionConfig::from_file(&path).unwrap();
        assert_eq!(config.sub_role_window, 4);
    }
}
