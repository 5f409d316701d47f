use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::adjudicator::TrueOrganization;
use crate::config::RegistryConfig;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Registry is missing column: {0}")]
    MissingColumn(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// One row of the reference registry of legal entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub id: String,
    pub statutory_name: Option<String>,
    pub short_name: Option<String>,
}

impl RegistryEntry {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            statutory_name: None,
            short_name: None,
        }
    }

    #[must_use]
    pub fn with_statutory_name(mut self, name: impl Into<String>) -> Self {
        self.statutory_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_short_name(mut self, name: impl Into<String>) -> Self {
        self.short_name = Some(name.into());
        self
    }

    /// Case-insensitive equality against the statutory name, then the short name.
    fn matches(&self, lowered: &str) -> bool {
        [&self.statutory_name, &self.short_name]
            .into_iter()
            .flatten()
            .any(|n| n.to_lowercase() == lowered)
    }
}

/// Registry rows in file order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
    skipped: usize,
}

fn column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

fn field(record: &csv::StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

impl Registry {
    #[must_use]
    pub fn new(entries: Vec<RegistryEntry>) -> Self {
        Self {
            entries,
            skipped: 0,
        }
    }

    /// Load a CSV registry with a header row. Unusable rows are skipped and
    /// counted, never fatal.
    pub fn from_reader<R: Read>(reader: R, config: &RegistryConfig) -> RegistryResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let id_idx = column(&headers, &config.id_column)
            .ok_or_else(|| RegistryError::MissingColumn(config.id_column.clone()))?;
        let statutory_idx = column(&headers, &config.statutory_name_column);
        let short_idx = column(&headers, &config.short_name_column);
        if statutory_idx.is_none() && short_idx.is_none() {
            return Err(RegistryError::MissingColumn(
                config.statutory_name_column.clone(),
            ));
        }

        let mut registry = Self::default();
        for (line, record) in csv_reader.records().enumerate() {
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(row = line + 1, error = %e, "Skipping unreadable registry row");
                    registry.skipped += 1;
                    continue;
                }
            };

            let Some(id) = field(&record, Some(id_idx)) else {
                tracing::warn!(row = line + 1, "Skipping registry row without identifier");
                registry.skipped += 1;
                continue;
            };
            let statutory_name = field(&record, statutory_idx);
            let short_name = field(&record, short_idx);
            if statutory_name.is_none() && short_name.is_none() {
                tracing::warn!(row = line + 1, id = %id, "Skipping registry row without names");
                registry.skipped += 1;
                continue;
            }

            registry.entries.push(RegistryEntry {
                id,
                statutory_name,
                short_name,
            });
        }

        tracing::info!(
            entries = registry.entries.len(),
            skipped = registry.skipped,
            "Loaded organization registry"
        );
        Ok(registry)
    }

    pub fn from_path(path: &Path, config: &RegistryConfig) -> RegistryResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file), config)
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Rows dropped while loading.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Exact, case-insensitive lookup of organization names in a registry.
pub struct OrganizationMatcher {
    registry: Registry,
    name_prefix: String,
}

impl OrganizationMatcher {
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            name_prefix: RegistryConfig::default().name_prefix,
        }
    }

    #[must_use]
    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn find(&self, lowered: &str) -> Option<&RegistryEntry> {
        self.registry.entries.iter().find(|e| e.matches(lowered))
    }

    /// Bare name first, then the name with the organizational prefix.
    pub fn match_name(&self, name: &str) -> Option<&RegistryEntry> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.find(&name.to_lowercase()).or_else(|| {
            let prefixed = format!("{} {name}", self.name_prefix.trim());
            self.find(&prefixed.to_lowercase())
        })
    }

    /// Fill in registry identifiers on organizations that have a match.
    pub fn annotate(&self, organizations: &mut [TrueOrganization]) {
        for org in organizations.iter_mut() {
            if let Some(entry) = self.match_name(&org.name) {
                tracing::debug!(name = %org.name, id = %entry.id, "Matched organization to registry");
                org.registry_id = Some(entry.id.clone());
            }
        }
    }
}
