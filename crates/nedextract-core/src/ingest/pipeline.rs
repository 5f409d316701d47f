use std::path::Path;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::aggregator::{AnnotatedRendering, CandidateAggregator};
use super::ner::{NerError, NerService};
use super::normalizer::{DefaultNormalizer, TextNormalizer};
use crate::config::{ConfigError, ExtractionConfig, Task};
use crate::document::{file_title, DocumentInput};
use crate::orgs::{
    main_organization, OrganizationAdjudicator, OrganizationMatcher, Registry, TrueOrganization,
};
use crate::persons::{PersonDeduplicator, PersonIdentityGroup, RoleAssignment, RoleResolver};
use crate::report::{OrganizationRow, PersonRow, ResultTables, SectorRow};
use crate::sector::{classify_sector, ClassifierError, SectorClassifier};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("NER error: {0}")]
    Ner(#[from] NerError),
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Clone, Default)]
pub struct DocumentStats {
    pub renderings: usize,
    pub candidates: usize,
    pub organizations: usize,
    pub persons: usize,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ResolvedPerson {
    pub group: PersonIdentityGroup,
    pub assignment: RoleAssignment,
}

pub struct DocumentOutput {
    pub document_id: Uuid,
    pub title: String,
    pub content_hash: String,
    pub tasks: Vec<Task>,
    pub main_organization: Option<String>,
    pub organizations: Vec<TrueOrganization>,
    pub persons: Vec<ResolvedPerson>,
    pub sector: Option<String>,
    pub stats: DocumentStats,
    pub processed_at: DateTime<Utc>,
}

impl DocumentOutput {
    /// Result rows for the tasks this document was processed with.
    pub fn tables(&self) -> ResultTables {
        let org = self.main_organization.as_deref();
        let mut tables = ResultTables::new();

        if self.tasks.contains(&Task::People) {
            tables.persons = self
                .persons
                .iter()
                .map(|p| PersonRow::new(&self.title, org, &p.group, &p.assignment))
                .collect();
        }
        if self.tasks.contains(&Task::Orgs) {
            tables.organizations = self
                .organizations
                .iter()
                .map(|o| OrganizationRow::new(&self.title, o))
                .collect();
        }
        if self.tasks.contains(&Task::Sectors) {
            tables.sectors.push(SectorRow {
                document: self.title.clone(),
                organization: self.main_organization.clone(),
                sector: self.sector.clone(),
            });
        }
        tables
    }
}

pub struct DocumentPipeline {
    config: ExtractionConfig,
    normalizer: Box<dyn TextNormalizer>,
    ner: Box<dyn NerService>,
    classifier: Option<Box<dyn SectorClassifier>>,
    matcher: Option<OrganizationMatcher>,
    aggregator: CandidateAggregator,
    adjudicator: OrganizationAdjudicator,
    deduplicator: PersonDeduplicator,
    resolver: RoleResolver,
}

impl DocumentPipeline {
    #[must_use]
    pub fn new(ner: Box<dyn NerService>) -> Self {
        let config = ExtractionConfig::default();
        Self {
            normalizer: Box::new(DefaultNormalizer::default()),
            ner,
            classifier: None,
            matcher: None,
            aggregator: CandidateAggregator::default(),
            adjudicator: OrganizationAdjudicator::from_config(&config),
            deduplicator: PersonDeduplicator::default(),
            resolver: RoleResolver::from_config(&config),
            config,
        }
    }

    /// Replace the configuration after validating it. A registry that is
    /// already loaded picks up the new name prefix.
    pub fn with_config(mut self, config: ExtractionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        self.adjudicator = OrganizationAdjudicator::from_config(&config);
        self.resolver = RoleResolver::from_config(&config);
        self.matcher = self
            .matcher
            .take()
            .map(|m| m.with_name_prefix(&config.registry.name_prefix));
        self.config = config;
        Ok(self)
    }

    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Box<dyn TextNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: Box<dyn SectorClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.matcher = Some(
            OrganizationMatcher::new(registry).with_name_prefix(&self.config.registry.name_prefix),
        );
        self
    }

    /// Load the registry CSV using the configured column names.
    pub fn with_registry_path(self, path: &Path) -> crate::Result<Self> {
        let registry = Registry::from_path(path, &self.config.registry)?;
        Ok(self.with_registry(registry))
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub async fn process(&self, document: &DocumentInput) -> PipelineResult<DocumentOutput> {
        let start = std::time::Instant::now();
        let mut output = DocumentOutput {
            document_id: document.id,
            title: document.title.clone(),
            content_hash: document.content_hash.clone(),
            tasks: self.config.tasks.clone(),
            main_organization: None,
            organizations: Vec::new(),
            persons: Vec::new(),
            sector: None,
            stats: DocumentStats::default(),
            processed_at: Utc::now(),
        };

        let primary_text = if self.config.needs_ner() {
            let renderings = self
                .normalizer
                .render_all(&document.text, &self.config.renderings);
            output.stats.renderings = renderings.len();

            let mut annotated = Vec::with_capacity(renderings.len());
            for rendering in renderings {
                let annotation = self.ner.recognize(&rendering.text).await?;
                annotated.push(AnnotatedRendering::new(rendering, annotation));
            }

            let aggregation = self.aggregator.aggregate(self.ner.as_ref(), &annotated).await?;
            output.stats.candidates = aggregation.candidates.len();
            output.main_organization = main_organization(&aggregation.primary);

            if self.config.has_task(Task::Orgs) {
                let mut organizations = self
                    .adjudicator
                    .adjudicate(&aggregation.candidates, &aggregation.primary_text);
                if let Some(matcher) = &self.matcher {
                    matcher.annotate(&mut organizations);
                }
                output.stats.organizations = organizations.len();
                output.organizations = organizations;
            }

            if self.config.has_task(Task::People) {
                output.persons = self.resolve_people(&annotated, &aggregation.person_names);
                output.stats.persons = output.persons.len();
            }

            aggregation.primary_text
        } else {
            self.config
                .renderings
                .first()
                .map(|options| self.normalizer.render(&document.text, options).text)
                .unwrap_or_default()
        };

        if self.config.has_task(Task::Sectors) {
            match &self.classifier {
                Some(classifier) => {
                    output.sector = classify_sector(classifier.as_ref(), &primary_text).await?;
                }
                None => tracing::debug!(document = %document.title, "No sector classifier configured"),
            }
        }

        output.stats.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            document = %document.title,
            id = %document.id,
            candidates = output.stats.candidates,
            organizations = output.stats.organizations,
            persons = output.stats.persons,
            duration_ms = output.stats.duration_ms,
            "Processed document"
        );
        Ok(output)
    }

    /// Group and resolve people on the configured person rendering.
    fn resolve_people(
        &self,
        annotated: &[AnnotatedRendering],
        person_names: &[String],
    ) -> Vec<ResolvedPerson> {
        let Some(people) = annotated
            .get(self.config.person_rendering)
            .or_else(|| annotated.first())
        else {
            return Vec::new();
        };

        let names = self.deduplicator.filter(person_names, people.text());
        let groups = self.deduplicator.group(&names);
        let assignments = self
            .resolver
            .resolve_all(&groups, &people.annotation.sentences);
        groups
            .into_iter()
            .zip(assignments)
            .map(|(group, assignment)| ResolvedPerson { group, assignment })
            .collect()
    }

    /// Process documents one after another. A failing document is recorded
    /// and does not stop the batch.
    pub async fn process_batch(&self, documents: &[DocumentInput]) -> BatchResult {
        let mut result = BatchResult::new();

        for document in documents {
            match self.process(document).await {
                Ok(output) => result.add_success(output),
                Err(e) => {
                    tracing::warn!(document = %document.title, error = %e, "Document failed");
                    result.add_failure(document.title.clone(), e);
                }
            }
        }

        result
    }

    /// Process every `.txt` file in a directory, in file name order.
    pub async fn process_directory(&self, dir: &Path) -> PipelineResult<BatchResult> {
        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|e| e == "txt") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut result = BatchResult::new();
        for path in paths {
            let title = file_title(&path);
            match DocumentInput::from_text_file(&path).await {
                Ok(document) => match self.process(&document).await {
                    Ok(output) => result.add_success(output),
                    Err(e) => result.add_failure(title, e),
                },
                Err(e) => result.add_failure(title, e.into()),
            }
        }
        Ok(result)
    }
}

pub struct BatchResult {
    pub successful: Vec<DocumentOutput>,
    pub failed: Vec<(String, PipelineError)>,
}

impl BatchResult {
    #[must_use]
    pub fn new() -> Self {
        Self {
            successful: Vec::new(),
            failed: Vec::new(),
        }
    }

    fn add_success(&mut self, output: DocumentOutput) {
        self.successful.push(output);
    }

    fn add_failure(&mut self, title: String, error: PipelineError) {
        self.failed.push((title, error));
    }

    pub fn success_count(&self) -> usize {
        self.successful.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    /// Rows of every successful document, in batch order.
    pub fn tables(&self) -> ResultTables {
        let mut tables = ResultTables::new();
        for output in &self.successful {
            tables.extend(output.tables());
        }
        tables
    }
}

impl Default for BatchResult {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{Annotation, LexiconNer, NerResult};
    use crate::orgs::RegistryEntry;
    use crate::persons::MainRole;
    use crate::sector::KeywordSectorClassifier;

    struct FailingNer;

    #[async_trait::async_trait]
    impl NerService for FailingNer {
        fn backend_id(&self) -> &str {
            "failing"
        }

        async fn recognize(&self, _text: &str) -> NerResult<Annotation> {
            Err(NerError::ModelUnavailable("offline".into()))
        }
    }

    /// Fails on any text mentioning `onleesbaar`, otherwise defers to a lexicon.
    struct SelectiveNer(LexiconNer);

    #[async_trait::async_trait]
    impl NerService for SelectiveNer {
        fn backend_id(&self) -> &str {
            "selective"
        }

        async fn recognize(&self, text: &str) -> NerResult<Annotation> {
            if text.contains("onleesbaar") {
                return Err(NerError::Failed("unreadable text".into()));
            }
            self.0.recognize(text).await
        }
    }

    fn lexicon() -> LexiconNer {
        LexiconNer::new()
            .with_organizations(&["Natuurpunt"])
            .with_persons(&["Jane Doe"])
    }

    #[tokio::test]
    async fn test_process_document() {
        let pipeline = DocumentPipeline::new(Box::new(lexicon()));
        let doc = DocumentInput::new(
            "natuurpunt.txt",
            "Natuurpunt beschermt natuur.\n\nBestuur\nJane Doe, voorzitter\n\nNatuurpunt groeit.",
        );

        let output = pipeline.process(&doc).await.unwrap();

        assert_eq!(output.main_organization.as_deref(), Some("Natuurpunt"));
        assert_eq!(output.organizations, vec![TrueOrganization::new("Natuurpunt", 2)]);
        assert_eq!(output.persons.len(), 1);
        assert_eq!(output.persons[0].assignment.main_role(), Some(MainRole::Bestuur));
        assert_eq!(output.stats.renderings, 3);

        let tables = output.tables();
        assert_eq!(tables.persons[0].organization.as_deref(), Some("Natuurpunt"));
        assert_eq!(tables.sectors.len(), 1);
        assert_eq!(tables.sectors[0].sector, None);
    }

    #[tokio::test]
    async fn test_sectors_only_skips_ner() {
        let config = ExtractionConfig {
            tasks: vec![Task::Sectors],
            ..Default::default()
        };
        let pipeline = DocumentPipeline::new(Box::new(FailingNer))
            .with_config(config)
            .unwrap()
            .with_classifier(Box::new(
                KeywordSectorClassifier::new().with_sector("Natuur en milieu", &["natuur"]),
            ));

        let output = pipeline
            .process(&DocumentInput::new("a.txt", "Wij beschermen de natuur."))
            .await
            .unwrap();

        assert_eq!(output.sector.as_deref(), Some("Natuur en milieu"));
        assert_eq!(output.stats.renderings, 0);
        let tables = output.tables();
        assert!(tables.persons.is_empty() && tables.organizations.is_empty());
        assert_eq!(tables.sectors.len(), 1);
    }

    #[tokio::test]
    async fn test_batch_records_failures() {
        let pipeline = DocumentPipeline::new(Box::new(FailingNer));
        let docs = vec![DocumentInput::new("a.txt", "tekst")];

        let result = pipeline.process_batch(&docs).await;
        assert_eq!(result.success_count(), 0);
        assert_eq!(result.failure_count(), 1);
        assert_eq!(result.failed[0].0, "a.txt");
        assert!(matches!(result.failed[0].1, PipelineError::Ner(_)));
    }

    #[tokio::test]
    async fn test_failing_document_keeps_rows_of_the_others() {
        let pipeline = DocumentPipeline::new(Box::new(SelectiveNer(lexicon())));
        let docs = vec![
            DocumentInput::new("kapot.txt", "Deze tekst is onleesbaar."),
            DocumentInput::new("goed.txt", "Natuurpunt werkt. Natuurpunt groeit."),
        ];

        let result = pipeline.process_batch(&docs).await;
        assert_eq!(result.failure_count(), 1);
        assert_eq!(result.failed[0].0, "kapot.txt");
        assert_eq!(result.success_count(), 1);

        let tables = result.tables();
        assert_eq!(tables.organizations.len(), 1);
        assert_eq!(tables.organizations[0].document, "goed.txt");
        assert_eq!(tables.organizations[0].name, "Natuurpunt");
        assert_eq!(tables.sectors.len(), 1);
        assert_eq!(tables.sectors[0].document, "goed.txt");
    }

    #[tokio::test]
    async fn test_unreadable_file_is_reported_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "Natuurpunt werkt.").unwrap();
        std::fs::write(dir.path().join("b.txt"), [0xff, 0xfe, 0xfd]).unwrap();

        let result = DocumentPipeline::new(Box::new(lexicon()))
            .process_directory(dir.path())
            .await
            .unwrap();

        assert_eq!(result.successful[0].title, "a.txt");
        assert_eq!(result.failure_count(), 1);
        assert_eq!(result.failed[0].0, "b.txt");
        assert!(matches!(result.failed[0].1, PipelineError::Io(_)));
    }

    #[test]
    fn test_with_config_updates_registry_prefix() {
        let registry = Registry::new(vec![
            RegistryEntry::new("7").with_statutory_name("Vereniging Ons Dorp")
        ]);
        let mut config = ExtractionConfig::default();
        config.registry.name_prefix = "Vereniging".to_string();

        let pipeline = DocumentPipeline::new(Box::new(lexicon()))
            .with_registry(registry)
            .with_config(config)
            .unwrap();

        let matcher = pipeline.matcher.as_ref().unwrap();
        assert_eq!(matcher.match_name("Ons Dorp").map(|e| e.id.as_str()), Some("7"));
    }

    #[test]
    fn test_with_config_rejects_invalid_config() {
        let config = ExtractionConfig {
            renderings: Vec::new(),
            ..Default::default()
        };
        let result = DocumentPipeline::new(Box::new(lexicon())).with_config(config);
        assert!(matches!(result, Err(ConfigError::NoRenderings)));

        let config = ExtractionConfig {
            majority_threshold: 1.5,
            ..Default::default()
        };
        let result = DocumentPipeline::new(Box::new(lexicon())).with_config(config);
        assert!(matches!(result, Err(ConfigError::InvalidValue("majority_threshold", _))));
    }

    #[tokio::test]
    async fn test_empty_document_yields_no_rows() {
        let pipeline = DocumentPipeline::new(Box::new(lexicon()));
        let output = pipeline
            .process(&DocumentInput::new("leeg.txt", ""))
            .await
            .unwrap();

        assert!(output.organizations.is_empty());
        assert!(output.persons.is_empty());
        assert_eq!(output.main_organization, None);
    }
}
