#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod document;
pub mod error;
pub mod ingest;
pub mod keywords;
pub mod orgs;
pub mod persons;
pub mod report;
pub mod sector;
pub mod text;

pub use config::{ConfigError, ExtractionConfig, RegistryConfig, Task};
pub use document::DocumentInput;
pub use error::{Error, Result};
pub use ingest::{
    Annotation, BatchResult, DocumentOutput, DocumentPipeline, EntityLabel, LexiconNer, NerError,
    NerService, PipelineError, RenderingOptions,
};
pub use orgs::{OrganizationMatcher, Registry, RegistryEntry, RegistryError, TrueOrganization};
pub use persons::{MainRole, PersonIdentityGroup, RoleAssignment, RoleState, SubRole};
pub use report::{OrganizationRow, PersonRow, ResultTables, SectorRow};
pub use sector::{ClassifierError, KeywordSectorClassifier, SectorClassifier};
