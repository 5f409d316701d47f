mod aggregator;
mod ner;
mod normalizer;
mod pipeline;

pub use aggregator::{
    Aggregation, AnnotatedRendering, Candidate, CandidateAggregator, CandidateTable,
};
pub use ner::{
    split_sentences, Annotation, EntityLabel, LexiconNer, NerError, NerResult, NerService,
    RawMention, Sentence,
};
pub use normalizer::{DefaultNormalizer, Rendering, RenderingOptions, TextNormalizer};
pub use pipeline::{
    BatchResult, DocumentOutput, DocumentPipeline, DocumentStats, PipelineError, PipelineResult,
    ResolvedPerson,
};
