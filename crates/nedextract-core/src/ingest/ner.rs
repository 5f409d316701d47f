use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keywords;
use crate::text::whole_word_positions;

#[derive(Debug, Error)]
pub enum NerError {
    #[error("NER model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("Recognition failed: {0}")]
    Failed(String),
    #[error("Text too long: {0} bytes (max: {1})")]
    TextTooLong(usize, usize),
}

pub type NerResult<T> = Result<T, NerError>;

/// Entity labels as emitted by Dutch NER models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityLabel {
    Person,
    Organization,
    Location,
    Misc,
}

impl EntityLabel {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "PER",
            Self::Organization => "ORG",
            Self::Location => "LOC",
            Self::Misc => "MISC",
        }
    }
}

impl std::fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityLabel {
    type Err = NerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PER" | "PERSON" => Ok(Self::Person),
            "ORG" | "ORGANIZATION" => Ok(Self::Organization),
            "LOC" | "LOCATION" => Ok(Self::Location),
            "MISC" => Ok(Self::Misc),
            other => Err(NerError::Failed(format!("unknown entity label: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// A span tagged by NER in one rendering. Offsets are bytes into the text
/// that was passed to [`NerService::recognize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMention {
    pub text: String,
    pub label: EntityLabel,
    pub sentence: usize,
    pub start: usize,
    pub end: usize,
}

/// Output of one NER call: sentence segmentation plus tagged spans in text order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Annotation {
    pub sentences: Vec<Sentence>,
    pub mentions: Vec<RawMention>,
}

impl Annotation {
    pub fn with_label(&self, label: EntityLabel) -> impl Iterator<Item = &RawMention> {
        self.mentions.iter().filter(move |m| m.label == label)
    }

    pub fn sentence_text(&self, mention: &RawMention) -> Option<&str> {
        self.sentences.get(mention.sentence).map(|s| s.text.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.mentions.is_empty()
    }
}

/// Named-entity recognition over Dutch text.
///
/// Implementations must handle both whole documents and bare phrases; the
/// aggregator calls back with single candidate names for standalone checks.
#[async_trait::async_trait]
pub trait NerService: Send + Sync {
    fn backend_id(&self) -> &str;

    async fn recognize(&self, text: &str) -> NerResult<Annotation>;
}

/// Split text into sentences on `.`, `!` and `?` followed by whitespace.
///
/// Periods after initials and titles (`J.`, `dr.`) do not end a sentence.
pub fn split_sentences(text: &str) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let next_is_space = chars.peek().is_none_or(|(_, n)| n.is_whitespace());
        if !next_is_space || (c == '.' && is_abbreviation(&text[start..=idx])) {
            continue;
        }
        push_sentence(text, start, idx + c.len_utf8(), &mut sentences);
        start = idx + c.len_utf8();
    }
    push_sentence(text, start, text.len(), &mut sentences);
    sentences
}

fn is_abbreviation(upto_period: &str) -> bool {
    let last = upto_period.split_whitespace().next_back().unwrap_or("");
    let bare = last.trim_start_matches(|c: char| !c.is_alphanumeric());
    let letters = bare.trim_end_matches('.');
    letters.chars().count() == 1
        || letters.split('.').all(|p| p.chars().count() == 1)
        || keywords::is_title(bare)
}

fn push_sentence(text: &str, start: usize, end: usize, out: &mut Vec<Sentence>) {
    let slice = &text[start..end];
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return;
    }
    let offset = start + (slice.len() - slice.trim_start().len());
    out.push(Sentence {
        text: trimmed.to_string(),
        start: offset,
        end: offset + trimmed.len(),
    });
}

/// Dictionary-backed recognizer: tags every whole-word occurrence of a known
/// phrase, longest phrase first, without overlaps.
pub struct LexiconNer {
    entries: Vec<(String, EntityLabel)>,
}

impl LexiconNer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_entry(mut self, phrase: &str, label: EntityLabel) -> Self {
        self.add_entry(phrase, label);
        self
    }

    #[must_use]
    pub fn with_persons(mut self, names: &[&str]) -> Self {
        for name in names {
            self.add_entry(name, EntityLabel::Person);
        }
        self
    }

    #[must_use]
    pub fn with_organizations(mut self, names: &[&str]) -> Self {
        for name in names {
            self.add_entry(name, EntityLabel::Organization);
        }
        self
    }

    pub fn add_entry(&mut self, phrase: &str, label: EntityLabel) {
        let phrase = phrase.trim();
        if phrase.is_empty() {
            return;
        }
        self.entries.push((phrase.to_string(), label));
        self.entries
            .sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
    }

    fn tag_sentence(&self, index: usize, sentence: &Sentence) -> Vec<RawMention> {
        let mut mentions: Vec<RawMention> = Vec::new();

        for (phrase, label) in &self.entries {
            for pos in whole_word_positions(&sentence.text, phrase) {
                let start = sentence.start + pos;
                let end = start + phrase.len();
                let overlaps = mentions.iter().any(|m| start < m.end && m.start < end);
                if !overlaps {
                    mentions.push(RawMention {
                        text: phrase.clone(),
                        label: *label,
                        sentence: index,
                        start,
                        end,
                    });
                }
            }
        }

        mentions.sort_by_key(|m| m.start);
        mentions
    }
}

impl Default for LexiconNer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl NerService for LexiconNer {
    fn backend_id(&self) -> &str {
        "lexicon"
    }

    async fn recognize(&self, text: &str) -> NerResult<Annotation> {
        let sentences = split_sentences(text);
        let mentions = sentences
            .iter()
            .enumerate()
            .flat_map(|(i, s)| self.tag_sentence(i, s))
            .collect();

        Ok(Annotation {
            sentences,
            mentions,
        })
    }
}
