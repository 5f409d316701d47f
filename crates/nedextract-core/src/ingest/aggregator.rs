use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use super::ner::{Annotation, EntityLabel, NerResult, NerService, RawMention};
use super::normalizer::Rendering;
use crate::text::{count_whole_word, normalize_mention};

/// One rendering together with the NER output produced for it.
#[derive(Debug, Clone)]
pub struct AnnotatedRendering {
    pub rendering: Rendering,
    pub annotation: Annotation,
}

impl AnnotatedRendering {
    #[must_use]
    pub fn new(rendering: Rendering, annotation: Annotation) -> Self {
        Self {
            rendering,
            annotation,
        }
    }

    pub fn text(&self) -> &str {
        &self.rendering.text
    }
}

/// Evidence for a single organization surface form across all renderings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub key: String,
    pub mentions: usize,
    pub tagged_org: usize,
    /// Only evaluated for single-mention candidates
    pub standalone: Option<bool>,
    pub sentences: Vec<String>,
}

impl Candidate {
    #[must_use]
    pub fn new(key: impl Into<String>, mentions: usize, tagged_org: usize) -> Self {
        Self {
            key: key.into(),
            mentions,
            tagged_org: tagged_org.min(mentions),
            standalone: None,
            sentences: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_standalone(mut self, standalone: bool) -> Self {
        self.standalone = Some(standalone);
        self
    }

    #[must_use]
    pub fn with_sentences(mut self, sentences: Vec<String>) -> Self {
        self.sentences = sentences;
        self
    }

    pub fn is_singleton(&self) -> bool {
        self.mentions == 1
    }

    pub fn is_standalone(&self) -> bool {
        self.standalone.unwrap_or(false)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn tagged_ratio(&self) -> f64 {
        if self.mentions == 0 {
            return 0.0;
        }
        self.tagged_org as f64 / self.mentions as f64
    }
}

/// Candidates of one document, ordered by key.
#[derive(Debug, Clone, Default)]
pub struct CandidateTable {
    candidates: BTreeMap<String, Candidate>,
}

impl CandidateTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, candidate: Candidate) {
        self.candidates.insert(candidate.key.clone(), candidate);
    }

    pub fn get(&self, key: &str) -> Option<&Candidate> {
        self.candidates.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.values()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl FromIterator<Candidate> for CandidateTable {
    fn from_iter<I: IntoIterator<Item = Candidate>>(iter: I) -> Self {
        let mut table = Self::new();
        for candidate in iter {
            table.insert(candidate);
        }
        table
    }
}

/// Everything later stages need from the NER pass over one document.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub candidates: CandidateTable,
    /// Distinct person names in order of first appearance, primary rendering first
    pub person_names: Vec<String>,
    pub primary_text: String,
    pub primary: Annotation,
}

#[derive(Default)]
struct Evidence {
    /// Raw-text offsets of the tagged occurrences
    offsets: BTreeSet<usize>,
    sentences: Vec<String>,
}

pub struct CandidateAggregator;

impl CandidateAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Fold the ORG spans of every rendering into candidates and collect
    /// person names. Single-mention candidates get one extra NER call on the
    /// bare key.
    pub async fn aggregate(
        &self,
        ner: &dyn NerService,
        renderings: &[AnnotatedRendering],
    ) -> NerResult<Aggregation> {
        let Some(primary) = renderings.first() else {
            return Ok(Aggregation::default());
        };

        let mut evidence: BTreeMap<String, Evidence> = BTreeMap::new();
        for annotated in renderings {
            for mention in annotated.annotation.with_label(EntityLabel::Organization) {
                let Some((key, offset)) = occurrence(&annotated.rendering, mention) else {
                    continue;
                };
                let entry = evidence.entry(key).or_default();
                entry.offsets.insert(offset);
                if let Some(sentence) = annotated.annotation.sentence_text(mention) {
                    if !entry.sentences.iter().any(|s| s == sentence) {
                        entry.sentences.push(sentence.to_string());
                    }
                }
            }
        }

        let mut candidates = CandidateTable::new();
        for (key, found) in evidence {
            let tagged = found.offsets.len();
            let mentions = count_whole_word(primary.text(), &key).max(tagged);
            let mut candidate = Candidate::new(key, mentions, tagged).with_sentences(found.sentences);

            if candidate.is_singleton() {
                let standalone = standalone_org(ner, &candidate.key).await?;
                candidate = candidate.with_standalone(standalone);
            }

            tracing::debug!(
                key = %candidate.key,
                mentions = candidate.mentions,
                tagged_org = candidate.tagged_org,
                standalone = ?candidate.standalone,
                "Aggregated organization candidate"
            );
            candidates.insert(candidate);
        }

        Ok(Aggregation {
            candidates,
            person_names: person_names(renderings),
            primary_text: primary.text().to_string(),
            primary: primary.annotation.clone(),
        })
    }
}

impl Default for CandidateAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalized key of a tagged span plus the raw-text offset where the key
/// starts, so the same occurrence matches across renderings.
fn occurrence(rendering: &Rendering, mention: &RawMention) -> Option<(String, usize)> {
    let key = normalize_mention(&mention.text);
    if key.is_empty() {
        return None;
    }
    let offset = mention.text.find(key.as_str()).unwrap_or(0);
    let raw_start = rendering.raw_offset(mention.start + offset)?;
    Some((key, raw_start))
}

async fn standalone_org(ner: &dyn NerService, key: &str) -> NerResult<bool> {
    let annotation = ner.recognize(key).await?;
    let orgs: Vec<&RawMention> = annotation.with_label(EntityLabel::Organization).collect();
    Ok(orgs.len() == 1 && normalize_mention(&orgs[0].text) == key)
}

fn clean_person(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| matches!(c, ',' | ';' | ':' | '(' | ')' | '"'))
        .trim()
        .to_string()
}

fn person_names(renderings: &[AnnotatedRendering]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for annotated in renderings {
        for mention in annotated.annotation.with_label(EntityLabel::Person) {
            let name = clean_person(&mention.text);
            if !name.is_empty() && seen.insert(name.clone()) {
                names.push(name);
            }
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ner::{split_sentences, LexiconNer};
    use crate::ingest::normalizer::{DefaultNormalizer, RenderingOptions, TextNormalizer};
    use crate::orgs::{Decision, OrganizationAdjudicator, Reason};
    use crate::text::whole_word_positions;

    fn annotated(text: &str, tags: &[(&str, usize, EntityLabel)]) -> AnnotatedRendering {
        tag(
            Rendering::unmapped(RenderingOptions::comma_paragraphs(), text),
            tags,
        )
    }

    fn tag(rendering: Rendering, tags: &[(&str, usize, EntityLabel)]) -> AnnotatedRendering {
        let text = rendering.text.as_str();
        let sentences = split_sentences(text);
        let mentions = tags
            .iter()
            .map(|(phrase, nth, label)| {
                let start = whole_word_positions(text, phrase)[*nth];
                let sentence = sentences
                    .iter()
                    .position(|s| s.start <= start && start < s.end)
                    .unwrap();
                RawMention {
                    text: (*phrase).to_string(),
                    label: *label,
                    sentence,
                    start,
                    end: start + phrase.len(),
                }
            })
            .collect();

        AnnotatedRendering::new(
            rendering,
            Annotation {
                sentences,
                mentions,
            },
        )
    }

    #[tokio::test]
    async fn test_occurrences_merge_across_renderings() {
        let text = "Rode Kruis helpt. Het Rode Kruis groeit. Rode Kruis.";
        let renderings = vec![
            annotated(text, &[("Rode Kruis", 0, EntityLabel::Organization)]),
            annotated(
                text,
                &[
                    ("Rode Kruis", 0, EntityLabel::Organization),
                    ("Rode Kruis", 1, EntityLabel::Organization),
                ],
            ),
        ];

        let aggregation = CandidateAggregator::new()
            .aggregate(&LexiconNer::new(), &renderings)
            .await
            .unwrap();

        let candidate = aggregation.candidates.get("Rode Kruis").unwrap();
        assert_eq!(candidate.mentions, 3);
        assert_eq!(candidate.tagged_org, 2);
        assert_eq!(candidate.standalone, None);
        assert_eq!(
            candidate.sentences,
            vec!["Rode Kruis helpt.", "Het Rode Kruis groeit."]
        );
    }

    #[tokio::test]
    async fn test_occurrences_match_when_a_name_is_split_across_lines() {
        let raw = "Rode\nKruis helpt. Het Rode Kruis groeit.";
        let mut renderings = DefaultNormalizer::new().render_all(raw, &RenderingOptions::defaults());
        let lines = renderings.pop().unwrap();
        assert_eq!(lines.text, "Rode. Kruis helpt. Het Rode Kruis groeit.");

        let annotated = vec![
            tag(
                renderings.remove(0),
                &[("Rode Kruis", 0, EntityLabel::Organization)],
            ),
            tag(lines, &[("Rode Kruis", 0, EntityLabel::Organization)]),
        ];

        let aggregation = CandidateAggregator::new()
            .aggregate(&LexiconNer::new(), &annotated)
            .await
            .unwrap();

        let candidate = aggregation.candidates.get("Rode Kruis").unwrap();
        assert_eq!((candidate.mentions, candidate.tagged_org), (2, 2));
        assert_eq!(
            OrganizationAdjudicator::new().decide(candidate),
            Decision::Accept(Reason::TaggedMajority)
        );
    }

    #[tokio::test]
    async fn test_singleton_standalone_check() {
        let text = "ABCbank heeft een nieuwe directeur. Ook Gemeente sprak.";
        let renderings = vec![annotated(
            text,
            &[
                ("ABCbank", 0, EntityLabel::Organization),
                ("Gemeente", 0, EntityLabel::Organization),
            ],
        )];
        let ner = LexiconNer::new().with_organizations(&["ABCbank"]);

        let aggregation = CandidateAggregator::new()
            .aggregate(&ner, &renderings)
            .await
            .unwrap();

        let abc = aggregation.candidates.get("ABCbank").unwrap();
        assert_eq!((abc.mentions, abc.tagged_org), (1, 1));
        assert!(abc.is_standalone());
        assert_eq!(aggregation.candidates.get("Gemeente").unwrap().standalone, Some(false));
    }

    #[tokio::test]
    async fn test_person_names_in_first_appearance_order() {
        let text = "Jane Doe en J. Doe. Daarna Jane Doe.";
        let renderings = vec![
            annotated(
                text,
                &[
                    ("Jane Doe", 0, EntityLabel::Person),
                    ("Jane Doe", 1, EntityLabel::Person),
                ],
            ),
            annotated(text, &[("J. Doe", 0, EntityLabel::Person)]),
        ];

        let aggregation = CandidateAggregator::new()
            .aggregate(&LexiconNer::new(), &renderings)
            .await
            .unwrap();

        assert_eq!(aggregation.person_names, vec!["Jane Doe", "J. Doe"]);
        assert!(aggregation.candidates.is_empty());
        assert_eq!(aggregation.primary_text, text);
    }

    #[tokio::test]
    async fn test_no_renderings_yields_empty_aggregation() {
        let aggregation = CandidateAggregator::new()
            .aggregate(&LexiconNer::new(), &[])
            .await
            .unwrap();
        assert!(aggregation.candidates.is_empty());
        assert!(aggregation.person_names.is_empty());
    }

    #[test]
    fn test_candidate_ratio_and_invariant() {
        let candidate = Candidate::new("X", 2, 5);
        assert_eq!(candidate.tagged_org, 2);
        assert!((candidate.tagged_ratio() - 1.0).abs() < f64::EPSILON);
        assert!((Candidate::new("Y", 0, 0).tagged_ratio()).abs() < f64::EPSILON);
    }
}
