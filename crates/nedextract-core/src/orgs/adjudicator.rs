use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ExtractionConfig;
use crate::ingest::{Annotation, Candidate, CandidateTable, EntityLabel};
use crate::keywords;
use crate::text::{contains_whole_word, count_mentions, normalize_mention};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    NoMentions,
    NegativeKeyword,
    TaggedMajority,
    TaggedMinority,
    PositiveKeyword,
    Standalone,
    NotStandalone,
    ClippedVariant,
    KeywordAlias,
}

impl Reason {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoMentions => "no_mentions",
            Self::NegativeKeyword => "negative_keyword",
            Self::TaggedMajority => "tagged_majority",
            Self::TaggedMinority => "tagged_minority",
            Self::PositiveKeyword => "positive_keyword",
            Self::Standalone => "standalone",
            Self::NotStandalone => "not_standalone",
            Self::ClippedVariant => "clipped_variant",
            Self::KeywordAlias => "keyword_alias",
        }
    }
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum Decision {
    Accept(Reason),
    Reject(Reason),
}

impl Decision {
    pub fn accepted(&self) -> bool {
        matches!(self, Self::Accept(_))
    }

    pub fn reason(&self) -> Reason {
        match self {
            Self::Accept(r) | Self::Reject(r) => *r,
        }
    }
}

/// An organization the document really names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrueOrganization {
    pub name: String,
    pub mentions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_id: Option<String>,
}

impl TrueOrganization {
    #[must_use]
    pub fn new(name: impl Into<String>, mentions: usize) -> Self {
        Self {
            name: name.into(),
            mentions,
            registry_id: None,
        }
    }

    #[must_use]
    pub fn with_registry_id(mut self, id: impl Into<String>) -> Self {
        self.registry_id = Some(id.into());
        self
    }
}

pub struct OrganizationAdjudicator {
    majority_threshold: f64,
    containment_min_mentions: usize,
    min_stripped_len: usize,
}

impl OrganizationAdjudicator {
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    #[must_use]
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            majority_threshold: config.majority_threshold,
            containment_min_mentions: config.containment_min_mentions,
            min_stripped_len: config.min_stripped_len,
        }
    }

    #[must_use]
    pub fn with_majority_threshold(mut self, threshold: f64) -> Self {
        self.majority_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_containment_min_mentions(mut self, min: usize) -> Self {
        self.containment_min_mentions = min;
        self
    }

    /// The candidate actually judged: role words stripped off, when that
    /// leaves a usable name, as a single mention without standalone evidence.
    pub fn effective<'a>(&self, candidate: &'a Candidate) -> Cow<'a, Candidate> {
        if !keywords::needs_role_strip(&candidate.key) {
            return Cow::Borrowed(candidate);
        }
        let stripped = keywords::strip_role_prefix(&candidate.key);
        if stripped == candidate.key || stripped.chars().count() < self.min_stripped_len {
            return Cow::Borrowed(candidate);
        }
        Cow::Owned(
            Candidate::new(stripped, 1, 1)
                .with_standalone(false)
                .with_sentences(candidate.sentences.clone()),
        )
    }

    /// Judge a candidate on its own evidence, without looking at other
    /// organizations.
    pub fn decide(&self, candidate: &Candidate) -> Decision {
        let candidate = self.effective(candidate);
        self.decide_independent(&candidate)
    }

    fn decide_independent(&self, candidate: &Candidate) -> Decision {
        if candidate.mentions == 0 {
            return Decision::Reject(Reason::NoMentions);
        }

        let positive = keywords::has_org_positive(&candidate.key);
        if !positive && keywords::has_org_negative(&candidate.key) {
            return Decision::Reject(Reason::NegativeKeyword);
        }

        if candidate.mentions >= 2 {
            if candidate.tagged_ratio() > self.majority_threshold {
                return Decision::Accept(Reason::TaggedMajority);
            }
            if positive {
                return Decision::Accept(Reason::PositiveKeyword);
            }
            return Decision::Reject(Reason::TaggedMinority);
        }

        if candidate.is_standalone() {
            Decision::Accept(Reason::Standalone)
        } else if positive {
            Decision::Accept(Reason::PositiveKeyword)
        } else {
            Decision::Reject(Reason::NotStandalone)
        }
    }

    /// A single-mention name that is a clipped or keyword-prefixed form of a
    /// frequent accepted organization is not an organization of its own.
    fn absorbed_by(&self, key: &str, accepted: &[TrueOrganization]) -> Option<Reason> {
        accepted
            .iter()
            .filter(|t| t.mentions >= self.containment_min_mentions)
            .find_map(|t| {
                let other = t.name.as_str();
                if key.len() < other.len() && contains_whole_word(other, key) {
                    let rest = other.replacen(key, " ", 1);
                    (!keywords::is_only_org_keywords(&rest)).then_some(Reason::ClippedVariant)
                } else if other.len() < key.len() && contains_whole_word(key, other) {
                    let rest = key.replacen(other, " ", 1);
                    keywords::is_only_org_keywords(&rest).then_some(Reason::KeywordAlias)
                } else {
                    None
                }
            })
    }

    /// Promote candidates to organizations. Multi-mention candidates are
    /// judged first, then singletons in key order so containment always
    /// compares against the same set.
    pub fn adjudicate(&self, candidates: &CandidateTable, text: &str) -> Vec<TrueOrganization> {
        let effective: Vec<Cow<'_, Candidate>> =
            candidates.iter().map(|c| self.effective(c)).collect();
        let (multi, single): (Vec<_>, Vec<_>) =
            effective.iter().partition(|c| c.mentions >= 2);

        let mut accepted: Vec<TrueOrganization> = Vec::new();
        for candidate in multi.into_iter().chain(single) {
            let mut decision = self.decide_independent(candidate);
            if decision.accepted() && candidate.is_singleton() {
                if let Some(reason) = self.absorbed_by(&candidate.key, &accepted) {
                    decision = Decision::Reject(reason);
                }
            }

            tracing::debug!(
                key = %candidate.key,
                accepted = decision.accepted(),
                reason = %decision.reason(),
                "Adjudicated organization candidate"
            );

            if !decision.accepted() || accepted.iter().any(|t| t.name == candidate.key) {
                continue;
            }
            let count = count_mentions(text, &candidate.key);
            if count == 0 {
                tracing::debug!(key = %candidate.key, "Dropping organization absent from text");
                continue;
            }
            accepted.push(TrueOrganization::new(candidate.key.clone(), count));
        }

        accepted
    }
}

impl Default for OrganizationAdjudicator {
    fn default() -> Self {
        Self::new()
    }
}

/// The organization tagged most often in the primary rendering; ties go to
/// the lexicographically first name.
pub fn main_organization(primary: &Annotation) -> Option<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for mention in primary.with_label(EntityLabel::Organization) {
        let key = normalize_mention(&mention.text);
        if !key.is_empty() {
            *counts.entry(key).or_default() += 1;
        }
    }

    let mut best: Option<(String, usize)> = None;
    for (key, count) in counts {
        if best.as_ref().is_none_or(|(_, n)| count > *n) {
            best = Some((key, count));
        }
    }
    best.map(|(key, _)| key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::RawMention;

    fn adjudicator() -> OrganizationAdjudicator {
        OrganizationAdjudicator::new()
    }

    #[test]
    fn test_zero_mentions_never_accepted() {
        let candidate = Candidate::new("Stichting Huppeldepup", 0, 0).with_standalone(true);
        assert_eq!(
            adjudicator().decide(&candidate),
            Decision::Reject(Reason::NoMentions)
        );
    }

    #[test]
    fn test_negative_keyword_rejects() {
        let candidate = Candidate::new("Raad van Toezicht", 3, 3);
        assert_eq!(
            adjudicator().decide(&candidate),
            Decision::Reject(Reason::NegativeKeyword)
        );
    }

    #[test]
    fn test_majority_is_strict() {
        assert!(!adjudicator().decide(&Candidate::new("Natuurpunt", 4, 2)).accepted());
        assert_eq!(
            adjudicator().decide(&Candidate::new("Natuurpunt", 4, 3)),
            Decision::Accept(Reason::TaggedMajority)
        );
        assert_eq!(
            adjudicator().decide(&Candidate::new("Stichting Natuurpunt", 4, 1)),
            Decision::Accept(Reason::PositiveKeyword)
        );
    }

    #[test]
    fn test_singletons_need_standalone_or_keyword() {
        let abc = Candidate::new("ABCbank", 1, 1).with_standalone(true);
        assert_eq!(adjudicator().decide(&abc), Decision::Accept(Reason::Standalone));

        let gemeente = Candidate::new("Gemeente", 1, 1).with_standalone(false);
        assert_eq!(
            adjudicator().decide(&gemeente),
            Decision::Reject(Reason::NotStandalone)
        );
    }

    #[test]
    fn test_role_prefix_is_stripped() {
        let candidate = Candidate::new("Voorzitter Vereniging Ons Dorp", 2, 2);
        let effective = adjudicator().effective(&candidate);
        assert_eq!(effective.key, "Vereniging Ons Dorp");
        assert!(effective.is_singleton());
        assert!(adjudicator().decide(&candidate).accepted());

        let text = "Jane is voorzitter van Vereniging Ons Dorp.";
        let table: CandidateTable = [candidate].into_iter().collect();
        let orgs = adjudicator().adjudicate(&table, text);
        assert_eq!(orgs, vec![TrueOrganization::new("Vereniging Ons Dorp", 1)]);
    }

    #[test]
    fn test_containment_against_frequent_organization() {
        let text = "Natuurpunt werkt. Natuurpunt groeit. Natuurpunt Limburg ook. \
                    Stichting Natuurpunt bestaat.";
        let table: CandidateTable = [
            Candidate::new("Natuurpunt", 3, 3),
            Candidate::new("Stichting Natuurpunt", 1, 1).with_standalone(true),
            Candidate::new("Natuurpunt Limburg", 1, 1).with_standalone(true),
        ]
        .into_iter()
        .collect();

        let orgs = adjudicator().adjudicate(&table, text);
        let names: Vec<&str> = orgs.iter().map(|o| o.name.as_str()).collect();

        assert_eq!(names, vec!["Natuurpunt", "Natuurpunt Limburg"]);
        assert_eq!(orgs[0].mentions, 4);
    }

    #[test]
    fn test_clipped_variant_rejected() {
        let text = "Natuurpunt Vlaanderen. Natuurpunt Vlaanderen. Natuurpunt Vlaanderen.";
        let table: CandidateTable = [
            Candidate::new("Natuurpunt Vlaanderen", 3, 3),
            Candidate::new("Vlaanderen", 1, 1).with_standalone(true),
        ]
        .into_iter()
        .collect();

        let orgs = adjudicator().adjudicate(&table, text);
        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0].name, "Natuurpunt Vlaanderen");
    }

    #[test]
    fn test_containment_ignores_infrequent_organizations() {
        let text = "Natuurpunt werkt. Stichting Natuurpunt bestaat.";
        let table: CandidateTable = [
            Candidate::new("Natuurpunt", 2, 2),
            Candidate::new("Stichting Natuurpunt", 1, 1).with_standalone(true),
        ]
        .into_iter()
        .collect();

        assert_eq!(adjudicator().adjudicate(&table, text).len(), 2);
    }

    #[test]
    fn test_accepted_but_absent_is_dropped() {
        let table: CandidateTable = [Candidate::new("ABCbank", 1, 1).with_standalone(true)]
            .into_iter()
            .collect();
        assert!(adjudicator().adjudicate(&table, "Geen bank hier.").is_empty());
    }

    #[test]
    fn test_main_organization() {
        let org = |text: &str| RawMention {
            text: text.to_string(),
            label: EntityLabel::Organization,
            sentence: 0,
            start: 0,
            end: text.len(),
        };
        let annotation = Annotation {
            sentences: Vec::new(),
            mentions: vec![org("Zeta"), org("Alfa"), org("Zeta"), org("Alfa")],
        };

        assert_eq!(main_organization(&annotation).as_deref(), Some("Alfa"));
        assert_eq!(main_organization(&Annotation::default()), None);
    }
}
