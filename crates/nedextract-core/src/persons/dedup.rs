use serde::{Deserialize, Serialize};

use crate::ingest::Sentence;
use crate::keywords;
use crate::text::whole_word_positions;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Given {
    Initial(char),
    Full(String),
}

impl Given {
    fn compatible(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Initial(a), Self::Initial(b)) => a == b,
            (Self::Initial(c), Self::Full(s)) | (Self::Full(s), Self::Initial(c)) => {
                s.starts_with(*c)
            }
            (Self::Full(a), Self::Full(b)) => a == b,
        }
    }
}

/// A person mention split into given names and surname.
#[derive(Debug, Clone)]
struct ParsedName {
    display: String,
    given: Vec<Given>,
    surname: String,
    full_tokens: usize,
}

fn is_initials(token: &str) -> bool {
    let letters = token.trim_end_matches('.');
    if letters.is_empty() {
        return false;
    }
    if letters.chars().count() == 1 {
        return letters.chars().all(char::is_alphabetic);
    }
    token.contains('.')
        && letters
            .split('.')
            .all(|p| p.chars().count() == 1 && p.chars().all(char::is_alphabetic))
}

fn strip_titles(raw: &str) -> Vec<&str> {
    raw.split_whitespace()
        .map(|t| t.trim_matches(','))
        .filter(|t| !t.is_empty() && !keywords::is_title(t))
        .collect()
}

fn parse_name(raw: &str) -> Option<ParsedName> {
    let tokens = strip_titles(raw);
    let (last, rest) = tokens.split_last()?;

    let mut surname_start = rest.len();
    while surname_start > 0 && keywords::is_tussenvoegsel(rest[surname_start - 1]) {
        surname_start -= 1;
    }

    let mut given = Vec::new();
    for token in &rest[..surname_start] {
        if is_initials(token) {
            given.extend(
                token
                    .chars()
                    .filter(|c| c.is_alphabetic())
                    .flat_map(char::to_lowercase)
                    .map(Given::Initial),
            );
        } else {
            given.push(Given::Full(token.to_lowercase()));
        }
    }

    let surname = rest[surname_start..]
        .iter()
        .chain(std::iter::once(last))
        .map(|t| t.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    let full_tokens = tokens.iter().filter(|t| !is_initials(t)).count();

    Some(ParsedName {
        display: tokens.join(" "),
        given,
        surname,
        full_tokens,
    })
}

/// Given names of the shorter name appear in order within the longer one.
fn ordered_subset(short: &[Given], long: &[Given]) -> bool {
    let mut remaining = long.iter();
    short
        .iter()
        .all(|g| remaining.by_ref().any(|l| g.compatible(l)))
}

fn compatible(a: &ParsedName, b: &ParsedName) -> bool {
    if a.surname != b.surname || a.given.is_empty() || b.given.is_empty() {
        return false;
    }
    if a.given.len() <= b.given.len() {
        ordered_subset(&a.given, &b.given)
    } else {
        ordered_subset(&b.given, &a.given)
    }
}

/// Raw name variants believed to denote one individual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonIdentityGroup {
    /// Most complete variant not shared with another group, titles removed
    pub canonical: String,
    /// Raw mentions in order of first appearance
    pub variants: Vec<String>,
}

impl PersonIdentityGroup {
    /// Indices of sentences mentioning any variant.
    pub fn context_sentences(&self, sentences: &[Sentence]) -> Vec<usize> {
        sentences
            .iter()
            .enumerate()
            .filter(|(_, s)| {
                self.variants
                    .iter()
                    .any(|v| !whole_word_positions(&s.text, v).is_empty())
            })
            .map(|(i, _)| i)
            .collect()
    }
}

/// Greedy alias grouping of person names.
pub struct PersonDeduplicator;

impl PersonDeduplicator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Drop mentions that cannot be a person: too short, a job title, or a
    /// photo credit (`© Jane Doe`).
    pub fn filter(&self, raw_names: &[String], text: &str) -> Vec<String> {
        raw_names
            .iter()
            .filter(|name| {
                let letters = strip_titles(name)
                    .iter()
                    .flat_map(|t| t.chars())
                    .filter(|c| c.is_alphabetic())
                    .count();
                letters >= 2 && !keywords::is_job_keyword(name) && !is_photo_credit(name, text)
            })
            .cloned()
            .collect()
    }

    /// Single greedy pass: a name joins the first group whose canonical name
    /// it is compatible with, otherwise it opens a new group. A more complete
    /// variant only becomes canonical when no other group's canonical is
    /// compatible with it, so canonicals never match each other.
    pub fn group(&self, raw_names: &[String]) -> Vec<PersonIdentityGroup> {
        let mut groups: Vec<DraftGroup> = Vec::new();

        for raw in raw_names {
            let Some(parsed) = parse_name(raw) else {
                continue;
            };
            if groups.iter().any(|g| g.variants.contains(raw)) {
                continue;
            }

            let Some(target) = groups.iter().position(|g| compatible(g.canonical(), &parsed)) else {
                groups.push(DraftGroup::new(parsed, raw.clone()));
                continue;
            };

            let promote = parsed.full_tokens > groups[target].canonical().full_tokens
                && groups
                    .iter()
                    .enumerate()
                    .all(|(i, g)| i == target || !compatible(g.canonical(), &parsed));

            let group = &mut groups[target];
            group.parsed.push(parsed);
            group.variants.push(raw.clone());
            if promote {
                group.canonical = group.parsed.len() - 1;
            }
        }

        groups
            .into_iter()
            .map(|g| PersonIdentityGroup {
                canonical: g.canonical().display.clone(),
                variants: g.variants,
            })
            .collect()
    }
}

struct DraftGroup {
    canonical: usize,
    parsed: Vec<ParsedName>,
    variants: Vec<String>,
}

impl DraftGroup {
    fn new(parsed: ParsedName, raw: String) -> Self {
        Self {
            canonical: 0,
            parsed: vec![parsed],
            variants: vec![raw],
        }
    }

    fn canonical(&self) -> &ParsedName {
        &self.parsed[self.canonical]
    }
}

impl Default for PersonDeduplicator {
    fn default() -> Self {
        Self::new()
    }
}

fn is_photo_credit(name: &str, text: &str) -> bool {
    whole_word_positions(text, name)
        .into_iter()
        .any(|pos| text[..pos].trim_end().ends_with('©'))
}
