use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::dedup::PersonIdentityGroup;
use crate::config::ExtractionConfig;
use crate::ingest::Sentence;
use crate::keywords;
use crate::text::{contains_whole_word, whole_word_positions, word_tokens};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MainRole {
    Directeur,
    RaadVanToezicht,
    Bestuur,
    Ledenraad,
    Kascommissie,
    Controlecommissie,
}

impl MainRole {
    pub const ALL: [Self; 6] = [
        Self::Directeur,
        Self::RaadVanToezicht,
        Self::Bestuur,
        Self::Ledenraad,
        Self::Kascommissie,
        Self::Controlecommissie,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Directeur => "directeur",
            Self::RaadVanToezicht => "raad-van-toezicht",
            Self::Bestuur => "bestuur",
            Self::Ledenraad => "ledenraad",
            Self::Kascommissie => "kascommissie",
            Self::Controlecommissie => "controlecommissie",
        }
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Directeur => keywords::DIRECTEUR,
            Self::RaadVanToezicht => keywords::RAAD_VAN_TOEZICHT,
            Self::Bestuur => keywords::BESTUUR,
            Self::Ledenraad => keywords::LEDENRAAD,
            Self::Kascommissie => keywords::KASCOMMISSIE,
            Self::Controlecommissie => keywords::CONTROLECOMMISSIE,
        }
    }
}

impl std::fmt::Display for MainRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubRole {
    Directeur,
    Voorzitter,
    Vicevoorzitter,
    Lid,
    Penningmeester,
    Secretaris,
    Commissaris,
    Adviseur,
}

impl SubRole {
    pub const ALL: [Self; 8] = [
        Self::Directeur,
        Self::Voorzitter,
        Self::Vicevoorzitter,
        Self::Lid,
        Self::Penningmeester,
        Self::Secretaris,
        Self::Commissaris,
        Self::Adviseur,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Directeur => "directeur",
            Self::Voorzitter => "voorzitter",
            Self::Vicevoorzitter => "vicevoorzitter",
            Self::Lid => "lid",
            Self::Penningmeester => "penningmeester",
            Self::Secretaris => "secretaris",
            Self::Commissaris => "commissaris",
            Self::Adviseur => "adviseur",
        }
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Directeur => keywords::DIRECTEUR,
            Self::Voorzitter => keywords::VOORZITTER,
            Self::Vicevoorzitter => keywords::VICEVOORZITTER,
            Self::Lid => keywords::LID,
            Self::Penningmeester => keywords::PENNINGMEESTER,
            Self::Secretaris => keywords::SECRETARIS,
            Self::Commissaris => keywords::COMMISSARIS,
            Self::Adviseur => keywords::ADVISEUR,
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|role| role.keywords().contains(&token))
    }
}

impl std::fmt::Display for SubRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where role resolution ended for one person. A sub role never exists
/// without a main role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RoleState {
    #[default]
    Unassigned,
    MainAssigned { main: MainRole },
    Resolved { main: MainRole, sub: SubRole },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub state: RoleState,
    pub ambassador: bool,
}

impl RoleAssignment {
    pub fn main_role(&self) -> Option<MainRole> {
        match self.state {
            RoleState::Unassigned => None,
            RoleState::MainAssigned { main } | RoleState::Resolved { main, .. } => Some(main),
        }
    }

    pub fn sub_role(&self) -> Option<SubRole> {
        match self.state {
            RoleState::Resolved { sub, .. } => Some(sub),
            _ => None,
        }
    }
}

/// Lowercase, with the spelled-out vice chair forms joined into one word.
fn prepare(text: &str) -> String {
    text.to_lowercase()
        .replace("vice-voorzitter", "vicevoorzitter")
        .replace("vice voorzitter", "vicevoorzitter")
}

/// Earliest main-role keyword in a sentence.
fn first_main_role(sentence: &str) -> Option<MainRole> {
    let text = prepare(sentence);
    MainRole::ALL
        .into_iter()
        .filter_map(|role| {
            role.keywords()
                .iter()
                .filter_map(|kw| whole_word_positions(&text, kw).first().copied())
                .min()
                .map(|pos| (pos, role))
        })
        .min()
        .map(|(_, role)| role)
}

pub struct RoleResolver {
    sub_role_window: usize,
}

impl RoleResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    #[must_use]
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            sub_role_window: config.sub_role_window,
        }
    }

    #[must_use]
    pub fn with_sub_role_window(mut self, window: usize) -> Self {
        self.sub_role_window = window;
        self
    }

    pub fn resolve(&self, group: &PersonIdentityGroup, sentences: &[Sentence]) -> RoleAssignment {
        self.resolve_among(group, &[], sentences)
    }

    /// Resolve every group of a document. Each person's sub-role scan stops
    /// at the names of the other people.
    pub fn resolve_all(
        &self,
        groups: &[PersonIdentityGroup],
        sentences: &[Sentence],
    ) -> Vec<RoleAssignment> {
        groups
            .iter()
            .enumerate()
            .map(|(i, group)| {
                let others: Vec<&PersonIdentityGroup> = groups
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, g)| g)
                    .collect();
                self.resolve_among(group, &others, sentences)
            })
            .collect()
    }

    fn resolve_among(
        &self,
        group: &PersonIdentityGroup,
        others: &[&PersonIdentityGroup],
        sentences: &[Sentence],
    ) -> RoleAssignment {
        let direct = group.context_sentences(sentences);
        let direct_set: BTreeSet<usize> = direct.iter().copied().collect();
        let surrounding: BTreeSet<usize> = direct
            .iter()
            .flat_map(|&i| [i.checked_sub(1), Some(i + 1)])
            .flatten()
            .filter(|i| *i < sentences.len() && !direct_set.contains(i))
            .collect();

        let ambassador = direct.iter().any(|&i| {
            let text = prepare(&sentences[i].text);
            keywords::AMBASSADEUR
                .iter()
                .any(|kw| contains_whole_word(&text, kw))
        });

        let main = direct
            .iter()
            .chain(surrounding.iter())
            .find_map(|&i| first_main_role(&sentences[i].text));

        let state = match main {
            None => RoleState::Unassigned,
            Some(main) => match self.find_sub_role(group, others, sentences, &direct) {
                Some(sub) => RoleState::Resolved { main, sub },
                None => RoleState::MainAssigned { main },
            },
        };

        tracing::debug!(person = %group.canonical, ?state, ambassador, "Resolved role");
        RoleAssignment { state, ambassador }
    }

    /// Scan outward from each name occurrence, nearest token first and the
    /// preceding side before the following side.
    fn find_sub_role(
        &self,
        group: &PersonIdentityGroup,
        others: &[&PersonIdentityGroup],
        sentences: &[Sentence],
        direct: &[usize],
    ) -> Option<SubRole> {
        let own = variant_tokens(group);
        let foreign: Vec<Vec<String>> = others.iter().flat_map(|g| variant_tokens(g)).collect();

        for &i in direct {
            let tokens = tokenize(&prepare(&sentences[i].text));
            let words: Vec<String> = tokens.iter().map(|t| t.text.clone()).collect();
            let spans = name_spans(&words, &own);

            let mut blocked = vec![false; tokens.len()];
            for (start, end) in name_spans(&words, &foreign) {
                if !spans.iter().any(|&(s, e)| start < e && s < end) {
                    blocked[start..end].fill(true);
                }
            }

            for (start, end) in spans {
                if let Some(role) = self.scan(&tokens, &blocked, start, end) {
                    return Some(role);
                }
            }
        }
        None
    }

    /// A side stops at another person's name. The preceding side also stops
    /// at a comma; the following side may cross the comma right after the
    /// name (`Jane Doe, voorzitter`) but no further.
    fn scan(&self, tokens: &[Token], blocked: &[bool], start: usize, end: usize) -> Option<SubRole> {
        let mut before_open = true;
        let mut after_open = true;

        for distance in 1..=self.sub_role_window {
            if before_open {
                match start.checked_sub(distance) {
                    Some(j) if !tokens[j + 1].comma_before && !blocked[j] => {
                        if let Some(role) = SubRole::from_token(&tokens[j].text) {
                            return Some(role);
                        }
                    }
                    _ => before_open = false,
                }
            }
            if after_open {
                let j = end + distance - 1;
                match tokens.get(j) {
                    Some(token) if (j == end || !token.comma_before) && !blocked[j] => {
                        if let Some(role) = SubRole::from_token(&token.text) {
                            return Some(role);
                        }
                    }
                    _ => after_open = false,
                }
            }
            if !before_open && !after_open {
                break;
            }
        }
        None
    }
}

impl Default for RoleResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// A lowercase word of a sentence, role modifiers removed.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    text: String,
    /// A comma separates this token from the previous one
    comma_before: bool,
}

fn tokenize(sentence: &str) -> Vec<Token> {
    let mut words: Vec<Token> = Vec::new();
    let mut current = String::new();
    let mut comma = false;

    for c in sentence.chars() {
        if c.is_alphanumeric() {
            current.extend(c.to_lowercase());
            continue;
        }
        if !current.is_empty() {
            words.push(Token {
                text: std::mem::take(&mut current),
                comma_before: comma,
            });
            comma = false;
        }
        if c == ',' {
            comma = true;
        }
    }
    if !current.is_empty() {
        words.push(Token {
            text: current,
            comma_before: comma,
        });
    }

    let mut tokens = Vec::with_capacity(words.len());
    let mut pending = false;
    for mut word in words {
        if keywords::ROLE_MODIFIERS.contains(&word.text.as_str()) {
            pending |= word.comma_before;
            continue;
        }
        word.comma_before |= pending;
        pending = false;
        tokens.push(word);
    }
    tokens
}

fn variant_tokens(group: &PersonIdentityGroup) -> Vec<Vec<String>> {
    group
        .variants
        .iter()
        .map(|v| word_tokens(v))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Token spans `[start, end)` of every variant occurrence, in sentence order.
fn name_spans(tokens: &[String], variants: &[Vec<String>]) -> Vec<(usize, usize)> {
    let mut spans: Vec<(usize, usize)> = variants
        .iter()
        .flat_map(|name| {
            tokens
                .windows(name.len())
                .enumerate()
                .filter(move |(_, w)| *w == name.as_slice())
                .map(move |(start, _)| (start, start + name.len()))
        })
        .collect();
    spans.sort_unstable();
    spans.dedup();
    spans
}
