use std::sync::LazyLock;

use regex::Regex;

/// Fragments that make a candidate likely to be a real organization, any case.
const ORG_POSITIVE_FRAGMENTS: &[&str] = &[
    r"bv",
    r"b\.v",
    r"congregatie",
    r"fonds\b",
    r"fondsen\b",
    r"fund\b",
    r"ministerie",
    r"umc",
    r"nederland\b",
];

/// Capitalized words that make a candidate likely to be a real organization.
const ORG_POSITIVE_WORDS: &[&str] = &[
    r"Association",
    r"Coöperatie",
    r"CBF",
    r"Firma",
    r"Foundation",
    r"Hospice",
    r"Hogeschool",
    r"Holding",
    r"Institute",
    r"Instituut",
    r"Inc\.",
    r"Koninklijk Nederlands",
    r"Koninklijke Nederlandse",
    r"Loterij",
    r"LLP",
    r"Medisch Centrum",
    r"Museum",
    r"NV",
    r"N\.V",
    r"Stichting",
    r"Trust",
    r"U\.A",
    r"Universiteit",
    r"University",
    r"Vereniging",
    r"Ziekenhuis",
    r"Ziekenhuizen",
];

/// Fragments that mark a candidate as a job title or generic report term.
const ORG_NEGATIVE_FRAGMENTS: &[&str] = &[
    r"abonnement",
    r"activa",
    r"afdeling",
    r"akkoord",
    r"assembly",
    r"baten",
    r"bedrijfsvoering",
    r"begroting",
    r"beleid",
    r"bestuur",
    r"board",
    r"cao",
    r"commissie",
    r"commissaris",
    r"committee",
    r"congres",
    r"corona",
    r"council",
    r"covid",
    r"directeur",
    r"directie",
    r"docent",
    r"emeritus",
    r"fonds op naam",
    r"fondsen op naam",
    r"functie",
    r"fy2",
    r"interim",
    r"jaarrekening",
    r"jaarverslag",
    r"jury",
    r"lid\b",
    r"kosten",
    r"magazine",
    r"manager",
    r"managing",
    r"netwerk",
    r"overhead",
    r"overige",
    r"passiva",
    r"penningmeester",
    r"portefeuille",
    r"premie",
    r"president",
    r"raad",
    r"regeling",
    r"reserve",
    r"review",
    r"richtlijn",
    r"rj640",
    r"rj 640",
    r"rj 650",
    r"rj 2016",
    r"saldo",
    r"startdatum",
    r"\btbv\b",
    r"traineeship",
    r"van toezicht",
    r"verkiezing",
    r"voorzitter",
    r"www\.",
    r"\.nl",
    r"\.com",
];

/// Generic terms that are never an organization when they form the whole candidate.
const ORG_NEGATIVE_WHOLE: &[&str] = &[
    "aandelen", "ab", "agile", "algemeen nut beogende instelling", "anbi", "arbo", "avg",
    "beheer & administratie", "beheer en administratie", "beweging", "bhv", "bic", "b&a", "bw",
    "ceo", "cfo", "cio", "corporate", "country offices", "crm",
    "customer relationship management", "cto", "db", "derden", "ebola", "eindredactie", "eur",
    "finance & operations", "financiën", "finance", "fondsenwerving", "fonds", "fondsen", "fte",
    "fundraising", "gdpr", "great fundraising", "good governance", "governance", "hr", "hrm",
    "huisvesting", "human resources", "iban", "ict", "industrie", "integrity", "leasing", "lobby",
    "lobbyen", "managementteam", "management team", "management", "marketing", "mt", "naam",
    "national organization", "national organizations", "pensioenfonds", "pensioenfondsen",
    "personeelsopbouw", "program offices", "project offices", "p&o", "risk and audit", "rj", "rvt",
    "rvb", "sar", "sars", "sv", "tv", "vgba", "vio", "vog", "war",
];

/// Leading role words stripped off a candidate, any case.
const ROLE_POSITIONS: &[&str] = &[
    "adviseur", "bestuurslid", "ceo", "cfo", "chief technology officer", "cio", "commissaris",
    "cto", "directeur", "lid", "penningmeester", "secretaris", "vice voorzitter", "vicevoorzitter",
    "vice-voorzitter", "voorzitter",
];

/// Articles and prepositions stripped between role words, case-sensitive.
const ROLE_CONNECTORS: &[&str] = &[
    r"van\b", r"voor\b", r"bij\b", r"in\b", r"v\.", r"en\b", r"de\b", r"het\b", r"een\b",
];

const ROLE_COUNCILS: &[&str] = &[
    "wetenschappelijke adviesraad",
    "maatschappelijke adviesraad",
    "bestuur",
    "toezicht",
    "advies",
    "commissarissen",
    "adviesraad",
    "rvt",
    "rvc",
    "rvb",
];

const ROLE_SUFFIXES: &[&str] = &["hoofdfuncties", "hoofdfunctie", "nevenfuncties", "nevenfunctie"];

struct OrgLexicon {
    positive_fragments: Vec<Regex>,
    positive_words: Vec<Regex>,
    negative_fragments: Vec<Regex>,
    positions: Vec<Regex>,
    connectors: Vec<Regex>,
    raad: Regex,
    councils: Vec<Regex>,
    suffixes: Vec<Regex>,
}

fn compile(patterns: &[&str], template: impl Fn(&str) -> String) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&template(p)).expect("static keyword pattern should compile"))
        .collect()
}

static ORG_LEXICON: LazyLock<OrgLexicon> = LazyLock::new(|| OrgLexicon {
    positive_fragments: compile(ORG_POSITIVE_FRAGMENTS, |p| format!("(?i){p}")),
    positive_words: compile(ORG_POSITIVE_WORDS, |p| {
        if p.ends_with(char::is_alphanumeric) {
            format!(r"\b{p}\b")
        } else {
            format!(r"\b{p}")
        }
    }),
    negative_fragments: compile(ORG_NEGATIVE_FRAGMENTS, |p| format!("(?i){p}")),
    positions: compile(ROLE_POSITIONS, |p| format!(r"(?i)^{}\b", regex::escape(p))),
    connectors: compile(ROLE_CONNECTORS, |p| format!("^{p}")),
    raad: Regex::new(r"(?i)^raad\b").expect("static keyword pattern should compile"),
    councils: compile(ROLE_COUNCILS, |p| format!(r"(?i)^{}\b", regex::escape(p))),
    suffixes: compile(ROLE_SUFFIXES, |p| format!("(?i){p}$")),
});

fn partial_hit(re: &Regex, text: &str) -> bool {
    let whole = text.trim();
    re.find_iter(whole).any(|m| m.as_str().len() < whole.len())
}

/// True when the candidate contains an organizational keyword without being
/// only that keyword.
pub fn has_org_positive(candidate: &str) -> bool {
    let lex = &*ORG_LEXICON;
    lex.positive_fragments
        .iter()
        .chain(lex.positive_words.iter())
        .any(|re| partial_hit(re, candidate))
}

/// True when the candidate contains a job title or generic term, or is one.
pub fn has_org_negative(candidate: &str) -> bool {
    let lower = candidate.trim().to_lowercase();
    ORG_NEGATIVE_WHOLE.contains(&lower.as_str())
        || ORG_LEXICON
            .negative_fragments
            .iter()
            .any(|re| re.is_match(candidate))
}

/// True when `text` has letters and consists of nothing but organizational
/// keywords (e.g. the `Stichting` in `Stichting X` once `X` is removed).
pub fn is_only_org_keywords(text: &str) -> bool {
    if !text.chars().any(char::is_alphanumeric) {
        return false;
    }
    let lex = &*ORG_LEXICON;
    let mut rest = text.to_string();
    for re in lex.positive_words.iter().chain(lex.positive_fragments.iter()) {
        rest = re.replace_all(&rest, " ").into_owned();
    }
    !rest.chars().any(char::is_alphanumeric)
}

/// Whether a candidate mentions a role or council and should have its role
/// prefix stripped before adjudication.
pub fn needs_role_strip(candidate: &str) -> bool {
    let lower = candidate.to_lowercase();
    ROLE_POSITIONS
        .iter()
        .chain(ROLE_COUNCILS.iter())
        .any(|kw| lower.contains(kw))
}

fn strip_leading(text: String, patterns: &[Regex]) -> String {
    patterns.iter().fold(text, |acc, re| {
        re.replace(&acc, "").trim_start().to_string()
    })
}

/// Strip a person's role off an organization name.
///
/// `Lid van de Raad van Toezicht bij Stichting X` becomes `Stichting X`.
pub fn strip_role_prefix(candidate: &str) -> String {
    let lex = &*ORG_LEXICON;
    let mut org = candidate.to_string();

    for _ in 0..2 {
        org = strip_leading(org, &lex.positions);
        org = strip_leading(org, &lex.connectors);
    }
    org = lex.raad.replace(&org, "").trim_start().to_string();
    org = strip_leading(org, &lex.connectors);
    org = strip_leading(org, &lex.councils);
    org = strip_leading(org, &lex.connectors);

    for re in &lex.suffixes {
        org = re.replace(&org, "").trim_end().to_string();
    }
    org
}

pub const DIRECTEUR: &[&str] = &[
    "directeur",
    "directrice",
    "directie",
    "bestuurder",
    "directeuren",
    "directeur-bestuurder",
];
pub const BESTUUR: &[&str] = &[
    "bestuur",
    "db",
    "ab",
    "rvb",
    "bestuurslid",
    "bestuursleden",
    "hoofdbestuur",
    "bestuursvoorzitter",
];
pub const RAAD_VAN_TOEZICHT: &[&str] = &[
    "rvt",
    "raad van toezicht",
    "raad v. toezicht",
    "auditcommissie",
    "audit commissie",
];
pub const LEDENRAAD: &[&str] = &["ledenraad", "ledenraadsvoorzitter", "ledenraadpresidium"];
pub const KASCOMMISSIE: &[&str] = &["kascommissie"];
pub const CONTROLECOMMISSIE: &[&str] = &["controlecommissie"];
pub const AMBASSADEUR: &[&str] = &["ambassadeur", "ambassadeurs"];

pub const VICEVOORZITTER: &[&str] = &["vicevoorzitter"];
pub const VOORZITTER: &[&str] = &["voorzitter"];
pub const PENNINGMEESTER: &[&str] = &["penningmeester"];
pub const SECRETARIS: &[&str] = &["secretaris", "secretariaat"];
pub const COMMISSARIS: &[&str] = &["commissaris", "commissariaat"];
pub const LID: &[&str] = &["lid", "leden", "bestuurslid", "bestuursleden"];
pub const ADVISEUR: &[&str] = &["adviseur", "adviseurs"];

/// Modifiers that sit between a role word and a name without changing the role.
pub const ROLE_MODIFIERS: &[&str] = &["algemeen", "adjunct", "interim"];

/// Every job keyword, main and sub, ambassador included.
pub fn is_job_keyword(word: &str) -> bool {
    let lower = word.trim().to_lowercase();
    [
        DIRECTEUR,
        BESTUUR,
        RAAD_VAN_TOEZICHT,
        LEDENRAAD,
        KASCOMMISSIE,
        CONTROLECOMMISSIE,
        AMBASSADEUR,
        VICEVOORZITTER,
        VOORZITTER,
        PENNINGMEESTER,
        SECRETARIS,
        COMMISSARIS,
        LID,
        ADVISEUR,
    ]
    .iter()
    .any(|list| list.contains(&lower.as_str()))
}

/// Honorifics and academic titles, lowercase.
pub const TITLES: &[&str] = &[
    "prof.", "dr.", "mr.", "ir.", "drs.", "bacc.", "kand.", "dr.h.c.", "ing.", "bc.", "phd",
    "phd.", "dhr.", "mevr.", "mw.", "ds.", "mgr.", "mevrouw", "meneer", "jhr.", "pastor",
    "pastoor", "dominee", "priester", "imam", "rabbi", "rabbijn",
];

/// Dutch surname particles (tussenvoegsels), one-letter particles omitted.
pub const TUSSENVOEGSELS: &[&str] = &[
    "'s", "'m", "'t", "aan", "af", "al", "am", "auf", "ben", "bij", "bin", "boven", "da", "dal",
    "dal'", "dalla", "das", "de", "deca", "degli", "dei", "del", "della", "dem", "den", "der",
    "des", "di", "die", "do", "don", "dos", "du", "el", "gen", "het", "im", "in", "la", "las",
    "le", "les", "lo", "los", "of", "onder", "op", "over", "te", "ten", "ter", "tho", "thoe",
    "thor", "to", "toe", "tot", "uijt", "uit", "unter", "van", "ver", "vom", "von", "voor", "vor",
    "zu", "zum", "zur",
];

pub fn is_title(token: &str) -> bool {
    let lower = token.trim_matches(',').to_lowercase();
    TITLES.contains(&lower.as_str())
}

pub fn is_tussenvoegsel(token: &str) -> bool {
    TUSSENVOEGSELS.contains(&token.to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_keyword_requires_more_than_keyword() {
        assert!(has_org_positive("Huppeldepup B.V"));
        assert!(has_org_positive("Stichting Huppeldepup"));
        assert!(!has_org_positive("Ministerie"));
        assert!(!has_org_positive("Hogeschool"));
    }

    #[test]
    fn test_capitalized_keywords_are_case_sensitive() {
        assert!(!has_org_positive("stichting huppeldepup"));
        assert!(has_org_positive("Vereniging Natuurmonumenten"));
    }

    #[test]
    fn test_negative_keywords() {
        assert!(has_org_negative("Raad van Toezicht"));
        assert!(has_org_negative("Jaarverslag 2021"));
        assert!(has_org_negative("ANBI"));
        assert!(!has_org_negative("Natuurmonumenten"));
    }

    #[test]
    fn test_only_org_keywords() {
        assert!(is_only_org_keywords("Stichting"));
        assert!(is_only_org_keywords(" Foundation "));
        assert!(!is_only_org_keywords("Stichting Onderzoek"));
        assert!(!is_only_org_keywords(" "));
    }

    #[test]
    fn test_strip_role_prefix() {
        assert_eq!(
            strip_role_prefix("Lid van de Raad van Toezicht bij Stichting Huppeldepup"),
            "Stichting Huppeldepup"
        );
        assert_eq!(strip_role_prefix("voorzitter Vereniging Ons Dorp"), "Vereniging Ons Dorp");
        assert_eq!(strip_role_prefix("Rabobank nevenfunctie"), "Rabobank");
        assert!(needs_role_strip("Voorzitter Rabobank"));
        assert!(!needs_role_strip("Rabobank"));
    }

    #[test]
    fn test_job_keywords_and_titles() {
        assert!(is_job_keyword("Voorzitter"));
        assert!(is_job_keyword("raad van toezicht"));
        assert!(!is_job_keyword("Jane"));
        assert!(is_title("Dr."));
        assert!(is_title("PhD,"));
        assert!(is_tussenvoegsel("van"));
        assert!(!is_tussenvoegsel("Doe"));
    }
}
