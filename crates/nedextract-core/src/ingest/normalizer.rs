use serde::{Deserialize, Serialize};

/// How line structure and parentheses are flattened in one rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderingOptions {
    /// Replacement for a blank line (paragraph break)
    pub blank_line: String,
    /// Replacement for a single line break
    pub end_of_line: String,
    /// Replacement for `(` and `)`
    pub parenthesis: String,
}

impl RenderingOptions {
    #[must_use]
    pub fn new(blank_line: &str, end_of_line: &str, parenthesis: &str) -> Self {
        Self {
            blank_line: blank_line.to_string(),
            end_of_line: end_of_line.to_string(),
            parenthesis: parenthesis.to_string(),
        }
    }

    /// Paragraphs read as list items, lines run on.
    pub fn comma_paragraphs() -> Self {
        Self::new(", ", " ", ", ")
    }

    /// Paragraphs read as sentence ends, lines run on.
    pub fn sentence_paragraphs() -> Self {
        Self::new(". ", " ", ", ")
    }

    /// Every line break ends a sentence.
    pub fn sentence_lines() -> Self {
        Self::new(". ", ". ", ", ")
    }

    pub fn defaults() -> Vec<Self> {
        vec![
            Self::comma_paragraphs(),
            Self::sentence_paragraphs(),
            Self::sentence_lines(),
        ]
    }
}

impl std::fmt::Display for RenderingOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "blank_line={:?} end_of_line={:?} parenthesis={:?}",
            self.blank_line, self.end_of_line, self.parenthesis
        )
    }
}

/// One normalized view of a document's text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rendering {
    pub options: RenderingOptions,
    pub text: String,
    /// Byte offset in the raw text for every byte of `text`
    #[serde(skip)]
    origin: Vec<usize>,
}

impl Rendering {
    /// A rendering whose offsets are taken to be raw offsets.
    #[must_use]
    pub fn unmapped(options: RenderingOptions, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            options,
            origin: (0..text.len()).collect(),
            text,
        }
    }

    /// Raw-text offset of a byte position in this rendering.
    pub fn raw_offset(&self, pos: usize) -> Option<usize> {
        self.origin.get(pos).copied()
    }
}

/// Text that remembers where each byte came from in the raw input.
struct MappedText {
    text: String,
    origin: Vec<usize>,
}

impl MappedText {
    fn new(raw: &str) -> Self {
        Self {
            text: raw.to_string(),
            origin: (0..raw.len()).collect(),
        }
    }

    fn splice<'a>(&'a self, matches: impl Iterator<Item = (usize, &'a str)>, to: &str) -> Self {
        let mut text = String::with_capacity(self.text.len());
        let mut origin = Vec::with_capacity(self.origin.len());
        let mut last = 0;

        for (start, found) in matches {
            text.push_str(&self.text[last..start]);
            origin.extend_from_slice(&self.origin[last..start]);
            text.push_str(to);
            origin.extend(std::iter::repeat_n(self.origin[start], to.len()));
            last = start + found.len();
        }
        text.push_str(&self.text[last..]);
        origin.extend_from_slice(&self.origin[last..]);

        Self { text, origin }
    }

    fn replace(self, from: &str, to: &str) -> Self {
        if !self.text.contains(from) {
            return self;
        }
        self.splice(self.text.match_indices(from), to)
    }

    fn replace_chars(self, chars: &[char], to: &str) -> Self {
        if !self.text.contains(chars) {
            return self;
        }
        self.splice(self.text.match_indices(chars), to)
    }

    fn replace_until_stable(mut self, from: &str, to: &str) -> Self {
        while self.text.contains(from) {
            self = self.replace(from, to);
        }
        self
    }
}

pub trait TextNormalizer: Send + Sync {
    fn render(&self, raw: &str, options: &RenderingOptions) -> Rendering;

    fn render_all(&self, raw: &str, options: &[RenderingOptions]) -> Vec<Rendering> {
        options.iter().map(|o| self.render(raw, o)).collect()
    }
}

/// Clean-up tuned for text pulled out of annual-report PDFs.
pub struct DefaultNormalizer;

impl DefaultNormalizer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for DefaultNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer for DefaultNormalizer {
    fn render(&self, raw: &str, options: &RenderingOptions) -> Rendering {
        let text = MappedText::new(raw)
            .replace("\r\n", "\n")
            .replace("\n\n", &options.blank_line)
            .replace("\n", &options.end_of_line)
            .replace_chars(&['\r', '\t'], " ")
            .replace_chars(&['(', ')'], &options.parenthesis)
            .replace(";", ",")
            .replace_chars(&['\x0c', '\x07', '\x08', '\u{ad}', '\u{f0b7}'], " ")
            .replace_chars(&['•', '◼', '\u{f0a7}'], ", ")
            .replace("/", " / ")
            .replace_until_stable(":.", ":")
            .replace(":", ", ")
            .replace_until_stable("  ", " ")
            .replace_until_stable(", ,", ",")
            .replace_until_stable(",,", ",")
            .replace_until_stable(" ,", ",")
            .replace(".,", ".")
            .replace_until_stable(". .", ".")
            .replace_until_stable("..", ".")
            .replace_until_stable(" .", ".");

        Rendering {
            options: options.clone(),
            text: text.text,
            origin: text.origin,
        }
    }
}
