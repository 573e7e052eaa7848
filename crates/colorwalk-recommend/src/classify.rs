//! Line Classifier: keep only lines shaped like `rank. [index] ...`

use regex::Regex;

/// Leading `"{rank}. [{index}]"` of a ranked line; group 1 is the index
pub(crate) const RANKED_PREFIX: &str = r"^[0-9]+\.\s*\[([0-9]+)\]\s*";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Looks like a ranked item
    Candidate,
    /// Anything else; dropped without error
    Noise,
}

/// One line of oracle output, trimmed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleLine<'a> {
    /// 0-based line number in the original text
    pub line_no: usize,
    pub text: &'a str,
    pub kind: LineKind,
}

impl OracleLine<'_> {
    pub fn is_candidate(&self) -> bool {
        self.kind == LineKind::Candidate
    }
}

pub struct LineClassifier {
    ranked: Regex,
}

impl LineClassifier {
    pub fn new() -> Self {
        Self {
            ranked: Regex::new(RANKED_PREFIX).expect("ranked-line pattern compiles"),
        }
    }

    pub fn classify_line(&self, line: &str) -> LineKind {
        if self.ranked.is_match(line.trim()) {
            LineKind::Candidate
        } else {
            LineKind::Noise
        }
    }

    /// Tag every line of `text`, in order
    pub fn classify<'a>(&self, text: &'a str) -> Vec<OracleLine<'a>> {
        text.split('\n')
            .enumerate()
            .map(|(line_no, raw)| {
                let text = raw.trim();
                OracleLine {
                    line_no,
                    text,
                    kind: self.classify_line(text),
                }
            })
            .collect()
    }

    /// Only the candidate-tagged lines, in order
    pub fn candidate_lines<'a>(&self, text: &'a str) -> Vec<OracleLine<'a>> {
        self.classify(text)
            .into_iter()
            .filter(OracleLine::is_candidate)
            .collect()
    }
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new()
    }
}
