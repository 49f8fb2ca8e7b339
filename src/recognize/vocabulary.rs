//! Known label vocabulary used to validate OCR output.

/// Labels printed on the supported packages.
pub const DEFAULT_LABELS: &[&str] = &["VOLTESSO", "ORAFIO", "BIANCO", "PICOLLO", "DOLCE"];

/// Fixed set of uppercase label strings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vocabulary {
    entries: Vec<String>,
}

impl Vocabulary {
    /// Builds a vocabulary; entries are trimmed and uppercased, empty and
    /// duplicate entries dropped (first occurrence keeps its position).
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for entry in entries {
            let entry = entry.as_ref().trim().to_uppercase();
            if !entry.is_empty() && !out.contains(&entry) {
                out.push(entry);
            }
        }
        Self { entries: out }
    }

    /// First entry contained in `text`, compared case-insensitively.
    pub fn find_in(&self, text: &str) -> Option<&str> {
        let text = text.to_uppercase();
        self.entries
            .iter()
            .find(|entry| text.contains(entry.as_str()))
            .map(String::as_str)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_LABELS)
    }
}
