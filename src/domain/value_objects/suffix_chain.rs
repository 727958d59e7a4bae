//! Suffix chain value object
//!
//! `app.coffee.md` has the base name `app` and the chain `["coffee", "md"]`.
//! Stages run right to left; the chain also decides the final output label.

use std::path::Path;

/// Build-format and test markers that are never collapsed into a single label.
pub const MODIFIER_TOKENS: &[&str] = &["esm", "es6", "cjs", "umd", "iife", "bundle", "test", "spec"];

/// Labels whose output is markup (dispatched last, embedding pass applies)
pub const MARKUP_LABELS: &[&str] = &["html", "htm"];

/// Ordered filename suffixes after the base name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SuffixChain {
    name: String,
    tokens: Vec<String>,
}

impl SuffixChain {
    /// Parse the file name of `path`
    pub fn parse(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_file_name(&file_name)
    }

    pub fn from_file_name(file_name: &str) -> Self {
        let mut parts = file_name.split('.');
        let name = parts.next().unwrap_or_default().to_string();
        let tokens = parts
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string())
            .collect();
        Self { name, tokens }
    }

    /// Base name (first dot-separated token)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Rightmost token, the first one processed
    pub fn last(&self) -> Option<&str> {
        self.tokens.last().map(|s| s.as_str())
    }

    /// Full dotted suffix, e.g. `test.js`
    pub fn full(&self) -> String {
        self.tokens.join(".")
    }

    /// Partials (`_layout.html`) are only ever rendered on behalf of others
    pub fn is_partial(&self) -> bool {
        self.name.starts_with('_')
    }

    /// Label kept when the chain stops at `index`: the unprocessed tokens
    /// verbatim, followed by the label produced so far.
    pub fn preserved_label(&self, index: usize, current: Option<&str>) -> String {
        let end = index.min(self.tokens.len().saturating_sub(1));
        let kept = self.tokens[..=end].join(".");
        match current {
            Some(label) if !label.is_empty() => format!("{}.{}", kept, label),
            _ => kept,
        }
    }

    /// Final label: reserved modifiers and exempt labels expand back to the
    /// full original suffix.
    pub fn settle(&self, label: &str, exempt: &[String]) -> String {
        if is_modifier(label) || exempt.iter().any(|e| e == label) {
            self.full()
        } else {
            label.to_string()
        }
    }
}

pub fn is_modifier(token: &str) -> bool {
    MODIFIER_TOKENS.contains(&token)
}

/// Markup by its last segment, so `en.html` counts
pub fn is_markup(label: &str) -> bool {
    label
        .rsplit('.')
        .next()
        .is_some_and(|ext| MARKUP_LABELS.contains(&ext))
}
