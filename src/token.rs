//! Placeholder token extraction and substitution.
//!
//! Placeholders look like shell variables: `$NAME` or `${NAME}` where `NAME`
//! is made of ASCII letters, underscores and dots. Names are normalized to a
//! dotted form (`DB_HOST` -> `DB.HOST`) before they are looked up.
//!
//! Content is scanned as raw bytes, so templates do not have to be UTF-8;
//! bytes outside placeholders are copied through untouched.

use std::collections::{BTreeMap, HashMap};

use regex::bytes::{Captures, Regex};

/// Braced form first so `${NAME}` keeps its closing brace in the literal.
const PLACEHOLDER_PATTERN: &str = r"\$\{([a-zA-Z_.]+)\}?|\$([a-zA-Z_.]+)";

/// Literal token text -> normalized variable name, unique on the literal
pub type TokenMap = BTreeMap<String, String>;

/// Convert a placeholder name into its lookup key (`_` -> `.`)
pub fn normalize(raw: &str) -> String {
    raw.replace('_', ".")
}

/// Render a lookup key back in placeholder form (`.` -> `_`)
pub fn denormalize(name: &str) -> String {
    name.replace('.', "_")
}

/// Compiled placeholder matcher, built once and shared by every worker
#[derive(Debug, Clone)]
pub struct TokenExtractor {
    matcher: Regex,
}

impl TokenExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            matcher: Regex::new(PLACEHOLDER_PATTERN)?,
        })
    }

    /// Scan content for placeholders
    pub fn extract(&self, content: impl AsRef<[u8]>) -> TokenMap {
        self.matcher
            .captures_iter(content.as_ref())
            .map(|caps| (ascii(&caps[0]), normalize(&ascii(raw_name(&caps)))))
            .collect()
    }

    /// Replace every placeholder occurrence with its resolved value.
    ///
    /// `values` is keyed by normalized name; missing names become empty.
    /// Matches are replaced in a single pass, so resolved values are never
    /// scanned again.
    pub fn substitute(
        &self,
        content: impl AsRef<[u8]>,
        tokens: &TokenMap,
        values: &HashMap<String, String>,
    ) -> Vec<u8> {
        self.matcher
            .replace_all(content.as_ref(), |caps: &Captures<'_>| {
                tokens
                    .get(&ascii(&caps[0]))
                    .and_then(|name| values.get(name))
                    .map(|value| value.as_bytes().to_vec())
                    .unwrap_or_default()
            })
            .into_owned()
    }
}

/// Placeholder matches only ever contain ASCII
fn ascii(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn raw_name<'c>(caps: &Captures<'c>) -> &'c [u8] {
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_bytes())
        .unwrap_or_default()
}
