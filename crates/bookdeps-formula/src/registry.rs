//! Name registry - every admissible identifier of the workbooks in one run
//!
//! A workbook can be referred to by its display name (`Budget.xlsx`), its
//! stem (`Budget`), or its 1-based position in the upload order (`2`). The
//! registry is built once per analysis run from the current upload set and
//! is read-only afterwards, so it can be shared across threads freely.

use std::collections::HashMap;

use bookdeps_core::file_stem;
use regex::Regex;

use crate::reference::ReferenceToken;

/// Identifier lookup for one analysis run
#[derive(Debug, Clone)]
pub struct NameRegistry {
    /// Canonical names in upload order
    names: Vec<String>,
    /// Lowercased display name -> indices into `names`
    by_name: HashMap<String, Vec<usize>>,
    /// Lowercased stem -> indices into `names`
    by_stem: HashMap<String, Vec<usize>>,
    /// Whole-token stem matcher per workbook (None if the stem is unusable)
    stem_matchers: Vec<Option<Regex>>,
}

impl NameRegistry {
    /// Build a registry from canonical workbook names in upload order
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_stem: HashMap<String, Vec<usize>> = HashMap::new();
        let mut stem_matchers = Vec::with_capacity(names.len());

        for (idx, name) in names.iter().enumerate() {
            let stem = file_stem(name);
            by_name.entry(name.to_lowercase()).or_default().push(idx);
            by_stem.entry(stem.to_lowercase()).or_default().push(idx);
            stem_matchers.push(Self::stem_matcher(name, stem));
        }

        tracing::debug!(workbooks = names.len(), "built name registry");

        Self {
            names,
            by_name,
            by_stem,
            stem_matchers,
        }
    }

    /// Case-insensitive whole-token matcher for `stem`
    fn stem_matcher(name: &str, stem: &str) -> Option<Regex> {
        if stem.trim().is_empty() {
            return None;
        }
        let pattern = format!(r"(?i)(?:^|[^\w]){}(?:[^\w]|$)", regex::escape(stem));
        match Regex::new(&pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!("no inline matcher for '{}': {}", name, e);
                None
            }
        }
    }

    /// Number of registered workbooks
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if no workbooks are registered
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Canonical names in upload order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// 1-based upload position of a canonical name
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name).map(|idx| idx + 1)
    }

    /// Look up a positional token (`"2"` -> second uploaded workbook)
    pub fn by_position(&self, token: &str) -> Option<&str> {
        let position: usize = token.trim().parse().ok()?;
        position
            .checked_sub(1)
            .and_then(|idx| self.names.get(idx))
            .map(String::as_str)
    }

    /// Workbooks whose display name equals `name`, ignoring case
    pub fn match_name(&self, name: &str) -> Vec<&str> {
        self.collect(self.by_name.get(&name.to_lowercase()))
    }

    /// Workbooks whose stem equals `stem`, ignoring case
    pub fn match_stem(&self, stem: &str) -> Vec<&str> {
        self.collect(self.by_stem.get(&stem.to_lowercase()))
    }

    /// Workbooks whose stem occurs as a whole token anywhere in `text`
    pub fn stems_in<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.names
            .iter()
            .zip(&self.stem_matchers)
            .filter(move |(_, matcher)| matcher.as_ref().map_or(false, |re| re.is_match(text)))
            .map(|(name, _)| name.as_str())
    }

    /// Canonical names a bracket token refers to
    ///
    /// Positional tokens use the upload order. Named tokens try, in order:
    /// display name, stem, then the token's own stem against stems
    /// (`[Budget.xls]` still finds `Budget.xlsx`).
    pub fn lookup(&self, token: &ReferenceToken<'_>) -> Vec<&str> {
        match *token {
            ReferenceToken::Positional(pos) => self.by_position(pos).into_iter().collect(),
            ReferenceToken::Named(name) => {
                let hits = self.match_name(name);
                if !hits.is_empty() {
                    return hits;
                }
                let hits = self.match_stem(name);
                if !hits.is_empty() {
                    return hits;
                }
                self.match_stem(file_stem(name))
            }
        }
    }

    fn collect(&self, indices: Option<&Vec<usize>>) -> Vec<&str> {
        indices
            .map(|idx| idx.iter().map(|&i| self.names[i].as_str()).collect())
            .unwrap_or_default()
    }
}
