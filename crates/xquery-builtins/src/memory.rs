//! In-memory collaborators for tests, examples and embedding without a database.

use crate::engine::runtime::{CollectionStore, Error, ErrorCode, FulltextIndex};
use crate::model::XdmNode;
use std::collections::{BTreeMap, HashSet};

/// Documents keyed by collection path. Paths are `/`-separated; a collection's
/// subcollections are the stored paths below it.
pub struct MemoryCollectionStore<N> {
    collections: BTreeMap<String, Vec<N>>,
}

impl<N> Default for MemoryCollectionStore<N> {
    fn default() -> Self {
        Self {
            collections: BTreeMap::new(),
        }
    }
}

fn normalize(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        p => p,
    }
}

impl<N: XdmNode> MemoryCollectionStore<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `doc` in `path`, creating the collection if needed.
    pub fn insert(&mut self, path: &str, doc: N) {
        self.collections
            .entry(normalize(path).to_string())
            .or_default()
            .push(doc);
    }

    #[must_use]
    pub fn with_document(mut self, path: &str, doc: N) -> Self {
        self.insert(path, doc);
        self
    }
}

impl<N: XdmNode> CollectionStore<N> for MemoryCollectionStore<N> {
    fn list_documents(&self, path: &str, include_subcollections: bool) -> Result<Vec<N>, Error> {
        let path = normalize(path);
        let prefix = if path == "/" {
            "/".to_string()
        } else {
            format!("{path}/")
        };
        let mut found = false;
        let mut docs = Vec::new();
        // BTreeMap order puts a collection before its subcollections
        for (name, stored) in &self.collections {
            if name == path {
                found = true;
                docs.extend(stored.iter().cloned());
            } else if name.starts_with(&prefix) {
                found = true;
                if include_subcollections {
                    docs.extend(stored.iter().cloned());
                }
            }
        }
        if found {
            Ok(docs)
        } else {
            Err(Error::from_code(
                ErrorCode::FODC0002,
                format!("collection {path} not found"),
            ))
        }
    }
}

/// Keyword sets per node. Patterns are matched against the whole keyword.
pub struct MemoryFulltextIndex<N> {
    entries: Vec<(N, HashSet<String>)>,
}

impl<N> Default for MemoryFulltextIndex<N> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<N: XdmNode> MemoryFulltextIndex<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index<I, S>(&mut self, node: N, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords = keywords.into_iter().map(Into::into);
        match self.entries.iter_mut().find(|(n, _)| *n == node) {
            Some((_, existing)) => existing.extend(keywords),
            None => self.entries.push((node, keywords.collect())),
        }
    }

    #[must_use]
    pub fn with_node<I, S>(mut self, node: N, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.index(node, keywords);
        self
    }
}

impl<N: XdmNode> FulltextIndex<N> for MemoryFulltextIndex<N> {
    fn match_keywords(&self, pattern: &str) -> Result<HashSet<String>, Error> {
        let re = fancy_regex::Regex::new(&format!("^(?:{pattern})$"))?;
        let mut out = HashSet::new();
        for keyword in self.entries.iter().flat_map(|(_, kws)| kws) {
            if re.is_match(keyword)? {
                out.insert(keyword.clone());
            }
        }
        Ok(out)
    }

    fn keywords_of(&self, node: &N) -> Result<HashSet<String>, Error> {
        Ok(self
            .entries
            .iter()
            .find(|(n, _)| n == node)
            .map(|(_, kws)| kws.clone())
            .unwrap_or_default())
    }
}
