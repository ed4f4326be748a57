use crate::parser::ast::{ParseError, Program};
use sha2::{Digest, Sha256};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Source text that failed to parse.
#[derive(Debug, Clone)]
pub struct ParseFailure {
    pub errors: Vec<ParseError>,
}

impl ParseFailure {
    /// Renders the first error with a snippet of the offending line.
    pub fn describe(&self, source: &[u8], path: Option<&str>) -> String {
        match self.errors.first() {
            Some(error) => error.to_human_readable_with_path(source, path),
            None => "unknown parse error".to_string(),
        }
    }
}

/// Turns PHP source text into a syntax tree.
pub trait PhpParser {
    fn parse(&self, source: &[u8]) -> Result<Rc<Program>, ParseFailure>;
}

/// Parser without caching.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeParser;

impl PhpParser for NativeParser {
    fn parse(&self, source: &[u8]) -> Result<Rc<Program>, ParseFailure> {
        let program = crate::parser::parser::parse(source);
        if program.has_errors() {
            return Err(ParseFailure {
                errors: program.errors,
            });
        }
        Ok(Rc::new(program))
    }
}

/// Content-addressed cache of parse results.
///
/// Successful parses are kept for the lifetime of the cache and shared on
/// every later request for the same text. Failures are returned as-is and
/// not stored.
pub struct MemoizingParser {
    inner: Rc<dyn PhpParser>,
    trees: RefCell<HashMap<String, Rc<Program>>>,
    hits: Cell<usize>,
}

impl MemoizingParser {
    pub fn new(inner: Rc<dyn PhpParser>) -> Self {
        Self {
            inner,
            trees: RefCell::new(HashMap::new()),
            hits: Cell::new(0),
        }
    }

    /// SHA-256 of the text plus its length.
    pub fn fingerprint(source: &[u8]) -> String {
        let digest = Sha256::digest(source);
        format!("{}:{}", hex::encode(digest), source.len())
    }

    pub fn cached_trees(&self) -> usize {
        self.trees.borrow().len()
    }

    pub fn hits(&self) -> usize {
        self.hits.get()
    }
}

impl Default for MemoizingParser {
    fn default() -> Self {
        Self::new(Rc::new(NativeParser))
    }
}

impl PhpParser for MemoizingParser {
    fn parse(&self, source: &[u8]) -> Result<Rc<Program>, ParseFailure> {
        let key = Self::fingerprint(source);
        if let Some(tree) = self.trees.borrow().get(&key) {
            self.hits.set(self.hits.get() + 1);
            tracing::trace!(key = %key, "parser cache hit");
            return Ok(tree.clone());
        }

        tracing::trace!(key = %key, bytes = source.len(), "parser cache miss");
        let tree = self.inner.parse(source)?;
        self.trees.borrow_mut().insert(key, tree.clone());
        Ok(tree)
    }
}
