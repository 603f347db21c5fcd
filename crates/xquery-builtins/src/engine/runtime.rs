use crate::engine::call::BoundFunction;
use crate::engine::diagnostics::{DiagnosticSink, NoopSink};
use crate::engine::registry::FunctionRegistry;
use crate::xdm::ExpandedName;
use chrono::{DateTime, FixedOffset};
use core::fmt;
use std::collections::HashSet;
use std::sync::Arc;

/// Canonical set of XPath/XQuery error codes emitted by the function framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Generic error (used for failures without a more specific code)
    FOER0000,
    FORG0001, // invalid lexical form / casting failure
    FOCA0002, // invalid value (NaN, INF) for integer conversion
    FOCA0003, // value too large for integer
    FODC0002, // resource (collection, index) unavailable
    FODC0004, // collection lookup failure
    FORX0002, // regex invalid pattern
    XPTY0004, // type or cardinality mismatch against a declared sequence type
    XPDY0002, // context item undefined
    XPST0017, // unknown function or wrong arity
    XQST0034, // function registered twice under the same name
    // Fallback / unknown (kept last)
    Unknown,
}

impl ErrorCode {
    /// Returns the QName (ExpandedName) for this code in the `xqt-errors` namespace.
    pub fn qname(&self) -> ExpandedName {
        ExpandedName {
            ns_uri: Some(ERR_NS.to_string()),
            local: self.local().to_string(),
        }
    }

    fn local(&self) -> &'static str {
        match self {
            ErrorCode::FOER0000 => "FOER0000",
            ErrorCode::FORG0001 => "FORG0001",
            ErrorCode::FOCA0002 => "FOCA0002",
            ErrorCode::FOCA0003 => "FOCA0003",
            ErrorCode::FODC0002 => "FODC0002",
            ErrorCode::FODC0004 => "FODC0004",
            ErrorCode::FORX0002 => "FORX0002",
            ErrorCode::XPTY0004 => "XPTY0004",
            ErrorCode::XPDY0002 => "XPDY0002",
            ErrorCode::XPST0017 => "XPST0017",
            ErrorCode::XQST0034 => "XQST0034",
            ErrorCode::Unknown => "UNKNOWN",
        }
    }

    pub fn from_code(s: &str) -> Self {
        use ErrorCode::*;
        match s {
            "err:FOER0000" => FOER0000,
            "err:FORG0001" => FORG0001,
            "err:FOCA0002" => FOCA0002,
            "err:FOCA0003" => FOCA0003,
            "err:FODC0002" => FODC0002,
            "err:FODC0004" => FODC0004,
            "err:FORX0002" => FORX0002,
            "err:XPTY0004" => XPTY0004,
            "err:XPDY0002" => XPDY0002,
            "err:XPST0017" => XPST0017,
            "err:XQST0034" => XQST0034,
            _ => Unknown,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::XPST0017 | ErrorCode::XQST0034 | ErrorCode::XPTY0004 => {
                ErrorKind::Signature
            }
            ErrorCode::FORG0001 | ErrorCode::FOCA0002 | ErrorCode::FOCA0003 => {
                ErrorKind::Conversion
            }
            ErrorCode::FODC0002 | ErrorCode::FODC0004 => ErrorKind::Collaborator,
            ErrorCode::FOER0000
            | ErrorCode::FORX0002
            | ErrorCode::XPDY0002
            | ErrorCode::Unknown => ErrorKind::Dynamic,
        }
    }
}

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown function, wrong arity, duplicate registration, or a value that does not
    /// match a declared parameter/return type.
    Signature,
    /// A numeric or string coercion failed.
    Conversion,
    /// The fulltext index or collection store reported a failure.
    Collaborator,
    /// Any other dynamic error.
    Dynamic,
}

pub use crate::consts::ERR_NS;

#[derive(Debug, Clone, thiserror::Error)]
pub struct Error {
    pub code: ExpandedName,
    pub message: String,
    #[source]
    pub source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new_qname(code: ExpandedName, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            source: None,
        }
    }

    pub fn from_code(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self::new_qname(code.qname(), msg)
    }

    pub fn code_enum(&self) -> ErrorCode {
        // Only ERR_NS codes map to the enum; others are Unknown.
        if self.code.ns_uri.as_deref() == Some(ERR_NS) {
            ErrorCode::from_code(&format!("err:{}", self.code.local))
        } else {
            ErrorCode::Unknown
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.code_enum().kind()
    }

    /// Format the code as a human-readable string (err:LOCAL or Q{ns}local).
    pub fn format_code(&self) -> String {
        if self.code.ns_uri.as_deref() == Some(ERR_NS) {
            format!("err:{}", self.code.local)
        } else if let Some(ns) = &self.code.ns_uri {
            format!("Q{{{}}}{}", ns, self.code.local)
        } else {
            self.code.local.clone()
        }
    }

    /// Compose an error with a source cause.
    #[must_use]
    pub fn with_source(
        mut self,
        source: impl Into<Option<Arc<dyn std::error::Error + Send + Sync>>>,
    ) -> Self {
        self.source = source.into();
        self
    }
}

impl From<fancy_regex::Error> for Error {
    fn from(e: fancy_regex::Error) -> Self {
        Error::from_code(ErrorCode::FORX0002, "regex error")
            .with_source(Some(Arc::new(e) as Arc<dyn std::error::Error + Send + Sync>))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error: {} ({})", self.message, self.format_code())
    }
}

/// Document storage consulted by the collection functions.
pub trait CollectionStore<N>: Send + Sync {
    /// Documents stored in `path`; with `include_subcollections` also every document
    /// stored below it. Unknown paths are an error, not an empty result.
    fn list_documents(&self, path: &str, include_subcollections: bool) -> Result<Vec<N>, Error>;
}

/// Keyword index consulted by the fulltext match functions.
pub trait FulltextIndex<N>: Send + Sync {
    /// All indexed keywords matched by the regular expression `pattern`.
    fn match_keywords(&self, pattern: &str) -> Result<HashSet<String>, Error>;
    /// Keywords recorded for `node`; empty when the node is not indexed.
    fn keywords_of(&self, node: &N) -> Result<HashSet<String>, Error>;
}

/// Everything a query shares between the function calls it makes: the registry, the
/// evaluation-start instant, collaborators and the diagnostic sink.
///
/// A `QueryContext` belongs to one query. Concurrent queries each build their own, which
/// keeps the start instant (and therefore `fn:implicit-timezone`) stable per query.
#[derive(Clone)]
pub struct QueryContext<N> {
    pub functions: Arc<FunctionRegistry<N>>,
    pub start: DateTime<FixedOffset>,
    pub collections: Option<Arc<dyn CollectionStore<N>>>,
    pub fulltext: Option<Arc<dyn FulltextIndex<N>>>,
    pub diagnostics: Arc<dyn DiagnosticSink<N>>,
}

impl<N: crate::model::XdmNode> QueryContext<N> {
    pub fn implicit_timezone(&self) -> FixedOffset {
        *self.start.offset()
    }

    pub fn collection_store(&self) -> Result<&dyn CollectionStore<N>, Error> {
        self.collections
            .as_deref()
            .ok_or_else(|| Error::from_code(ErrorCode::FODC0002, "no collection store configured"))
    }

    pub fn fulltext_index(&self) -> Result<&dyn FulltextIndex<N>, Error> {
        self.fulltext
            .as_deref()
            .ok_or_else(|| Error::from_code(ErrorCode::FODC0002, "no fulltext index configured"))
    }

    /// Resolve `name` for a call with `argc` arguments against this query's registry.
    /// Deprecation notes are reported to the diagnostic sink once, here.
    pub fn bind(&self, name: &ExpandedName, argc: usize) -> Result<BoundFunction<N>, Error> {
        self.functions.bind(name, argc, self.diagnostics.as_ref())
    }
}

pub struct QueryContextBuilder<N> {
    functions: Option<Arc<FunctionRegistry<N>>>,
    now: Option<DateTime<FixedOffset>>,
    timezone_override: Option<FixedOffset>,
    collections: Option<Arc<dyn CollectionStore<N>>>,
    fulltext: Option<Arc<dyn FulltextIndex<N>>>,
    diagnostics: Option<Arc<dyn DiagnosticSink<N>>>,
}

impl<N: crate::model::XdmNode> Default for QueryContextBuilder<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: crate::model::XdmNode> QueryContextBuilder<N> {
    pub fn new() -> Self {
        Self {
            functions: None,
            now: None,
            timezone_override: None,
            collections: None,
            fulltext: None,
            diagnostics: None,
        }
    }

    #[must_use]
    pub fn with_functions(mut self, reg: Arc<FunctionRegistry<N>>) -> Self {
        self.functions = Some(reg);
        self
    }

    // Set a fixed start instant for deterministic date/time functions
    #[must_use]
    pub fn with_now(mut self, now: DateTime<FixedOffset>) -> Self {
        self.now = Some(now);
        self
    }

    // Override the implicit timezone (applied to the start instant); offsets outside
    // +/-24h are ignored
    #[must_use]
    pub fn with_timezone(mut self, offset_minutes: i32) -> Self {
        if let Some(tz) = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
        {
            self.timezone_override = Some(tz);
        }
        self
    }

    #[must_use]
    pub fn with_collection_store(mut self, store: Arc<dyn CollectionStore<N>>) -> Self {
        self.collections = Some(store);
        self
    }

    #[must_use]
    pub fn with_fulltext_index(mut self, index: Arc<dyn FulltextIndex<N>>) -> Self {
        self.fulltext = Some(index);
        self
    }

    #[must_use]
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink<N>>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    /// Finish the context. The start instant is captured here, once, unless one was
    /// supplied with [`with_now`](Self::with_now).
    pub fn build(self) -> Result<QueryContext<N>, Error> {
        let functions = match self.functions {
            Some(reg) => reg,
            None => crate::engine::functions::default_function_registry::<N>()?,
        };
        let now = self
            .now
            .unwrap_or_else(|| chrono::Local::now().fixed_offset());
        let start = match self.timezone_override {
            Some(tz) => now.with_timezone(&tz),
            None => now,
        };
        Ok(QueryContext {
            functions,
            start,
            collections: self.collections,
            fulltext: self.fulltext,
            diagnostics: self.diagnostics.unwrap_or_else(|| Arc::new(NoopSink)),
        })
    }
}
