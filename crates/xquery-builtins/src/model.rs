//! Node abstraction consumed by the function framework.
//!
//! Hosts adapt their document model by implementing [`XdmNode`]. The framework only
//! needs identity (for de-duplication and fulltext lookups), the string value (for
//! atomization) and enough structure to render diagnostics.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Text,
}

pub trait XdmNode: Clone + Eq + core::hash::Hash + core::fmt::Debug + Send + Sync + 'static {
    fn kind(&self) -> NodeKind;
    /// Local name for elements and attributes; `None` for other kinds.
    fn name(&self) -> Option<String>;
    /// Concatenated descendant text (documents, elements) or own value (text, attributes).
    fn string_value(&self) -> String;
    fn children(&self) -> Vec<Self>;
}
