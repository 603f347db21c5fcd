//! Simple in-memory tree implementation for `XdmNode` used in tests and quick prototypes.
//!
//! Nodes are immutable once built and compare by identity, so two structurally equal
//! documents are still distinct nodes.
//!
//! Example:
//! ```
//! use xquery_builtins::simple_node::{doc, elem, text, attr};
//! use xquery_builtins::XdmNode;
//!
//! // <article lang="en"><title>Cats</title></article>
//! let document = doc()
//!     .child(
//!         elem("article")
//!             .attr(attr("lang", "en"))
//!             .child(elem("title").child(text("Cats"))),
//!     )
//!     .build();
//!
//! assert_eq!(document.string_value(), "Cats");
//! assert_eq!(document.children()[0].name().as_deref(), Some("article"));
//! assert_eq!(document.children()[0].attributes()[0].string_value(), "en");
//! ```
use std::fmt;
use std::sync::Arc;

use crate::model::{NodeKind, XdmNode};

struct Inner {
    kind: NodeKind,
    name: Option<String>,
    value: Option<String>,
    attributes: Vec<SimpleNode>,
    children: Vec<SimpleNode>,
}

/// A simple Arc-backed node implementation.
#[derive(Clone)]
pub struct SimpleNode(Arc<Inner>);

impl PartialEq for SimpleNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for SimpleNode {}
impl std::hash::Hash for SimpleNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for SimpleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = &self.0;
        match inner.kind {
            NodeKind::Document => write!(f, "document({} children)", inner.children.len()),
            NodeKind::Element => write!(f, "<{}>", inner.name.as_deref().unwrap_or("")),
            NodeKind::Attribute => write!(
                f,
                "@{}={:?}",
                inner.name.as_deref().unwrap_or(""),
                inner.value.as_deref().unwrap_or("")
            ),
            NodeKind::Text => write!(f, "text({:?})", inner.value.as_deref().unwrap_or("")),
        }
    }
}

impl SimpleNode {
    pub fn attributes(&self) -> Vec<SimpleNode> {
        self.0.attributes.clone()
    }
}

impl XdmNode for SimpleNode {
    fn kind(&self) -> NodeKind {
        self.0.kind
    }

    fn name(&self) -> Option<String> {
        self.0.name.clone()
    }

    fn string_value(&self) -> String {
        match self.0.kind {
            NodeKind::Text | NodeKind::Attribute => self.0.value.clone().unwrap_or_default(),
            NodeKind::Element | NodeKind::Document => {
                let mut out = String::new();
                collect_text(self, &mut out);
                out
            }
        }
    }

    fn children(&self) -> Vec<Self> {
        self.0.children.clone()
    }
}

fn collect_text(node: &SimpleNode, out: &mut String) {
    for child in &node.0.children {
        match child.0.kind {
            NodeKind::Text => out.push_str(child.0.value.as_deref().unwrap_or("")),
            NodeKind::Element => collect_text(child, out),
            NodeKind::Attribute | NodeKind::Document => {}
        }
    }
}

pub struct SimpleNodeBuilder {
    kind: NodeKind,
    name: Option<String>,
    value: Option<String>,
    attributes: Vec<SimpleNode>,
    children: Vec<SimpleNodeBuilder>,
}

impl SimpleNodeBuilder {
    fn new(kind: NodeKind, name: Option<String>, value: Option<String>) -> Self {
        Self {
            kind,
            name,
            value,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn attr(mut self, attribute: SimpleNode) -> Self {
        self.attributes.push(attribute);
        self
    }

    #[must_use]
    pub fn child(mut self, child: SimpleNodeBuilder) -> Self {
        self.children.push(child);
        self
    }

    pub fn build(self) -> SimpleNode {
        SimpleNode(Arc::new(Inner {
            kind: self.kind,
            name: self.name,
            value: self.value,
            attributes: self.attributes,
            children: self.children.into_iter().map(SimpleNodeBuilder::build).collect(),
        }))
    }
}

pub fn doc() -> SimpleNodeBuilder {
    SimpleNodeBuilder::new(NodeKind::Document, None, None)
}

pub fn elem(name: &str) -> SimpleNodeBuilder {
    SimpleNodeBuilder::new(NodeKind::Element, Some(name.to_string()), None)
}

pub fn text(value: &str) -> SimpleNodeBuilder {
    SimpleNodeBuilder::new(NodeKind::Text, None, Some(value.to_string()))
}

pub fn attr(name: &str, value: &str) -> SimpleNode {
    SimpleNodeBuilder::new(
        NodeKind::Attribute,
        Some(name.to_string()),
        Some(value.to_string()),
    )
    .build()
}
