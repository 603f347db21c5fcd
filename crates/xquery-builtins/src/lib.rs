//! Typed built-in function framework for an XQuery engine.
//!
//! Functions are declared with a [`FunctionSignature`], collected into an immutable
//! [`FunctionRegistry`], bound per call site and evaluated against a [`Focus`] with
//! unevaluated argument expressions. Argument conversion and return type checks are done
//! by the framework for every function.
//!
//! ```
//! use std::sync::Arc;
//! use xquery_builtins::{ArgExpr, ExpandedName, Focus, Literal, QueryContextBuilder, XdmItem};
//! use xquery_builtins::simple_node::SimpleNode;
//! use xquery_builtins::consts::FNS;
//!
//! let query = QueryContextBuilder::<SimpleNode>::new().build().unwrap();
//! let insert_before = query.bind(&ExpandedName::ns(FNS, "insert-before"), 3).unwrap();
//! let args: Vec<ArgExpr<SimpleNode>> = vec![
//!     Arc::new(Literal::<SimpleNode>(vec![XdmItem::from(1_i64), XdmItem::from(2_i64)])),
//!     Arc::new(Literal::<SimpleNode>(vec![XdmItem::from(2_i64)])),
//!     Arc::new(Literal::<SimpleNode>(vec![XdmItem::from(9_i64)])),
//! ];
//! let out = insert_before.evaluate(&query, &Focus::empty(), &args).unwrap();
//! assert_eq!(out, vec![XdmItem::from(1_i64), XdmItem::from(9_i64), XdmItem::from(2_i64)]);
//! ```

pub mod consts;
pub mod engine;
pub mod memory;
pub mod model;
pub mod simple_node;
pub mod xdm;

pub use engine::call::{
    ArgExpr, BoundFunction, ContextItem, ContextSequence, DynamicContext, Expr, Focus,
    FunctionCall, Implementation, Literal,
};
pub use engine::diagnostics::{DiagnosticSink, NoopSink, Payload, Phase, TracingSink};
pub use engine::registry::{
    FunctionDef, FunctionRegistry, FunctionRegistryBuilder, FunctionSignature, ResolveError,
};
pub use engine::runtime::{
    CollectionStore, Error, ErrorCode, ErrorKind, FulltextIndex, QueryContext,
    QueryContextBuilder,
};
pub use engine::types::{Cardinality, ItemType, SequenceType};
pub use model::{NodeKind, XdmNode};
pub use simple_node::{SimpleNode, SimpleNodeBuilder};
pub use xdm::{ExpandedName, XdmAtomicValue, XdmItem, XdmSequence};
