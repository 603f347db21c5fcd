//! The evaluation protocol shared by every built-in function.
//!
//! A call site binds a function once ([`BoundFunction`]) and evaluates it any number of
//! times against a [`Focus`] and a list of argument expressions. Each implementation
//! declares one of two call conventions:
//!
//! - [`Implementation::PreEvaluated`]: the framework evaluates every argument against the
//!   current focus, converts it to the declared parameter type and hands the
//!   implementation a slice of ready sequences.
//! - [`Implementation::EagerContext`]: the implementation receives the unevaluated
//!   arguments through [`DynamicContext`] and decides which ones to evaluate, and
//!   against which focus. Conversion still happens in the framework.
//!
//! In both cases the result is checked against the declared return type before it is
//! handed back.

use crate::engine::diagnostics::{Dependencies, Payload, Phase};
use crate::engine::registry::{FunctionDef, FunctionSignature};
use crate::engine::runtime::{Error, ErrorCode, QueryContext};
use crate::model::XdmNode;
use crate::xdm::{XdmItem, XdmSequence};
use std::sync::Arc;

/// The implicit `.` binding an argument expression is evaluated against.
pub struct Focus<'a, N> {
    pub sequence: Option<&'a [XdmItem<N>]>,
    pub item: Option<&'a XdmItem<N>>,
}

impl<N> Clone for Focus<'_, N> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<N> Copy for Focus<'_, N> {}

impl<'a, N> Focus<'a, N> {
    pub fn empty() -> Self {
        Self {
            sequence: None,
            item: None,
        }
    }

    pub fn of_item(item: &'a XdmItem<N>) -> Self {
        Self {
            sequence: None,
            item: Some(item),
        }
    }

    pub fn of_sequence(sequence: &'a [XdmItem<N>]) -> Self {
        Self {
            sequence: Some(sequence),
            item: None,
        }
    }

    #[must_use]
    pub fn with_item(mut self, item: &'a XdmItem<N>) -> Self {
        self.item = Some(item);
        self
    }
}

/// An already-compiled argument expression.
pub trait Expr<N>: Send + Sync {
    fn evaluate(
        &self,
        query: &QueryContext<N>,
        focus: &Focus<'_, N>,
    ) -> Result<XdmSequence<N>, Error>;

    fn dependencies(&self) -> Dependencies {
        Dependencies::NONE
    }
}

pub type ArgExpr<N> = Arc<dyn Expr<N>>;

/// A constant sequence.
pub struct Literal<N>(pub XdmSequence<N>);

impl<N: XdmNode> Expr<N> for Literal<N> {
    fn evaluate(
        &self,
        _query: &QueryContext<N>,
        _focus: &Focus<'_, N>,
    ) -> Result<XdmSequence<N>, Error> {
        Ok(self.0.clone())
    }
}

/// `.`: the context item.
pub struct ContextItem;

impl<N: XdmNode> Expr<N> for ContextItem {
    fn evaluate(
        &self,
        _query: &QueryContext<N>,
        focus: &Focus<'_, N>,
    ) -> Result<XdmSequence<N>, Error> {
        focus
            .item
            .map(|it| vec![it.clone()])
            .ok_or_else(|| Error::from_code(ErrorCode::XPDY0002, "context item is undefined"))
    }

    fn dependencies(&self) -> Dependencies {
        Dependencies::CONTEXT_ITEM
    }
}

/// The whole context sequence; falls back to the context item when no sequence is set.
pub struct ContextSequence;

impl<N: XdmNode> Expr<N> for ContextSequence {
    fn evaluate(
        &self,
        _query: &QueryContext<N>,
        focus: &Focus<'_, N>,
    ) -> Result<XdmSequence<N>, Error> {
        match (focus.sequence, focus.item) {
            (Some(seq), _) => Ok(seq.to_vec()),
            (None, Some(it)) => Ok(vec![it.clone()]),
            (None, None) => Err(Error::from_code(
                ErrorCode::XPDY0002,
                "context sequence is undefined",
            )),
        }
    }

    fn dependencies(&self) -> Dependencies {
        Dependencies::CONTEXT_SEQUENCE
    }
}

/// A nested call, so hosts can compose built-ins without a compiler.
pub struct FunctionCall<N> {
    pub function: BoundFunction<N>,
    pub args: Vec<ArgExpr<N>>,
}

impl<N: XdmNode> Expr<N> for FunctionCall<N> {
    fn evaluate(
        &self,
        query: &QueryContext<N>,
        focus: &Focus<'_, N>,
    ) -> Result<XdmSequence<N>, Error> {
        self.function.evaluate(query, focus, &self.args)
    }

    fn dependencies(&self) -> Dependencies {
        self.args
            .iter()
            .fold(Dependencies::NONE, |acc, a| acc.union(a.dependencies()))
    }
}

/// Per-call view handed to implementations. Discarded when the call returns.
pub struct DynamicContext<'a, N> {
    pub query: &'a QueryContext<N>,
    pub focus: Focus<'a, N>,
    signature: &'a FunctionSignature,
    args: &'a [ArgExpr<N>],
}

impl<N: XdmNode> DynamicContext<'_, N> {
    pub fn signature(&self) -> &FunctionSignature {
        self.signature
    }

    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Evaluate argument `idx` against the current focus and convert it to its
    /// declared parameter type.
    pub fn argument(&self, idx: usize) -> Result<XdmSequence<N>, Error> {
        self.argument_with_focus(idx, &self.focus)
    }

    /// Evaluate argument `idx` against an explicit focus.
    pub fn argument_with_focus(
        &self,
        idx: usize,
        focus: &Focus<'_, N>,
    ) -> Result<XdmSequence<N>, Error> {
        let expr = self.args.get(idx).ok_or_else(|| {
            Error::from_code(
                ErrorCode::XPST0017,
                format!("{} has no argument {}", self.signature.name, idx + 1),
            )
        })?;
        let value = expr.evaluate(self.query, focus)?;
        match self.signature.param_type(idx) {
            Some(ty) => ty.apply(value).map_err(|e| {
                Error::new_qname(
                    e.code.clone(),
                    format!(
                        "argument {} of {}: {}",
                        idx + 1,
                        self.signature.name,
                        e.message
                    ),
                )
                .with_source(e.source.clone())
            }),
            None => Ok(value),
        }
    }
}

pub type PreEvaluatedFn<N> = Arc<
    dyn Fn(&DynamicContext<'_, N>, &[XdmSequence<N>]) -> Result<XdmSequence<N>, Error>
        + Send
        + Sync,
>;

pub type EagerContextFn<N> =
    Arc<dyn Fn(&DynamicContext<'_, N>) -> Result<XdmSequence<N>, Error> + Send + Sync>;

/// The closed set of call conventions.
#[derive(Clone)]
pub enum Implementation<N> {
    PreEvaluated(PreEvaluatedFn<N>),
    EagerContext(EagerContextFn<N>),
}

/// A function resolved for one call site: the signature it was looked up under (which
/// carries the deprecation note for legacy names) and the definition it runs.
///
/// Only [`FunctionRegistry::bind`](crate::engine::registry::FunctionRegistry::bind)
/// creates one, so the arity always comes from a successful lookup.
pub struct BoundFunction<N> {
    pub(crate) signature: Arc<FunctionSignature>,
    pub(crate) definition: Arc<FunctionDef<N>>,
    pub(crate) arity: usize,
}

impl<N> Clone for BoundFunction<N> {
    fn clone(&self) -> Self {
        Self {
            signature: Arc::clone(&self.signature),
            definition: Arc::clone(&self.definition),
            arity: self.arity,
        }
    }
}

impl<N> BoundFunction<N> {
    pub fn signature(&self) -> &FunctionSignature {
        &self.signature
    }

    pub fn arity(&self) -> usize {
        self.arity
    }
}

impl<N: XdmNode> BoundFunction<N> {
    pub fn evaluate(
        &self,
        query: &QueryContext<N>,
        focus: &Focus<'_, N>,
        args: &[ArgExpr<N>],
    ) -> Result<XdmSequence<N>, Error> {
        let name = &self.signature.name;
        if !self.signature.accepts_arity(self.arity) {
            return Err(Error::from_code(
                ErrorCode::XPST0017,
                format!("{name} does not accept {} argument(s)", self.arity),
            ));
        }
        if args.len() != self.arity {
            return Err(Error::from_code(
                ErrorCode::XPST0017,
                format!(
                    "{name} was bound for {} argument(s) but called with {}",
                    self.arity,
                    args.len()
                ),
            ));
        }
        let sink = query.diagnostics.as_ref();
        let deps = args
            .iter()
            .fold(Dependencies::NONE, |acc, a| acc.union(a.dependencies()));
        sink.event(name, Phase::Start, Payload::Dependencies(deps));
        if let Some(seq) = focus.sequence {
            sink.event(name, Phase::Start, Payload::ContextSequence(seq));
        }

        let ctx = DynamicContext {
            query,
            focus: *focus,
            signature: &self.signature,
            args,
        };
        let result = match &self.definition.implementation {
            Implementation::PreEvaluated(f) => {
                let values = (0..args.len())
                    .map(|idx| ctx.argument(idx))
                    .collect::<Result<Vec<_>, _>>()?;
                f(&ctx, &values)?
            }
            Implementation::EagerContext(f) => f(&ctx)?,
        };

        let declared = &self.signature.return_type;
        if !declared.matches(&result) {
            tracing::error!(
                function = %name,
                declared = %declared,
                items = result.len(),
                "function result violates its declared return type"
            );
            return Err(Error::from_code(
                ErrorCode::XPTY0004,
                format!(
                    "{name} returned {} item(s) not matching its return type {declared}",
                    result.len()
                ),
            ));
        }
        sink.event(name, Phase::Finish, Payload::Result(&result));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::{BoundFunction, Focus};
    use crate::consts::FNS;
    use crate::engine::functions::default_function_registry;
    use crate::engine::runtime::{ErrorCode, QueryContextBuilder};
    use crate::simple_node::SimpleNode;
    use crate::xdm::ExpandedName;
    use rstest::rstest;
    use std::sync::Arc;

    #[rstest]
    #[case(0)]
    #[case(2)]
    fn arity_rejected_by_signature_fails_before_dispatch(#[case] arity: usize) {
        let reg = default_function_registry::<SimpleNode>().unwrap();
        let entry = reg.lookup(&ExpandedName::ns(FNS, "boolean"), 1).unwrap();
        let bound = BoundFunction {
            signature: Arc::clone(entry.signature()),
            definition: Arc::clone(entry.definition()),
            arity,
        };
        let query = QueryContextBuilder::new().with_functions(reg).build().unwrap();
        let args = Vec::new();
        let err = bound.evaluate(&query, &Focus::empty(), &args).unwrap_err();
        assert_eq!(err.code_enum(), ErrorCode::XPST0017);
    }
}
