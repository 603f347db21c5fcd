use crate::consts::{FNS, LEGACY_NS, TEXT_NS, XMLDB_NS};
use crate::engine::registry::{FunctionRegistry, FunctionRegistryBuilder, FunctionSignature};
use crate::engine::runtime::Error;
use crate::engine::types::{Cardinality, ItemType, SequenceType};
use crate::model::XdmNode;
use crate::xdm::ExpandedName;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

pub mod boolean;
pub mod collections;
mod common;
pub mod environment;
pub mod fulltext;
pub mod sequences;

/// Register every built-in function on `reg`.
pub fn register_default_functions<N: XdmNode>(
    reg: &mut FunctionRegistryBuilder<N>,
) -> Result<(), Error> {
    use Cardinality::{ExactlyOne, OneOrMore, ZeroOrMore};

    macro_rules! sig {
        ($ns:expr, $local:expr, $ret:expr, $desc:expr $(, $pname:literal : $pty:expr)* $(,)?) => {
            FunctionSignature::new(ExpandedName::ns($ns, $local), $ret)
                .describe($desc)
                $(.param($pname, $pty))*
        };
    }

    // ===== Core booleans =====
    reg.register_pre_evaluated(
        sig!(FNS, "true", SequenceType::boolean(ExactlyOne), "Returns the boolean value true."),
        boolean::fn_true::<N>,
    )?;
    reg.register_pre_evaluated(
        sig!(FNS, "false", SequenceType::boolean(ExactlyOne), "Returns the boolean value false."),
        boolean::fn_false::<N>,
    )?;
    reg.register_pre_evaluated(
        sig!(
            FNS,
            "boolean",
            SequenceType::boolean(ExactlyOne),
            "Computes the effective boolean value of $arg.",
            "arg": SequenceType::any_item(ZeroOrMore),
        ),
        boolean::fn_boolean::<N>,
    )?;
    reg.register_pre_evaluated(
        sig!(
            FNS,
            "not",
            SequenceType::boolean(ExactlyOne),
            "Negates the effective boolean value of $arg.",
            "arg": SequenceType::any_item(ZeroOrMore),
        ),
        boolean::fn_not::<N>,
    )?;

    // ===== Evaluation environment =====
    reg.register_pre_evaluated(
        sig!(
            FNS,
            "implicit-timezone",
            SequenceType::new(ItemType::DayTimeDuration, ExactlyOne),
            "Returns the implicit timezone of the query, fixed when evaluation starts.",
        ),
        environment::implicit_timezone_fn::<N>,
    )?;
    reg.register_pre_evaluated(
        sig!(
            FNS,
            "current-dateTime",
            SequenceType::new(ItemType::DateTime, ExactlyOne),
            "Returns the instant the query started evaluating.",
        ),
        environment::current_date_time_fn::<N>,
    )?;

    // ===== Sequences =====
    reg.register_eager_context(
        sig!(
            FNS,
            "insert-before",
            SequenceType::any_item(ZeroOrMore),
            "Inserts $inserts into $target before the item at $position (1-based).",
            "target": SequenceType::any_item(ZeroOrMore),
            "position": SequenceType::numeric(ExactlyOne),
            "inserts": SequenceType::any_item(ZeroOrMore),
        ),
        sequences::insert_before_fn::<N>,
    )?;

    // ===== Collections =====
    reg.register_pre_evaluated(
        sig!(
            FNS,
            "collection",
            SequenceType::node(ZeroOrMore),
            "Returns the documents of the given collections, including subcollections.",
            "uris": SequenceType::string(OneOrMore),
        ),
        collections::collection_fn::<N>,
    )?;
    reg.register_pre_evaluated(
        sig!(
            XMLDB_NS,
            "xcollection",
            SequenceType::node(ZeroOrMore),
            "Returns the documents stored directly in the given collections.",
            "uris": SequenceType::string(OneOrMore),
        ),
        collections::xcollection_fn::<N>,
    )?;

    // ===== Fulltext keyword matching =====
    reg.register_pre_evaluated(
        sig!(
            TEXT_NS,
            "match-any",
            SequenceType::node(ZeroOrMore),
            "Returns the nodes of $nodes with a keyword matching any of the patterns.",
            "nodes": SequenceType::node(ZeroOrMore),
            "patterns": SequenceType::string(OneOrMore),
        )
        .variadic(),
        fulltext::match_any_fn::<N>,
    )?;
    reg.register_pre_evaluated(
        sig!(
            TEXT_NS,
            "match-all",
            SequenceType::node(ZeroOrMore),
            "Returns the nodes of $nodes with keywords matching every one of the patterns.",
            "nodes": SequenceType::node(ZeroOrMore),
            "patterns": SequenceType::string(OneOrMore),
        )
        .variadic(),
        fulltext::match_all_fn::<N>,
    )?;
    reg.deprecate(
        ExpandedName::ns(LEGACY_NS, "match-any"),
        ExpandedName::ns(TEXT_NS, "match-any"),
        "exist:match-any is deprecated; use text:match-any instead",
    )?;
    reg.deprecate(
        ExpandedName::ns(LEGACY_NS, "match-all"),
        ExpandedName::ns(TEXT_NS, "match-all"),
        "exist:match-all is deprecated; use text:match-all instead",
    )?;

    Ok(())
}

/// Shared registry of the built-in functions, built once per node type.
pub fn default_function_registry<N: XdmNode>() -> Result<Arc<FunctionRegistry<N>>, Error> {
    static CACHE: OnceLock<Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>> = OnceLock::new();
    let map = CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = map.lock().unwrap_or_else(PoisonError::into_inner);
    let type_id = TypeId::of::<N>();
    if let Some(existing) = guard
        .get(&type_id)
        .and_then(|b| b.downcast_ref::<Arc<FunctionRegistry<N>>>())
    {
        return Ok(Arc::clone(existing));
    }

    let mut reg = FunctionRegistry::builder();
    register_default_functions(&mut reg)?;
    let arc = Arc::new(reg.build()?);
    guard.insert(type_id, Box::new(Arc::clone(&arc)));
    Ok(arc)
}
