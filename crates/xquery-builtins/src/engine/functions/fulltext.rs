use super::common::{nodes_of, strings_of};
use crate::engine::call::DynamicContext;
use crate::engine::runtime::{Error, FulltextIndex};
use crate::model::XdmNode;
use crate::xdm::{XdmItem, XdmSequence};
use std::collections::HashSet;

/// `text:match-any($nodes, $patterns, ...)`: nodes having at least one keyword matched by
/// any of the patterns.
pub(super) fn match_any_fn<N: XdmNode>(
    ctx: &DynamicContext<N>,
    args: &[XdmSequence<N>],
) -> Result<XdmSequence<N>, Error> {
    let index = ctx.query.fulltext_index()?;
    let nodes = nodes_of(&args[0])?;
    let mut hits = HashSet::new();
    for pattern in patterns(args)? {
        hits.extend(index.match_keywords(pattern)?);
    }
    if hits.is_empty() {
        return Ok(vec![]);
    }
    select(index, nodes, |keywords| !keywords.is_disjoint(&hits))
}

/// `text:match-all($nodes, $patterns, ...)`: nodes having, for every pattern, at least one
/// keyword matched by it.
pub(super) fn match_all_fn<N: XdmNode>(
    ctx: &DynamicContext<N>,
    args: &[XdmSequence<N>],
) -> Result<XdmSequence<N>, Error> {
    let index = ctx.query.fulltext_index()?;
    let nodes = nodes_of(&args[0])?;
    let per_pattern = patterns(args)?
        .into_iter()
        .map(|p| index.match_keywords(p))
        .collect::<Result<Vec<_>, _>>()?;
    select(index, nodes, |keywords| {
        per_pattern.iter().all(|hits| !keywords.is_disjoint(hits))
    })
}

// Arguments after the node set are all pattern lists (the signature is variadic).
fn patterns<N>(args: &[XdmSequence<N>]) -> Result<Vec<&str>, Error> {
    let mut out = Vec::new();
    for arg in &args[1..] {
        out.extend(strings_of(arg)?);
    }
    Ok(out)
}

fn select<N: XdmNode>(
    index: &dyn FulltextIndex<N>,
    nodes: Vec<&N>,
    keep: impl Fn(&HashSet<String>) -> bool,
) -> Result<XdmSequence<N>, Error> {
    let mut out = Vec::new();
    for node in nodes {
        if keep(&index.keywords_of(node)?) {
            out.push(XdmItem::Node(node.clone()));
        }
    }
    Ok(out)
}
