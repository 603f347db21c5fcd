use super::common::strings_of;
use crate::engine::call::DynamicContext;
use crate::engine::runtime::Error;
use crate::model::XdmNode;
use crate::xdm::{XdmItem, XdmSequence};
use itertools::Itertools;

/// `fn:collection($uris)`: documents of every named collection and its subcollections.
pub(super) fn collection_fn<N: XdmNode>(
    ctx: &DynamicContext<N>,
    args: &[XdmSequence<N>],
) -> Result<XdmSequence<N>, Error> {
    documents(ctx, &args[0], true)
}

/// `xmldb:xcollection($uris)`: documents stored directly in the named collections.
pub(super) fn xcollection_fn<N: XdmNode>(
    ctx: &DynamicContext<N>,
    args: &[XdmSequence<N>],
) -> Result<XdmSequence<N>, Error> {
    documents(ctx, &args[0], false)
}

// A document reachable through several of the given paths is returned once, at its
// first position.
fn documents<N: XdmNode>(
    ctx: &DynamicContext<N>,
    paths: &[XdmItem<N>],
    include_subcollections: bool,
) -> Result<XdmSequence<N>, Error> {
    let store = ctx.query.collection_store()?;
    let mut docs = Vec::new();
    for path in strings_of(paths)? {
        docs.extend(store.list_documents(path, include_subcollections)?);
    }
    Ok(docs.into_iter().unique().map(XdmItem::Node).collect())
}
