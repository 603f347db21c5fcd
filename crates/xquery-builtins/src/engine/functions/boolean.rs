use super::common::ebv;
use crate::engine::call::DynamicContext;
use crate::engine::runtime::Error;
use crate::model::XdmNode;
use crate::xdm::{XdmAtomicValue, XdmItem, XdmSequence};

pub(super) fn fn_true<N: XdmNode>(
    _ctx: &DynamicContext<N>,
    _args: &[XdmSequence<N>],
) -> Result<XdmSequence<N>, Error> {
    Ok(vec![XdmItem::Atomic(XdmAtomicValue::Boolean(true))])
}

pub(super) fn fn_false<N: XdmNode>(
    _ctx: &DynamicContext<N>,
    _args: &[XdmSequence<N>],
) -> Result<XdmSequence<N>, Error> {
    Ok(vec![XdmItem::Atomic(XdmAtomicValue::Boolean(false))])
}

pub(super) fn fn_not<N: XdmNode>(
    _ctx: &DynamicContext<N>,
    args: &[XdmSequence<N>],
) -> Result<XdmSequence<N>, Error> {
    let b = ebv(&args[0]);
    Ok(vec![XdmItem::Atomic(XdmAtomicValue::Boolean(!b))])
}

pub(super) fn fn_boolean<N: XdmNode>(
    _ctx: &DynamicContext<N>,
    args: &[XdmSequence<N>],
) -> Result<XdmSequence<N>, Error> {
    let b = ebv(&args[0]);
    Ok(vec![XdmItem::Atomic(XdmAtomicValue::Boolean(b))])
}
