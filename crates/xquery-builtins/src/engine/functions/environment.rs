use crate::engine::call::DynamicContext;
use crate::engine::runtime::Error;
use crate::model::XdmNode;
use crate::xdm::{XdmAtomicValue, XdmItem, XdmSequence};

// Both functions read the instant captured when the query context was built, never the
// wall clock, so repeated calls in one query agree even across a DST change.

pub(super) fn implicit_timezone_fn<N: XdmNode>(
    ctx: &DynamicContext<N>,
    _args: &[XdmSequence<N>],
) -> Result<XdmSequence<N>, Error> {
    let secs = i64::from(ctx.query.implicit_timezone().local_minus_utc());
    Ok(vec![XdmItem::Atomic(XdmAtomicValue::DayTimeDuration(secs))])
}

pub(super) fn current_date_time_fn<N: XdmNode>(
    ctx: &DynamicContext<N>,
    _args: &[XdmSequence<N>],
) -> Result<XdmSequence<N>, Error> {
    Ok(vec![XdmItem::Atomic(XdmAtomicValue::DateTime(ctx.query.start))])
}
