use crate::engine::call::DynamicContext;
use crate::engine::runtime::{Error, ErrorCode};
use crate::model::XdmNode;
use crate::xdm::{XdmAtomicValue, XdmItem, XdmSequence};

/// `fn:insert-before($target, $position, $inserts)`.
///
/// Evaluates its operands itself: when either one is empty the other is returned
/// unchanged and `$position` is never evaluated.
pub(super) fn insert_before_fn<N: XdmNode>(
    ctx: &DynamicContext<N>,
) -> Result<XdmSequence<N>, Error> {
    let target = ctx.argument(0)?;
    let inserts = ctx.argument(2)?;
    if target.is_empty() {
        return Ok(inserts);
    }
    if inserts.is_empty() {
        return Ok(target);
    }
    let position = position_of(ctx.argument(1)?.first())?;
    Ok(insert_at(target, position.saturating_sub(1), inserts))
}

/// One-based position from an argument already converted to `xs:numeric`.
///
/// Doubles are truncated toward zero with a saturating cast: NaN becomes 0 and values
/// beyond the integer range stick to its ends, so they clamp like any other position.
fn position_of<N: core::fmt::Debug>(item: Option<&XdmItem<N>>) -> Result<i64, Error> {
    match item {
        Some(XdmItem::Atomic(XdmAtomicValue::Integer(i))) => Ok(*i),
        Some(XdmItem::Atomic(XdmAtomicValue::Double(d))) => {
            #[allow(clippy::cast_possible_truncation)]
            let truncated = d.trunc() as i64;
            Ok(truncated)
        }
        other => Err(Error::from_code(
            ErrorCode::XPTY0004,
            format!("insert-before position must be a single number, found {other:?}"),
        )),
    }
}

/// Splice `inserts` before zero-based `index`, clamping to either end.
fn insert_at<N>(
    mut target: XdmSequence<N>,
    index: i64,
    inserts: XdmSequence<N>,
) -> XdmSequence<N> {
    let len = target.len();
    match usize::try_from(index) {
        Err(_) | Ok(0) => {
            let mut out = inserts;
            out.append(&mut target);
            out
        }
        Ok(i) if i >= len => {
            target.extend(inserts);
            target
        }
        Ok(i) => {
            let tail = target.split_off(i);
            target.extend(inserts);
            target.extend(tail);
            target
        }
    }
}
