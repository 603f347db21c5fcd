use crate::engine::runtime::{Error, ErrorCode};
use crate::model::XdmNode;
use crate::xdm::{XdmAtomicValue, XdmItem};

/// Effective boolean value.
///
/// A node in first position makes the whole sequence true, and that check comes before
/// the length check; any other sequence of two or more items is true as well.
pub(crate) fn ebv<N>(seq: &[XdmItem<N>]) -> bool {
    use XdmAtomicValue as V;
    match seq {
        [] => false,
        [XdmItem::Node(_), ..] => true,
        [_, _, ..] => true,
        [XdmItem::Atomic(a)] => match a {
            V::Boolean(b) => *b,
            V::Integer(i) => *i != 0,
            V::Double(d) => *d != 0.0 && !d.is_nan(),
            V::String(s) | V::UntypedAtomic(s) => !s.is_empty(),
            V::DateTime(_) | V::DayTimeDuration(_) => true,
        },
    }
}

/// Nodes of an argument already converted to `node()*`.
pub(crate) fn nodes_of<N: XdmNode>(seq: &[XdmItem<N>]) -> Result<Vec<&N>, Error> {
    seq.iter()
        .map(|it| match it {
            XdmItem::Node(n) => Ok(n),
            XdmItem::Atomic(a) => Err(Error::from_code(
                ErrorCode::XPTY0004,
                format!("expected a node, found {}", a.type_name()),
            )),
        })
        .collect()
}

/// Strings of an argument already converted to `xs:string*`.
pub(crate) fn strings_of<N>(seq: &[XdmItem<N>]) -> Result<Vec<&str>, Error> {
    seq.iter()
        .map(|it| match it {
            XdmItem::Atomic(XdmAtomicValue::String(s)) => Ok(s.as_str()),
            other => Err(Error::from_code(
                ErrorCode::XPTY0004,
                format!(
                    "expected xs:string, found {}",
                    match other {
                        XdmItem::Atomic(a) => a.type_name(),
                        XdmItem::Node(_) => "node()",
                    }
                ),
            )),
        })
        .collect()
}
