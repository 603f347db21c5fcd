//! Item types, cardinalities and the conversion rules applied to function arguments.

use crate::engine::runtime::{Error, ErrorCode};
use crate::model::XdmNode;
use crate::xdm::{XdmAtomicValue, XdmItem, XdmSequence};
use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    AnyItem,
    Node,
    AnyAtomic,
    String,
    Integer,
    Double,
    /// `xs:integer` or `xs:double`.
    Numeric,
    Boolean,
    DateTime,
    DayTimeDuration,
}

impl ItemType {
    pub fn is_atomic(self) -> bool {
        !matches!(self, ItemType::AnyItem | ItemType::Node)
    }

    /// Whether `item` is an instance of this type as-is, without any conversion.
    pub fn matches<N>(self, item: &XdmItem<N>) -> bool {
        use XdmAtomicValue as V;
        match (self, item) {
            (ItemType::AnyItem, _) => true,
            (ItemType::Node, XdmItem::Node(_)) => true,
            (_, XdmItem::Node(_)) | (ItemType::Node, XdmItem::Atomic(_)) => false,
            (ItemType::AnyAtomic, XdmItem::Atomic(_)) => true,
            (ItemType::String, XdmItem::Atomic(a)) => matches!(a, V::String(_)),
            (ItemType::Integer, XdmItem::Atomic(a)) => matches!(a, V::Integer(_)),
            (ItemType::Double, XdmItem::Atomic(a)) => matches!(a, V::Double(_)),
            (ItemType::Numeric, XdmItem::Atomic(a)) => matches!(a, V::Integer(_) | V::Double(_)),
            (ItemType::Boolean, XdmItem::Atomic(a)) => matches!(a, V::Boolean(_)),
            (ItemType::DateTime, XdmItem::Atomic(a)) => matches!(a, V::DateTime(_)),
            (ItemType::DayTimeDuration, XdmItem::Atomic(a)) => matches!(a, V::DayTimeDuration(_)),
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ItemType::AnyItem => "item()",
            ItemType::Node => "node()",
            ItemType::AnyAtomic => "xs:anyAtomicType",
            ItemType::String => "xs:string",
            ItemType::Integer => "xs:integer",
            ItemType::Double => "xs:double",
            ItemType::Numeric => "xs:numeric",
            ItemType::Boolean => "xs:boolean",
            ItemType::DateTime => "xs:dateTime",
            ItemType::DayTimeDuration => "xs:dayTimeDuration",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    ExactlyOne,
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
}

impl Cardinality {
    /// Inclusive (min, max) length bounds; `None` means unbounded.
    fn bounds(self) -> (usize, Option<usize>) {
        match self {
            Cardinality::ExactlyOne => (1, Some(1)),
            Cardinality::ZeroOrOne => (0, Some(1)),
            Cardinality::ZeroOrMore => (0, None),
            Cardinality::OneOrMore => (1, None),
        }
    }

    /// Every sequence length admitted by `self` is admitted by `declared`.
    pub fn is_subtype_of(self, declared: Cardinality) -> bool {
        let (amin, amax) = self.bounds();
        let (dmin, dmax) = declared.bounds();
        let max_ok = match (amax, dmax) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(a), Some(d)) => a <= d,
        };
        amin >= dmin && max_ok
    }

    pub fn accepts(self, len: usize) -> bool {
        let (min, max) = self.bounds();
        len >= min && max.is_none_or(|m| len <= m)
    }

    fn suffix(self) -> &'static str {
        match self {
            Cardinality::ExactlyOne => "",
            Cardinality::ZeroOrOne => "?",
            Cardinality::ZeroOrMore => "*",
            Cardinality::OneOrMore => "+",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SequenceType {
    pub item: ItemType,
    pub cardinality: Cardinality,
}

impl SequenceType {
    pub const fn new(item: ItemType, cardinality: Cardinality) -> Self {
        Self { item, cardinality }
    }
    pub const fn any_item(cardinality: Cardinality) -> Self {
        Self::new(ItemType::AnyItem, cardinality)
    }
    pub const fn node(cardinality: Cardinality) -> Self {
        Self::new(ItemType::Node, cardinality)
    }
    pub const fn string(cardinality: Cardinality) -> Self {
        Self::new(ItemType::String, cardinality)
    }
    pub const fn integer(cardinality: Cardinality) -> Self {
        Self::new(ItemType::Integer, cardinality)
    }
    pub const fn numeric(cardinality: Cardinality) -> Self {
        Self::new(ItemType::Numeric, cardinality)
    }
    pub const fn boolean(cardinality: Cardinality) -> Self {
        Self::new(ItemType::Boolean, cardinality)
    }

    pub fn is_subtype_of(&self, declared: &SequenceType) -> bool {
        let item_ok = declared.item == self.item
            || declared.item == ItemType::AnyItem
            || (declared.item == ItemType::AnyAtomic && self.item.is_atomic())
            || (declared.item == ItemType::Numeric
                && matches!(self.item, ItemType::Integer | ItemType::Double));
        item_ok && self.cardinality.is_subtype_of(declared.cardinality)
    }

    /// Check without converting: the length fits and every item is already an instance.
    pub fn matches<N>(&self, seq: &[XdmItem<N>]) -> bool {
        self.cardinality.accepts(seq.len()) && seq.iter().all(|it| self.item.matches(it))
    }

    /// Apply the argument conversion rules: check the length, then atomize and
    /// promote every item towards the declared item type.
    pub fn apply<N: XdmNode>(&self, seq: XdmSequence<N>) -> Result<XdmSequence<N>, Error> {
        if !self.cardinality.accepts(seq.len()) {
            return Err(Error::from_code(
                ErrorCode::XPTY0004,
                format!(
                    "sequence of {} item(s) does not match required type {}",
                    seq.len(),
                    self
                ),
            ));
        }
        if self.item == ItemType::AnyItem {
            return Ok(seq);
        }
        seq.into_iter()
            .map(|item| coerce_item(item, self.item))
            .collect()
    }
}

impl fmt::Display for SequenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.item, self.cardinality.suffix())
    }
}

pub fn atomize<N: XdmNode>(item: XdmItem<N>) -> XdmAtomicValue {
    match item {
        XdmItem::Atomic(a) => a,
        XdmItem::Node(n) => XdmAtomicValue::UntypedAtomic(n.string_value()),
    }
}

fn type_error(from: &str, target: ItemType) -> Error {
    Error::from_code(
        ErrorCode::XPTY0004,
        format!("cannot convert {from} to {target}"),
    )
}

/// Convert a single item to `target`, following the defined promotion paths.
///
/// Nodes are atomized first when an atomic type is required. `xs:double` to
/// `xs:integer` truncates toward zero; NaN and infinities cannot be converted.
pub fn coerce_item<N: XdmNode>(item: XdmItem<N>, target: ItemType) -> Result<XdmItem<N>, Error> {
    use XdmAtomicValue as V;
    match target {
        ItemType::AnyItem => return Ok(item),
        ItemType::Node => {
            return match item {
                XdmItem::Node(_) => Ok(item),
                XdmItem::Atomic(a) => Err(type_error(a.type_name(), target)),
            };
        }
        _ => {}
    }
    let value = atomize(item);
    let converted = match (target, value) {
        (ItemType::AnyAtomic, v) => v,
        (ItemType::String, V::String(s) | V::UntypedAtomic(s)) => V::String(s),
        (ItemType::Integer, V::Integer(i)) => V::Integer(i),
        (ItemType::Integer, V::Double(d)) => V::Integer(truncate_double(d)?),
        (ItemType::Integer, V::String(s) | V::UntypedAtomic(s)) => V::Integer(parse_integer(&s)?),
        (ItemType::Double, V::Double(d)) => V::Double(d),
        #[allow(clippy::cast_precision_loss)]
        (ItemType::Double, V::Integer(i)) => V::Double(i as f64),
        (ItemType::Double, V::String(s) | V::UntypedAtomic(s)) => V::Double(parse_double(&s)?),
        (ItemType::Numeric, v @ (V::Integer(_) | V::Double(_))) => v,
        (ItemType::Numeric, V::String(s) | V::UntypedAtomic(s)) => match parse_integer(&s) {
            Ok(i) => V::Integer(i),
            Err(_) => V::Double(parse_double(&s)?),
        },
        (ItemType::Boolean, V::Boolean(b)) => V::Boolean(b),
        (ItemType::Boolean, V::String(s) | V::UntypedAtomic(s)) => V::Boolean(parse_boolean(&s)?),
        (ItemType::DateTime, v @ V::DateTime(_)) => v,
        (ItemType::DayTimeDuration, v @ V::DayTimeDuration(_)) => v,
        (_, other) => return Err(type_error(other.type_name(), target)),
    };
    Ok(XdmItem::Atomic(converted))
}

/// IEEE round-toward-zero conversion of a double to an integer.
pub fn truncate_double(d: f64) -> Result<i64, Error> {
    if !d.is_finite() {
        return Err(Error::from_code(
            ErrorCode::FOCA0002,
            format!("cannot convert {d} to xs:integer"),
        ));
    }
    let t = d.trunc();
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range
    #[allow(clippy::cast_precision_loss)]
    let (lo, hi) = (i64::MIN as f64, i64::MAX as f64);
    if t < lo || t >= hi {
        return Err(Error::from_code(
            ErrorCode::FOCA0003,
            format!("{d} is too large for xs:integer"),
        ));
    }
    #[allow(clippy::cast_possible_truncation)]
    let truncated = t as i64;
    Ok(truncated)
}

fn invalid_lexical(s: &str, target: &str) -> Error {
    Error::from_code(
        ErrorCode::FORG0001,
        format!("invalid lexical value {s:?} for {target}"),
    )
}

fn parse_integer(s: &str) -> Result<i64, Error> {
    s.trim()
        .parse::<i64>()
        .map_err(|_| invalid_lexical(s, "xs:integer"))
}

fn parse_double(s: &str) -> Result<f64, Error> {
    let t = s.trim();
    match t {
        "INF" | "+INF" => return Ok(f64::INFINITY),
        "-INF" => return Ok(f64::NEG_INFINITY),
        "NaN" => return Ok(f64::NAN),
        _ => {}
    }
    // Rust accepts "inf"/"nan" spellings that xs:double does not
    if t.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return Err(invalid_lexical(s, "xs:double"));
    }
    t.parse::<f64>().map_err(|_| invalid_lexical(s, "xs:double"))
}

fn parse_boolean(s: &str) -> Result<bool, Error> {
    match s.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(invalid_lexical(s, "xs:boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simple_node::{SimpleNode, elem, text};
    use rstest::rstest;

    type I = XdmItem<SimpleNode>;

    #[rstest]
    #[case(Cardinality::ExactlyOne, Cardinality::ZeroOrOne, true)]
    #[case(Cardinality::ExactlyOne, Cardinality::OneOrMore, true)]
    #[case(Cardinality::ExactlyOne, Cardinality::ZeroOrMore, true)]
    #[case(Cardinality::ZeroOrOne, Cardinality::ZeroOrMore, true)]
    #[case(Cardinality::OneOrMore, Cardinality::ZeroOrMore, true)]
    #[case(Cardinality::ZeroOrOne, Cardinality::OneOrMore, false)]
    #[case(Cardinality::OneOrMore, Cardinality::ZeroOrOne, false)]
    #[case(Cardinality::ZeroOrMore, Cardinality::OneOrMore, false)]
    #[case(Cardinality::ZeroOrMore, Cardinality::ExactlyOne, false)]
    fn cardinality_subtyping(
        #[case] actual: Cardinality,
        #[case] declared: Cardinality,
        #[case] expected: bool,
    ) {
        assert_eq!(actual.is_subtype_of(declared), expected);
    }

    #[rstest]
    #[case(2.9, 2)]
    #[case(-2.9, -2)]
    #[case(0.5, 0)]
    #[case(-0.5, 0)]
    fn double_to_integer_truncates_toward_zero(#[case] input: f64, #[case] expected: i64) {
        let out = coerce_item::<SimpleNode>(I::from(input), ItemType::Integer).unwrap();
        assert_eq!(out, I::from(expected));
    }

    #[test]
    fn nan_to_integer_is_a_conversion_error() {
        let err = coerce_item::<SimpleNode>(I::from(f64::NAN), ItemType::Integer).unwrap_err();
        assert_eq!(err.code_enum(), ErrorCode::FOCA0002);
    }

    #[test]
    fn node_atomizes_before_numeric_promotion() {
        let node = elem("n").child(text("42")).build();
        let out = coerce_item(I::Node(node), ItemType::Numeric).unwrap();
        assert_eq!(out, I::from(42_i64));
    }

    #[test]
    fn non_numeric_string_fails_with_forg0001() {
        let err = coerce_item::<SimpleNode>(I::from("twelve"), ItemType::Double).unwrap_err();
        assert_eq!(err.code_enum(), ErrorCode::FORG0001);
        let err = coerce_item::<SimpleNode>(I::from("inf"), ItemType::Double).unwrap_err();
        assert_eq!(err.code_enum(), ErrorCode::FORG0001);
    }

    #[test]
    fn boolean_to_integer_has_no_promotion_path() {
        let err = coerce_item::<SimpleNode>(I::from(true), ItemType::Integer).unwrap_err();
        assert_eq!(err.code_enum(), ErrorCode::XPTY0004);
    }

    #[test]
    fn apply_rejects_cardinality_violation() {
        let ty = SequenceType::string(Cardinality::OneOrMore);
        let err = ty.apply::<SimpleNode>(vec![]).unwrap_err();
        assert_eq!(err.code_enum(), ErrorCode::XPTY0004);
    }

    #[test]
    fn sequence_type_subtyping_combines_item_and_cardinality() {
        let integer_one = SequenceType::integer(Cardinality::ExactlyOne);
        assert!(integer_one.is_subtype_of(&SequenceType::numeric(Cardinality::ZeroOrMore)));
        assert!(!integer_one.is_subtype_of(&SequenceType::string(Cardinality::ExactlyOne)));
        assert_eq!(
            SequenceType::node(Cardinality::ZeroOrMore).to_string(),
            "node()*"
        );
    }
}
