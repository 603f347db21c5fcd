use chrono::{DateTime, FixedOffset};
use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpandedName {
    pub ns_uri: Option<String>,
    pub local: String,
}

impl ExpandedName {
    pub fn new(ns_uri: Option<String>, local: impl Into<String>) -> Self {
        Self {
            ns_uri,
            local: local.into(),
        }
    }

    /// Convenience: a name in the given namespace.
    pub fn ns(ns_uri: &str, local: &str) -> Self {
        Self::new(Some(ns_uri.to_string()), local)
    }
}

impl fmt::Display for ExpandedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ns_uri.as_deref() {
            None => f.write_str(&self.local),
            Some(ns) => match crate::consts::prefix_for(ns) {
                Some(prefix) => write!(f, "{prefix}:{}", self.local),
                None => write!(f, "Q{{{ns}}}{}", self.local),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum XdmAtomicValue {
    Boolean(bool),
    String(String),
    UntypedAtomic(String),
    Integer(i64),
    Double(f64),
    DateTime(DateTime<FixedOffset>),
    // Canonical value in seconds (can be negative)
    DayTimeDuration(i64),
}

impl XdmAtomicValue {
    /// Name of the value's XML Schema type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            XdmAtomicValue::Boolean(_) => "xs:boolean",
            XdmAtomicValue::String(_) => "xs:string",
            XdmAtomicValue::UntypedAtomic(_) => "xs:untypedAtomic",
            XdmAtomicValue::Integer(_) => "xs:integer",
            XdmAtomicValue::Double(_) => "xs:double",
            XdmAtomicValue::DateTime(_) => "xs:dateTime",
            XdmAtomicValue::DayTimeDuration(_) => "xs:dayTimeDuration",
        }
    }
}

pub type XdmSequence<N> = Vec<XdmItem<N>>;

#[derive(Debug, Clone, PartialEq)]
pub enum XdmItem<N> {
    Node(N),
    Atomic(XdmAtomicValue),
}

impl<N> From<XdmAtomicValue> for XdmItem<N> {
    fn from(value: XdmAtomicValue) -> Self {
        XdmItem::Atomic(value)
    }
}

impl<N> From<bool> for XdmItem<N> {
    fn from(value: bool) -> Self {
        XdmItem::Atomic(XdmAtomicValue::Boolean(value))
    }
}

impl<N> From<i64> for XdmItem<N> {
    fn from(value: i64) -> Self {
        XdmItem::Atomic(XdmAtomicValue::Integer(value))
    }
}

impl<N> From<f64> for XdmItem<N> {
    fn from(value: f64) -> Self {
        XdmItem::Atomic(XdmAtomicValue::Double(value))
    }
}

impl<N> From<&str> for XdmItem<N> {
    fn from(value: &str) -> Self {
        XdmItem::Atomic(XdmAtomicValue::String(value.to_string()))
    }
}

impl<N> fmt::Display for XdmItem<N>
where
    N: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XdmItem::Node(_) => write!(f, "<node>"),
            XdmItem::Atomic(a) => write!(f, "{:?}", a),
        }
    }
}
