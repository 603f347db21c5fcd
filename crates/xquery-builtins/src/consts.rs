/// W3C functions and operators namespace (`fn:`).
pub const FNS: &str = "http://www.w3.org/2005/xpath-functions";
/// XML Schema namespace (`xs:`).
pub const XS: &str = "http://www.w3.org/2001/XMLSchema";
/// Namespace of W3C-defined error codes (`err:`).
pub const ERR_NS: &str = "http://www.w3.org/2005/xqt-errors";
/// Database collection functions (`xmldb:`).
pub const XMLDB_NS: &str = "http://exist-db.org/xquery/xmldb";
/// Fulltext keyword functions (`text:`).
pub const TEXT_NS: &str = "http://exist-db.org/xquery/text";
/// Legacy extension namespace (`exist:`); functions registered here are deprecated aliases.
pub const LEGACY_NS: &str = "http://exist.sourceforge.net/NS/exist";

/// Conventional prefix for a namespace URI, used when rendering names in messages.
pub fn prefix_for(ns_uri: &str) -> Option<&'static str> {
    match ns_uri {
        FNS => Some("fn"),
        XS => Some("xs"),
        ERR_NS => Some("err"),
        XMLDB_NS => Some("xmldb"),
        TEXT_NS => Some("text"),
        LEGACY_NS => Some("exist"),
        _ => None,
    }
}
