//! Qualified names and namespace scope tracking.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Namespace bound to the `xml` prefix.
pub const XML_NS_URI: &str = "http://www.w3.org/XML/1998/namespace";

/// Namespace of `xsi:schemaLocation` and `xsi:noNamespaceSchemaLocation`.
pub const XSI_NS_URI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// A qualified XML name: local name, optional namespace URI and the prefix
/// it was written with.
///
/// Equality and hashing only consider the namespace URI and the local name,
/// the prefix is presentation.
#[derive(Debug, Clone)]
pub struct QName {
    namespace_uri: Option<String>,
    local_name: String,
    prefix: Option<String>,
}

impl QName {
    /// Creates a name in the given namespace without a prefix.
    pub fn new(namespace_uri: impl Into<String>, local_name: impl Into<String>) -> Self {
        let uri = namespace_uri.into();
        QName {
            namespace_uri: if uri.is_empty() { None } else { Some(uri) },
            local_name: local_name.into(),
            prefix: None,
        }
    }

    /// Creates a name in no namespace.
    pub fn local(local_name: impl Into<String>) -> Self {
        QName {
            namespace_uri: None,
            local_name: local_name.into(),
            prefix: None,
        }
    }

    /// Returns a copy of this name carrying the given prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = if prefix.is_empty() { None } else { Some(prefix) };
        self
    }

    pub fn namespace_uri(&self) -> Option<&str> {
        self.namespace_uri.as_deref()
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Returns the name as written in the document (`prefix:local`).
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{}:{}", p, self.local_name),
            None => self.local_name.clone(),
        }
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.namespace_uri == other.namespace_uri && self.local_name == other.local_name
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace_uri.hash(state);
        self.local_name.hash(state);
    }
}

/// Clark notation: `{uri}local`, or just `local` without a namespace.
impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace_uri {
            Some(uri) => write!(f, "{{{}}}{}", uri, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

/// Tracks namespace bindings while walking a document.
#[derive(Debug)]
pub struct NamespaceContext {
    /// Stack of scopes, each containing prefix -> URI bindings.
    scopes: Vec<HashMap<String, String>>,
}

impl Default for NamespaceContext {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceContext {
    /// Creates a new namespace context with the `xml` prefix pre-bound.
    pub fn new() -> Self {
        let mut ctx = NamespaceContext {
            scopes: vec![HashMap::new()],
        };
        ctx.bind("xml", XML_NS_URI);
        ctx
    }

    /// Pushes a new scope for entering an element.
    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pops the current scope when leaving an element.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Binds a prefix to a URI in the current scope.
    ///
    /// An empty URI undeclares the prefix (`xmlns=""`).
    pub fn bind(&mut self, prefix: &str, uri: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(prefix.to_string(), uri.to_string());
        }
    }

    /// Resolves a prefix to its URI, searching from the innermost scope.
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(prefix))
            .map(String::as_str)
            .filter(|uri| !uri.is_empty())
    }

    /// Resolves an element name; unprefixed names take the default namespace.
    pub fn element_name(&self, raw: &str) -> QName {
        let (prefix, local) = split_qname(raw);
        let uri = self.resolve(prefix.unwrap_or("")).unwrap_or("");
        QName::new(uri, local).with_prefix(prefix.unwrap_or(""))
    }

    /// Resolves an attribute name; unprefixed attributes are in no namespace.
    pub fn attribute_name(&self, raw: &str) -> QName {
        match split_qname(raw) {
            (Some(prefix), local) => {
                QName::new(self.resolve(prefix).unwrap_or(""), local).with_prefix(prefix)
            }
            (None, local) => QName::local(local),
        }
    }

    /// Reads the `xmlns` declarations of an element into the current scope.
    ///
    /// Returns the declarations as (prefix, uri) pairs, the default
    /// namespace using an empty prefix.
    pub fn declare<'a, I>(&mut self, attributes: I) -> Vec<(String, String)>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut decls = Vec::new();
        for (name, value) in attributes {
            if !is_xmlns_attr(name) {
                continue;
            }
            let prefix = name.strip_prefix("xmlns:").unwrap_or("");
            self.bind(prefix, value);
            decls.push((prefix.to_string(), value.to_string()));
        }
        decls
    }
}

/// Splits a qualified name into prefix and local name.
///
/// Returns (Some(prefix), local) for "prefix:local"
/// Returns (None, name) for "name" without prefix
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    if let Some(pos) = qname.find(':') {
        (Some(&qname[..pos]), &qname[pos + 1..])
    } else {
        (None, qname)
    }
}

/// Checks if an attribute name is a namespace declaration.
pub fn is_xmlns_attr(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_qname() {
        assert_eq!(split_qname("xsi:type"), (Some("xsi"), "type"));
        assert_eq!(split_qname("type"), (None, "type"));
        assert_eq!(split_qname("ns:foo:bar"), (Some("ns"), "foo:bar"));
    }

    #[test]
    fn test_qname_equality_ignores_prefix() {
        let a = QName::new("urn:x", "item").with_prefix("a");
        let b = QName::new("urn:x", "item").with_prefix("b");
        let c = QName::local("item");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.qualified(), "a:item");
        assert_eq!(a.to_string(), "{urn:x}item");
        assert_eq!(c.to_string(), "item");
    }

    #[test]
    fn test_empty_uri_means_no_namespace() {
        assert_eq!(QName::new("", "x"), QName::local("x"));
        assert!(QName::new("", "x").namespace_uri().is_none());
    }

    #[test]
    fn test_element_and_attribute_resolution() {
        let mut ctx = NamespaceContext::new();
        ctx.push_scope();
        let decls = ctx.declare([("xmlns", "urn:default"), ("xmlns:p", "urn:p"), ("id", "1")]);
        assert_eq!(decls.len(), 2);

        let el = ctx.element_name("root");
        assert_eq!(el.namespace_uri(), Some("urn:default"));
        assert_eq!(el.prefix(), None);

        let pel = ctx.element_name("p:child");
        assert_eq!(pel.namespace_uri(), Some("urn:p"));
        assert_eq!(pel.prefix(), Some("p"));

        // default namespace does not apply to attributes
        assert!(ctx.attribute_name("id").namespace_uri().is_none());
        assert_eq!(ctx.attribute_name("p:id").namespace_uri(), Some("urn:p"));
    }

    #[test]
    fn test_undeclare_default_namespace() {
        let mut ctx = NamespaceContext::new();
        ctx.push_scope();
        ctx.bind("", "urn:outer");
        ctx.push_scope();
        ctx.bind("", "");
        assert!(ctx.element_name("inner").namespace_uri().is_none());
        ctx.pop_scope();
        assert_eq!(ctx.element_name("outer").namespace_uri(), Some("urn:outer"));
    }

    #[test]
    fn test_scope_inheritance() {
        let mut ctx = NamespaceContext::new();
        ctx.push_scope();
        ctx.bind("a", "http://example.com/a");

        ctx.push_scope();
        ctx.bind("b", "http://example.com/b");

        assert!(ctx.resolve("a").is_some());
        assert!(ctx.resolve("b").is_some());

        ctx.pop_scope();
        assert!(ctx.resolve("a").is_some());
        assert!(ctx.resolve("b").is_none());
    }

    #[test]
    fn test_xml_prefix_always_bound() {
        let ctx = NamespaceContext::new();
        assert_eq!(ctx.resolve("xml"), Some(XML_NS_URI));
    }

    #[test]
    fn test_is_xmlns() {
        assert!(is_xmlns_attr("xmlns"));
        assert!(is_xmlns_attr("xmlns:xsi"));
        assert!(!is_xmlns_attr("xml:lang"));
        assert!(!is_xmlns_attr("href"));
    }
}
