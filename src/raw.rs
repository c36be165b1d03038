//! Dialect-agnostic attributed tree built from the document text.
//!
//! Everything downstream reads [`RawRecord`]s; nothing re-parses the original
//! text. Names keep the prefix they were written with (`Calculation:scenario`,
//! `xsi:type`) so dialect lookups can use the familiar spelling.

use std::collections::BTreeMap;

/// One element of the parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub children: Vec<RawRecord>,
    /// Direct text content, `None` when absent or whitespace only.
    pub text: Option<String>,
}

impl RawRecord {
    /// Parse `xml` and convert its root element.
    pub fn parse(xml: &str) -> Result<RawRecord, roxmltree::Error> {
        let doc = roxmltree::Document::parse(xml)?;
        Ok(Self::from_node(doc.root_element()))
    }

    fn from_node(node: roxmltree::Node<'_, '_>) -> RawRecord {
        let tag = qualified(node, node.tag_name().namespace(), node.tag_name().name());

        let attrs = node
            .attributes()
            .map(|a| (qualified(node, a.namespace(), a.name()), a.value().to_string()))
            .collect();

        let mut text = String::new();
        let mut children = Vec::new();
        for child in node.children() {
            if child.is_element() {
                children.push(Self::from_node(child));
            } else if child.is_text() {
                text.push_str(child.text().unwrap_or_default());
            }
        }

        RawRecord {
            tag,
            attrs,
            children,
            text: (!text.trim().is_empty()).then_some(text),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Tag name without its prefix.
    pub fn local_name(&self) -> &str {
        self.tag.rsplit(':').next().unwrap_or(&self.tag)
    }

    /// First direct child named `tag`.
    pub fn child(&self, tag: &str) -> Option<&RawRecord> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Last direct child named `tag`.
    pub fn last_child(&self, tag: &str) -> Option<&RawRecord> {
        self.children.iter().rev().find(|c| c.tag == tag)
    }

    /// Follow `path` one level per segment and collect every record reached.
    ///
    /// This is the single place where the dialect's "one or many" shape is
    /// normalized: a missing container yields an empty list, a lone element a
    /// singleton, repeated elements come back in document order.
    pub fn many(&self, path: &[&str]) -> Vec<&RawRecord> {
        let mut level = vec![self];
        for segment in path {
            level = level
                .into_iter()
                .flat_map(|r| r.children.iter().filter(move |c| c.tag == *segment))
                .collect();
        }
        level
    }
}

pub(crate) fn qualified(node: roxmltree::Node<'_, '_>, namespace: Option<&str>, name: &str) -> String {
    match namespace.and_then(|ns| node.lookup_prefix(ns)) {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{name}"),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = r#"xmlns:Calculation="http://www.sap.com/ndb/BiModelCalculation.ecore" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#;

    #[test]
    fn test_keeps_prefixes() {
        let xml = format!(
            r#"<Calculation:scenario {NS} id="V"><calculationView xsi:type="Calculation:JoinView" id="J"/></Calculation:scenario>"#
        );
        let root = RawRecord::parse(&xml).unwrap();
        assert_eq!(root.tag, "Calculation:scenario");
        assert_eq!(root.local_name(), "scenario");
        assert_eq!(root.attr("id"), Some("V"));
        assert_eq!(root.children[0].attr("xsi:type"), Some("Calculation:JoinView"));
    }

    #[test]
    fn test_many_normalizes_multiplicity() {
        let xml = r#"<root>
            <a><b id="1"/></a>
            <c><b id="2"/><b id="3"/></c>
        </root>"#;
        let root = RawRecord::parse(xml).unwrap();
        assert!(root.many(&["missing", "b"]).is_empty());
        assert_eq!(root.many(&["a", "b"]).len(), 1);
        let ids: Vec<_> = root.many(&["c", "b"]).iter().filter_map(|r| r.attr("id")).collect();
        assert_eq!(ids, ["2", "3"]);
    }

    #[test]
    fn test_whitespace_text_is_dropped() {
        let root = RawRecord::parse("<a>\n  <b>x + 1</b>\n</a>").unwrap();
        assert_eq!(root.text, None);
        assert_eq!(root.children[0].text.as_deref(), Some("x + 1"));
    }

    #[test]
    fn test_syntax_error() {
        assert!(RawRecord::parse("<a><b></a>").is_err());
    }
}
