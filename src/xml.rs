//! Owned XML element tree for BPMN documents.
//!
//! `roxmltree` handles parsing; the tree here is a mutable, owned copy in the
//! ElementTree shape (one optional text payload per element, no mixed-content
//! tails) so the layout engine can append generated records in place. The
//! serializer re-indents the whole document with two-space indentation and a
//! fixed namespace-prefix table.

use thiserror::Error;

use crate::model::NAMESPACE_PREFIXES;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("malformed document: {0}")]
    Parse(#[from] roxmltree::Error),
}

/// Qualified name: namespace URI (not prefix) plus local part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    pub namespace: Option<String>,
    pub local: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: QName,
    pub attributes: Vec<Attribute>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub root: Element,
}

impl Element {
    pub fn new(namespace: &str, local: &str) -> Self {
        Self {
            name: QName {
                namespace: Some(namespace.to_string()),
                local: local.to_string(),
            },
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.name.local == local && self.name.namespace.as_deref() == Some(namespace)
    }

    /// Look up an attribute by local name, ignoring any namespace.
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name.local == local)
            .map(|attr| attr.value.as_str())
    }

    /// Set an unqualified attribute, replacing any existing value.
    pub fn set_attr(&mut self, local: &str, value: &str) {
        if let Some(attr) = self
            .attributes
            .iter_mut()
            .find(|attr| attr.name.local == local && attr.name.namespace.is_none())
        {
            attr.value = value.to_string();
            return;
        }
        self.attributes.push(Attribute {
            name: QName {
                namespace: None,
                local: local.to_string(),
            },
            value: value.to_string(),
        });
    }

    /// Depth-first search over all descendants, document order.
    pub fn descendant(&self, namespace: &str, local: &str) -> Option<&Element> {
        for child in &self.children {
            if child.is(namespace, local) {
                return Some(child);
            }
            if let Some(found) = child.descendant(namespace, local) {
                return Some(found);
            }
        }
        None
    }

    pub fn descendant_mut(&mut self, namespace: &str, local: &str) -> Option<&mut Element> {
        for child in &mut self.children {
            if child.is(namespace, local) {
                return Some(child);
            }
            if let Some(found) = child.descendant_mut(namespace, local) {
                return Some(found);
            }
        }
        None
    }
}

impl Document {
    pub fn parse(input: &str) -> Result<Self, XmlError> {
        let parsed = roxmltree::Document::parse(input)?;
        Ok(Self {
            root: convert(parsed.root_element()),
        })
    }

    /// Serialize with an XML declaration and two-space indentation. Namespace
    /// declarations are collected onto the root element; URIs outside the
    /// fixed BPMN prefix table get generated `ns0`, `ns1`, ... prefixes.
    pub fn to_xml(&self) -> String {
        let namespaces = collect_namespaces(&self.root);
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        write_element(&mut out, &self.root, 0, &namespaces, true);
        out
    }
}

fn convert(node: roxmltree::Node<'_, '_>) -> Element {
    let mut text = String::new();
    let mut children = Vec::new();
    for child in node.children() {
        if child.is_element() {
            children.push(convert(child));
        } else if child.is_text() {
            if let Some(value) = child.text() {
                text.push_str(value);
            }
        }
    }
    let trimmed = text.trim();
    Element {
        name: QName {
            namespace: node.tag_name().namespace().map(str::to_string),
            local: node.tag_name().name().to_string(),
        },
        attributes: node
            .attributes()
            .map(|attr| Attribute {
                name: QName {
                    namespace: attr.namespace().map(str::to_string),
                    local: attr.name().to_string(),
                },
                value: attr.value().to_string(),
            })
            .collect(),
        text: (!trimmed.is_empty()).then(|| trimmed.to_string()),
        children,
    }
}

/// Every namespace URI used by an element or attribute, first-encounter order.
fn collect_namespaces(root: &Element) -> Vec<(String, String)> {
    let mut uris: Vec<String> = Vec::new();
    gather_uris(root, &mut uris);

    let mut generated = 0usize;
    uris.into_iter()
        .map(|uri| {
            let prefix = NAMESPACE_PREFIXES
                .iter()
                .find(|(known, _)| *known == uri)
                .map(|(_, prefix)| prefix.to_string())
                .unwrap_or_else(|| {
                    let prefix = format!("ns{generated}");
                    generated += 1;
                    prefix
                });
            (uri, prefix)
        })
        .collect()
}

fn gather_uris(element: &Element, uris: &mut Vec<String>) {
    if let Some(uri) = &element.name.namespace {
        if !uris.iter().any(|known| known == uri) {
            uris.push(uri.clone());
        }
    }
    for attr in &element.attributes {
        if let Some(uri) = &attr.name.namespace {
            if !uris.iter().any(|known| known == uri) {
                uris.push(uri.clone());
            }
        }
    }
    for child in &element.children {
        gather_uris(child, uris);
    }
}

fn prefixed(name: &QName, namespaces: &[(String, String)]) -> String {
    match &name.namespace {
        Some(uri) => {
            let prefix = namespaces
                .iter()
                .find(|(known, _)| known == uri)
                .map(|(_, prefix)| prefix.as_str())
                .unwrap_or_default();
            if prefix.is_empty() {
                name.local.clone()
            } else {
                format!("{prefix}:{}", name.local)
            }
        }
        None => name.local.clone(),
    }
}

fn write_element(
    out: &mut String,
    element: &Element,
    depth: usize,
    namespaces: &[(String, String)],
    is_root: bool,
) {
    let indent = "  ".repeat(depth);
    let tag = prefixed(&element.name, namespaces);
    out.push_str(&format!("{indent}<{tag}"));

    if is_root {
        for (uri, prefix) in namespaces {
            out.push_str(&format!(" xmlns:{prefix}=\"{}\"", escape_xml(uri)));
        }
    }
    for attr in &element.attributes {
        out.push_str(&format!(
            " {}=\"{}\"",
            prefixed(&attr.name, namespaces),
            escape_xml(&attr.value)
        ));
    }

    match (&element.text, element.children.is_empty()) {
        (None, true) => {
            out.push_str(" />\n");
        }
        (Some(text), true) => {
            out.push_str(&format!(">{}</{tag}>\n", escape_xml(text)));
        }
        (text, false) => {
            out.push('>');
            if let Some(text) = text {
                out.push_str(&escape_xml(text));
            }
            out.push('\n');
            for child in &element.children {
                write_element(out, child, depth + 1, namespaces, false);
            }
            out.push_str(&format!("{indent}</{tag}>\n"));
        }
    }
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
