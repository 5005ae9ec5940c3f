//! A small, forgiving element tree over the slide markup.
//!
//! The markup comes from a probabilistic generator, so the tree builder never
//! fails: unknown entities are kept verbatim, stray end tags are ignored,
//! unclosed elements are closed by their ancestors, and a tokenizer error
//! stops the walk with whatever was recovered so far.

use quick_xml::escape::unescape_with;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;

/// Elements that never have content and are never closed in HTML.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "wbr",
];

/// Elements whose text is never content.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

type NodeId = usize;

#[derive(Debug)]
enum NodeKind {
    Root,
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    children: Vec<NodeId>,
}

/// A parsed markup document.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Build a tree from markup. Never fails.
    pub fn parse(markup: &str) -> Self {
        let mut doc = Document {
            nodes: vec![Node {
                kind: NodeKind::Root,
                children: Vec::new(),
            }],
        };

        let mut reader = Reader::from_str(markup);
        reader.trim_text(true);
        reader.check_end_names(false);
        reader.expand_empty_elements(false);

        // Open elements, root first
        let mut stack: Vec<NodeId> = vec![0];

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    let (name, attrs) = element_parts(e);
                    let is_void = VOID_ELEMENTS.contains(&name.as_str());
                    let id = doc.append(current(&stack), NodeKind::Element { name, attrs });
                    if !is_void {
                        stack.push(id);
                    }
                }
                Ok(Event::Empty(ref e)) => {
                    let (name, attrs) = element_parts(e);
                    doc.append(current(&stack), NodeKind::Element { name, attrs });
                }
                Ok(Event::End(ref e)) => {
                    let name = String::from_utf8_lossy(local_name(e.name().as_ref())).to_lowercase();
                    // Close the nearest open element with this name, along
                    // with anything left open inside it
                    if let Some(pos) = stack
                        .iter()
                        .rposition(|&id| doc.element_name(id) == Some(name.as_str()))
                    {
                        stack.truncate(pos);
                    }
                }
                Ok(Event::Text(ref e)) => {
                    let raw = String::from_utf8_lossy(e);
                    let text = decode_text(&raw);
                    if !text.trim().is_empty() {
                        doc.append(current(&stack), NodeKind::Text(text));
                    }
                }
                Ok(Event::CData(ref e)) => {
                    let text = String::from_utf8_lossy(e).to_string();
                    if !text.trim().is_empty() {
                        doc.append(current(&stack), NodeKind::Text(text));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    log::warn!(
                        "Markup tokenizer stopped at byte {}: {} (keeping partial tree)",
                        reader.buffer_position(),
                        e
                    );
                    break;
                }
                _ => {}
            }
        }

        doc
    }

    /// The document root.
    pub fn root(&self) -> Element<'_> {
        Element { doc: self, id: 0 }
    }

    /// First element in document order matching `pred`.
    pub fn find(&self, pred: impl Fn(&Element<'_>) -> bool) -> Option<Element<'_>> {
        self.root().find(pred)
    }

    /// All elements in document order matching `pred`.
    pub fn find_all(&self, pred: impl Fn(&Element<'_>) -> bool) -> Vec<Element<'_>> {
        self.root().find_all(pred)
    }

    fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    fn element_name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// A borrowed view of one element (or the root).
#[derive(Clone, Copy)]
pub struct Element<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> Element<'a> {
    /// Lower-cased local tag name; empty for the root.
    pub fn name(&self) -> &'a str {
        self.doc.element_name(self.id).unwrap_or("")
    }

    /// Attribute value by (lower-cased) name.
    pub fn attr(&self, key: &str) -> Option<&'a str> {
        match &self.doc.nodes[self.id].kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    /// Whether the `class` attribute lists `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Whether this is one of `tags` carrying `class`.
    pub fn is(&self, tags: &[&str], class: &str) -> bool {
        tags.contains(&self.name()) && self.has_class(class)
    }

    /// Direct child elements.
    pub fn children(&self) -> Vec<Element<'a>> {
        self.doc.nodes[self.id]
            .children
            .iter()
            .filter(|&&id| self.doc.element_name(id).is_some())
            .map(|&id| Element { doc: self.doc, id })
            .collect()
    }

    /// First descendant element in document order matching `pred`.
    pub fn find(&self, pred: impl Fn(&Element<'a>) -> bool) -> Option<Element<'a>> {
        let mut found = None;
        self.walk(&mut |el| {
            if found.is_none() && pred(&el) {
                found = Some(el);
            }
            found.is_none()
        });
        found
    }

    /// All descendant elements in document order matching `pred`.
    pub fn find_all(&self, pred: impl Fn(&Element<'a>) -> bool) -> Vec<Element<'a>> {
        let mut found = Vec::new();
        self.walk(&mut |el| {
            if pred(&el) {
                found.push(el);
            }
            true
        });
        found
    }

    /// Text of this element and every descendant, whitespace collapsed.
    pub fn text(&self) -> String {
        self.collect_text(&[])
    }

    /// Text of this element, skipping the subtrees of the `skip` tags.
    pub fn text_excluding(&self, skip: &[&str]) -> String {
        self.collect_text(skip)
    }

    fn collect_text(&self, skip: &[&str]) -> String {
        let mut parts = Vec::new();
        self.push_text(skip, &mut parts);
        collapse(&parts.join(" "))
    }

    fn push_text(&self, skip: &[&str], parts: &mut Vec<&'a str>) {
        // Explicit stack: generated markup can nest arbitrarily deep
        let mut pending: Vec<NodeId> =
            self.doc.nodes[self.id].children.iter().rev().copied().collect();
        while let Some(id) = pending.pop() {
            match &self.doc.nodes[id].kind {
                NodeKind::Text(t) => parts.push(t),
                NodeKind::Element { name, .. } => {
                    if skip.contains(&name.as_str())
                        || RAW_TEXT_ELEMENTS.contains(&name.as_str())
                    {
                        continue;
                    }
                    pending.extend(self.doc.nodes[id].children.iter().rev());
                }
                NodeKind::Root => {}
            }
        }
    }

    /// Pre-order walk over descendant elements; stops when `visit` returns false.
    fn walk(&self, visit: &mut dyn FnMut(Element<'a>) -> bool) {
        let mut pending: Vec<NodeId> =
            self.doc.nodes[self.id].children.iter().rev().copied().collect();
        while let Some(id) = pending.pop() {
            if self.doc.element_name(id).is_none() {
                continue;
            }
            if !visit(Element { doc: self.doc, id }) {
                return;
            }
            pending.extend(self.doc.nodes[id].children.iter().rev());
        }
    }
}

impl std::fmt::Debug for Element<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("name", &self.name())
            .field("class", &self.attr("class"))
            .finish()
    }
}

fn current(stack: &[NodeId]) -> NodeId {
    stack.last().copied().unwrap_or(0)
}

fn element_parts(e: &BytesStart<'_>) -> (String, Vec<(String, String)>) {
    let name = String::from_utf8_lossy(local_name(e.name().as_ref())).to_lowercase();
    let attrs = e
        .html_attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_lowercase();
            let raw = String::from_utf8_lossy(&attr.value);
            (key, decode_text(&raw))
        })
        .collect();
    (name, attrs)
}

/// Resolve XML and common HTML entities, keeping the raw text when an entity
/// is unknown or malformed (a bare `&` in "R&D", say).
fn decode_text(raw: &str) -> String {
    match unescape_with(raw, html_entity) {
        Ok(Cow::Borrowed(s)) => s.to_string(),
        Ok(Cow::Owned(s)) => s,
        Err(_) => raw.to_string(),
    }
}

fn html_entity(name: &str) -> Option<&'static str> {
    let value = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "bull" => "•",
        "middot" => "·",
        "mdash" => "—",
        "ndash" => "–",
        "hellip" => "…",
        "laquo" => "«",
        "raquo" => "»",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "euro" => "€",
        "copy" => "©",
        "reg" => "®",
        "trade" => "™",
        "eacute" => "é",
        "egrave" => "è",
        "ecirc" => "ê",
        "agrave" => "à",
        "ccedil" => "ç",
        "rarr" => "→",
        _ => return None,
    };
    Some(value)
}

/// Extract the local name from a potentially namespaced element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

fn collapse(text: &str) -> String {
    text.split(|c: char| c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
