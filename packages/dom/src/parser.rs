//! HTML fragment parser.
//!
//! Parses the markup subset the template engine produces and the
//! unsafe-HTML directive accepts: elements with quoted/unquoted/valueless
//! attributes, self-closing tags, comments, raw-text elements, character
//! entities, and SVG namespace switching. Recovery is lenient the way
//! fragment parsing is expected to be: stray end tags are dropped and
//! unclosed elements are closed at end of input.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::node::Namespace;
use crate::{Document, DomError, NodeId};

/// Elements with no content and no end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is raw character data, never markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Raw-text elements whose content still decodes entities.
const ESCAPABLE_RAW_TEXT_ELEMENTS: &[&str] = &["textarea", "title"];

pub(crate) fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

pub(crate) fn is_raw_text_element(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&name) || ESCAPABLE_RAW_TEXT_ELEMENTS.contains(&name)
}

pub(crate) fn is_unescaped_raw_text_element(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&name)
}

static ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(?:#[xX]([0-9a-fA-F]+)|#([0-9]+)|([a-zA-Z][a-zA-Z0-9]*));").unwrap());

/// Decode the character entities the serializer and common markup use.
/// Unknown named entities pass through verbatim.
pub(crate) fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    ENTITY_RE
        .replace_all(input, |caps: &regex::Captures<'_>| {
            if let Some(hex) = caps.get(1) {
                return u32::from_str_radix(hex.as_str(), 16)
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_else(|| caps[0].to_string());
            }
            if let Some(dec) = caps.get(2) {
                return dec
                    .as_str()
                    .parse::<u32>()
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_else(|| caps[0].to_string());
            }
            match &caps[3] {
                "amp" => "&".to_string(),
                "lt" => "<".to_string(),
                "gt" => ">".to_string(),
                "quot" => "\"".to_string(),
                "apos" => "'".to_string(),
                "nbsp" => "\u{00A0}".to_string(),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Parse `markup` into a fresh fragment node in `doc` and return its id.
pub fn parse_fragment(
    doc: &mut Document,
    markup: &str,
    namespace: Namespace,
) -> Result<NodeId, DomError> {
    let fragment = doc.create_fragment();
    let mut parser = FragmentParser {
        doc,
        input: markup,
        pos: 0,
        stack: vec![(fragment, namespace)],
    };
    parser.run()?;
    Ok(fragment)
}

struct FragmentParser<'a> {
    doc: &'a mut Document,
    input: &'a str,
    pos: usize,
    /// Open insertion points, innermost last, with their child namespace.
    stack: Vec<(NodeId, Namespace)>,
}

impl<'a> FragmentParser<'a> {
    fn run(&mut self) -> Result<(), DomError> {
        while self.pos < self.input.len() {
            if self.rest().starts_with("<!--") {
                self.parse_comment()?;
            } else if self.rest().starts_with("<!") || self.rest().starts_with("<?") {
                self.skip_bogus_markup()?;
            } else if self.rest().starts_with("</") {
                self.parse_end_tag()?;
            } else if self.starts_tag() {
                self.parse_start_tag()?;
            } else {
                self.parse_text();
            }
        }
        Ok(())
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn starts_tag(&self) -> bool {
        let mut chars = self.rest().chars();
        chars.next() == Some('<') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
    }

    fn insertion_point(&self) -> (NodeId, Namespace) {
        *self.stack.last().expect("fragment root never pops")
    }

    fn parse_text(&mut self) {
        let start = self.pos;
        while self.pos < self.input.len() {
            if self.rest().starts_with('<')
                && (self.starts_tag()
                    || self.rest().starts_with("</")
                    || self.rest().starts_with("<!")
                    || self.rest().starts_with("<?"))
            {
                break;
            }
            self.bump();
        }
        let raw = &self.input[start..self.pos];
        if raw.is_empty() {
            // Lone '<' that opens nothing: consume it as text.
            if self.bump().is_none() {
                return;
            }
            let (parent, _) = self.insertion_point();
            let text = self.doc.create_text("<");
            self.doc.append_child(parent, text);
            return;
        }
        let (parent, _) = self.insertion_point();
        let decoded = decode_entities(raw);
        let text = self.doc.create_text(&decoded);
        self.doc.append_child(parent, text);
    }

    fn parse_comment(&mut self) -> Result<(), DomError> {
        self.pos += 4; // <!--
        let Some(end) = self.rest().find("-->") else {
            return Err(DomError::UnexpectedEof { context: "comment" });
        };
        let content = &self.input[self.pos..self.pos + end];
        self.pos += end + 3;
        let (parent, _) = self.insertion_point();
        let comment = self.doc.create_comment(content);
        self.doc.append_child(parent, comment);
        Ok(())
    }

    fn skip_bogus_markup(&mut self) -> Result<(), DomError> {
        match self.rest().find('>') {
            Some(end) => {
                self.pos += end + 1;
                Ok(())
            }
            None => Err(DomError::UnexpectedEof {
                context: "declaration",
            }),
        }
    }

    fn parse_tag_name(&mut self) -> Result<String, DomError> {
        let start = self.pos;
        if !self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            return Err(DomError::InvalidTagName { offset: start });
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':')
        {
            self.bump();
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.bump();
        }
    }

    fn parse_start_tag(&mut self) -> Result<(), DomError> {
        self.pos += 1; // <
        let raw_name = self.parse_tag_name()?;
        let (parent, parent_ns) = self.insertion_point();

        // HTML tag names are case-insensitive; SVG names keep their case.
        let entering_svg = raw_name.eq_ignore_ascii_case("svg");
        let ns = if entering_svg { Namespace::Svg } else { parent_ns };
        let name = match ns {
            Namespace::Html => raw_name.to_ascii_lowercase(),
            Namespace::Svg => raw_name,
        };

        let element = self.doc.create_element_ns(&name, ns);
        self.doc.append_child(parent, element);

        let self_closed = self.parse_attributes(element)?;

        let child_ns = if ns == Namespace::Svg && name == "foreignObject" {
            Namespace::Html
        } else {
            ns
        };

        let is_void = ns == Namespace::Html && is_void_element(&name);
        if self_closed || is_void {
            return Ok(());
        }

        if ns == Namespace::Html && is_raw_text_element(&name) {
            return self.parse_raw_text(element, &name);
        }

        self.stack.push((element, child_ns));
        Ok(())
    }

    fn parse_attributes(&mut self, element: NodeId) -> Result<bool, DomError> {
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(DomError::UnexpectedEof { context: "tag" }),
                Some('>') => {
                    self.bump();
                    return Ok(false);
                }
                Some('/') => {
                    self.bump();
                    self.skip_whitespace();
                    if self.bump() != Some('>') {
                        return Err(DomError::UnexpectedEof { context: "tag" });
                    }
                    return Ok(true);
                }
                Some(_) => {
                    let (name, value) = self.parse_attribute()?;
                    self.doc.set_attribute(element, &name, &value);
                }
            }
        }
    }

    fn parse_attribute(&mut self) -> Result<(String, String), DomError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| !c.is_ascii_whitespace() && c != '=' && c != '>' && c != '/')
        {
            self.bump();
        }
        let name = self.input[start..self.pos].to_string();
        if name.is_empty() {
            return Err(DomError::InvalidAttributeName { name });
        }

        self.skip_whitespace();
        if self.peek() != Some('=') {
            // Valueless attribute.
            return Ok((name, String::new()));
        }
        self.bump();
        self.skip_whitespace();

        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.bump();
                let vstart = self.pos;
                while self.peek().is_some_and(|c| c != q) {
                    self.bump();
                }
                if self.peek().is_none() {
                    return Err(DomError::UnexpectedEof {
                        context: "attribute value",
                    });
                }
                let raw = &self.input[vstart..self.pos];
                self.bump(); // closing quote
                decode_entities(raw)
            }
            _ => {
                let vstart = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| !c.is_ascii_whitespace() && c != '>')
                {
                    self.bump();
                }
                decode_entities(&self.input[vstart..self.pos])
            }
        };
        Ok((name, value))
    }

    fn parse_raw_text(&mut self, element: NodeId, name: &str) -> Result<(), DomError> {
        let close = format!("</{}", name);
        let rest_lower = self.rest().to_ascii_lowercase();
        let Some(end) = rest_lower.find(&close) else {
            return Err(DomError::UnexpectedEof {
                context: "raw text element",
            });
        };
        let raw = &self.input[self.pos..self.pos + end];
        self.pos += end;

        let content = if ESCAPABLE_RAW_TEXT_ELEMENTS.contains(&name) {
            decode_entities(raw)
        } else {
            raw.to_string()
        };
        if !content.is_empty() {
            let text = self.doc.create_text(&content);
            self.doc.append_child(element, text);
        }

        // Consume the end tag.
        self.pos += close.len();
        match self.rest().find('>') {
            Some(gt) => {
                self.pos += gt + 1;
                Ok(())
            }
            None => Err(DomError::UnexpectedEof { context: "end tag" }),
        }
    }

    fn parse_end_tag(&mut self) -> Result<(), DomError> {
        self.pos += 2; // </
        let raw_name = self.parse_tag_name()?;
        self.skip_whitespace();
        if self.bump() != Some('>') {
            return Err(DomError::UnexpectedEof { context: "end tag" });
        }

        // Pop to the matching open element; ignore a stray end tag.
        let matches = |stack_name: &str| stack_name.eq_ignore_ascii_case(&raw_name);
        let position = self.stack.iter().rposition(|(id, _)| {
            self.doc
                .node(*id)
                .as_element()
                .is_some_and(|e| matches(e.tag_name()))
        });
        if let Some(position) = position {
            self.stack.truncate(position);
        }
        Ok(())
    }
}
