//! Template scanner.
//!
//! Concatenates a template's static string segments into parseable
//! markup, inserting a marker at each binding site, and records what kind
//! of binding each site is. Child bindings become marker comments;
//! bound attributes are stripped from the markup (their name, sigil and
//! static value fragments travel in the scanned binding instead) and the
//! owning element is flagged with a sentinel attribute carrying its
//! binding count.
//!
//! The scanner is a character-level mode machine because binding
//! boundaries can fall anywhere: mid-attribute-value, between tags,
//! inside raw text. Each boundary is classified by the mode the machine
//! is in when the segment ends.

use crate::error::TemplateError;

/// Reserved marker token. Static template text may not contain it.
pub(crate) const MARKER: &str = "lit$rs$";

/// Sentinel attribute flagging an element with bindings; its value is the
/// number of scanned bindings the element owns.
pub(crate) const BINDINGS_ATTR: &str = "lit$rs$b";

/// Attribute-position binding kinds, selected by a one-character sigil
/// prefix on the attribute name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttributeKind {
    /// No sigil: serialized string attribute.
    Attribute,
    /// `.name`: direct property assignment.
    Property,
    /// `?name`: presence toggled by truthiness.
    Boolean,
    /// `@name`: event listener registration.
    Event,
}

impl AttributeKind {
    fn from_sigil(name: &str) -> (AttributeKind, &str) {
        match name.as_bytes().first() {
            Some(b'.') => (AttributeKind::Property, &name[1..]),
            Some(b'?') => (AttributeKind::Boolean, &name[1..]),
            Some(b'@') => (AttributeKind::Event, &name[1..]),
            _ => (AttributeKind::Attribute, name),
        }
    }
}

/// One binding site, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ScannedBinding {
    /// Child-content position; a marker comment was inserted.
    Child,
    /// Attribute-value position. `statics` holds the literal fragments
    /// around the bindings: `statics.len()` is the value count plus one.
    Attribute {
        name: String,
        kind: AttributeKind,
        statics: Vec<String>,
    },
    /// Valueless binding in an attribute-list position: a directive
    /// applied to the element itself.
    Element,
}

impl ScannedBinding {
    /// Number of interpolated values this binding consumes.
    pub(crate) fn value_count(&self) -> usize {
        match self {
            ScannedBinding::Child | ScannedBinding::Element => 1,
            ScannedBinding::Attribute { statics, .. } => statics.len() - 1,
        }
    }
}

#[derive(Debug)]
pub(crate) struct ScannedTemplate {
    pub(crate) markup: String,
    pub(crate) bindings: Vec<ScannedBinding>,
}

const RAW_TEXT_TAGS: &[&str] = &["script", "style", "textarea", "title"];

#[derive(Debug)]
struct AttrName {
    name: String,
    /// Byte offset in the output where `name` begins; used to excise the
    /// whole attribute when it turns out to be bound.
    start_in_out: usize,
}

#[derive(Debug)]
struct TagScan {
    closing: bool,
    name: String,
    name_done: bool,
    saw_slash: bool,
    bindings: usize,
    attr: Option<AttrName>,
    /// Completed-but-valueless attribute, kept in case `=` follows after
    /// whitespace.
    pending_attr: Option<AttrName>,
}

impl TagScan {
    fn open(first: char) -> Self {
        TagScan {
            closing: false,
            name: first.to_string(),
            name_done: false,
            saw_slash: false,
            bindings: 0,
            attr: None,
            pending_attr: None,
        }
    }

    fn close() -> Self {
        TagScan {
            closing: true,
            name: String::new(),
            name_done: false,
            saw_slash: false,
            bindings: 0,
            attr: None,
            pending_attr: None,
        }
    }
}

#[derive(Debug)]
struct AttrValueScan {
    tag: TagScan,
    name: AttrName,
    quote: Option<char>,
    pending_quote: bool,
    statics: Vec<String>,
    accum: String,
    bound: bool,
}

#[derive(Debug)]
enum Mode {
    Text,
    /// Just consumed `<`; deciding what it opens.
    TagOpen { buf: &'static str },
    Comment { dash_run: u8 },
    /// `<!...>` / `<?...>` declarations, skipped to `>`.
    Bogus,
    Tag(TagScan),
    AttrValue(AttrValueScan),
    RawText { tag: String, close_progress: usize },
}

struct Scanner {
    out: String,
    bindings: Vec<ScannedBinding>,
    mode: Mode,
    seen_tag: bool,
}

/// Scan a template's static segments into marked-up markup plus the
/// ordered binding list.
pub(crate) fn scan(strings: &[&str]) -> Result<ScannedTemplate, TemplateError> {
    let mut scanner = Scanner {
        out: String::new(),
        bindings: Vec::new(),
        mode: Mode::Text,
        seen_tag: false,
    };

    let last = strings.len() - 1;
    for (i, segment) in strings.iter().enumerate() {
        if segment.contains(MARKER) {
            return Err(TemplateError::MarkerInStatics);
        }
        for c in segment.chars() {
            scanner.step(c)?;
        }
        if i < last {
            scanner.boundary()?;
        }
    }

    // A template that ends inside a bound attribute value never reaches
    // the closing quote that would finalize its binding.
    if let Mode::AttrValue(av) = &scanner.mode {
        if av.bound {
            return Err(TemplateError::Markup(lit_dom::DomError::UnexpectedEof {
                context: "attribute value",
            }));
        }
    }

    debug_assert_eq!(
        scanner
            .bindings
            .iter()
            .map(|binding| binding.value_count())
            .sum::<usize>(),
        strings.len() - 1,
        "every boundary must be accounted for by exactly one binding slot"
    );

    Ok(ScannedTemplate {
        markup: scanner.out,
        bindings: scanner.bindings,
    })
}

impl Scanner {
    fn step(&mut self, c: char) -> Result<(), TemplateError> {
        match std::mem::replace(&mut self.mode, Mode::Text) {
            Mode::Text => self.step_text(c),
            Mode::TagOpen { buf } => self.step_tag_open(buf, c),
            Mode::Comment { dash_run } => {
                self.out.push(c);
                self.mode = match c {
                    '-' => Mode::Comment {
                        dash_run: dash_run.saturating_add(1),
                    },
                    '>' if dash_run >= 2 => Mode::Text,
                    _ => Mode::Comment { dash_run: 0 },
                };
                Ok(())
            }
            Mode::Bogus => {
                self.out.push(c);
                self.mode = if c == '>' { Mode::Text } else { Mode::Bogus };
                Ok(())
            }
            Mode::Tag(tag) => self.step_tag(tag, c),
            Mode::AttrValue(av) => self.step_attr_value(av, c),
            Mode::RawText {
                tag,
                close_progress,
            } => self.step_raw_text(tag, close_progress, c),
        }
    }

    fn step_text(&mut self, c: char) -> Result<(), TemplateError> {
        if c == '<' {
            self.mode = Mode::TagOpen { buf: "" };
        } else {
            self.out.push(c);
            self.mode = Mode::Text;
        }
        Ok(())
    }

    fn step_tag_open(&mut self, buf: &'static str, c: char) -> Result<(), TemplateError> {
        match (buf, c) {
            ("", '!') => self.mode = Mode::TagOpen { buf: "!" },
            ("!", '-') => self.mode = Mode::TagOpen { buf: "!-" },
            ("!-", '-') => {
                self.out.push_str("<!--");
                self.mode = Mode::Comment { dash_run: 0 };
            }
            ("", '/') => {
                self.out.push_str("</");
                self.mode = Mode::Tag(TagScan::close());
            }
            ("", '?') => {
                self.out.push_str("<?");
                self.mode = Mode::Bogus;
            }
            ("", c) if c.is_ascii_alphabetic() => {
                self.out.push('<');
                self.out.push(c);
                self.seen_tag = true;
                self.mode = Mode::Tag(TagScan::open(c));
            }
            ("!" | "!-", c) => {
                self.out.push('<');
                self.out.push_str(buf);
                self.out.push(c);
                self.mode = if c == '>' { Mode::Text } else { Mode::Bogus };
            }
            ("", c) => {
                // A lone '<' that opens nothing: literal text.
                self.out.push('<');
                return self.step_text(c);
            }
            _ => unreachable!("tag-open buffer is only ever \"\", \"!\" or \"!-\""),
        }
        Ok(())
    }

    fn step_tag(&mut self, mut tag: TagScan, c: char) -> Result<(), TemplateError> {
        if !tag.name_done {
            match c {
                c if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':' => {
                    tag.name.push(c);
                    self.out.push(c);
                    self.mode = Mode::Tag(tag);
                }
                c if c.is_ascii_whitespace() => {
                    tag.name_done = true;
                    self.out.push(c);
                    self.mode = Mode::Tag(tag);
                }
                '/' => {
                    tag.name_done = true;
                    tag.saw_slash = true;
                    self.out.push(c);
                    self.mode = Mode::Tag(tag);
                }
                '>' => self.finish_tag(tag),
                c => {
                    self.out.push(c);
                    self.mode = Mode::Tag(tag);
                }
            }
            return Ok(());
        }

        match tag.attr.take() {
            None => match c {
                c if c.is_ascii_whitespace() => {
                    self.out.push(c);
                    self.mode = Mode::Tag(tag);
                }
                '>' => self.finish_tag(tag),
                '/' => {
                    tag.saw_slash = true;
                    tag.pending_attr = None;
                    self.out.push(c);
                    self.mode = Mode::Tag(tag);
                }
                '=' if tag.pending_attr.is_some() => {
                    // `name = value` with whitespace around the equals.
                    let name = tag.pending_attr.take().expect("checked above");
                    self.out.push(c);
                    self.mode = Mode::AttrValue(AttrValueScan {
                        tag,
                        name,
                        quote: None,
                        pending_quote: true,
                        statics: Vec::new(),
                        accum: String::new(),
                        bound: false,
                    });
                }
                c => {
                    tag.pending_attr = None;
                    let start_in_out = self.out.len();
                    self.out.push(c);
                    tag.attr = Some(AttrName {
                        name: c.to_string(),
                        start_in_out,
                    });
                    self.mode = Mode::Tag(tag);
                }
            },
            Some(mut attr) => match c {
                c if c.is_ascii_whitespace() => {
                    tag.pending_attr = Some(attr);
                    self.out.push(c);
                    self.mode = Mode::Tag(tag);
                }
                '=' => {
                    self.out.push(c);
                    self.mode = Mode::AttrValue(AttrValueScan {
                        tag,
                        name: attr,
                        quote: None,
                        pending_quote: true,
                        statics: Vec::new(),
                        accum: String::new(),
                        bound: false,
                    });
                }
                '>' => self.finish_tag(tag),
                '/' => {
                    tag.saw_slash = true;
                    self.out.push(c);
                    self.mode = Mode::Tag(tag);
                }
                c => {
                    attr.name.push(c);
                    self.out.push(c);
                    tag.attr = Some(attr);
                    self.mode = Mode::Tag(tag);
                }
            },
        }
        Ok(())
    }

    fn step_attr_value(&mut self, mut av: AttrValueScan, c: char) -> Result<(), TemplateError> {
        if av.pending_quote {
            match c {
                '"' | '\'' => {
                    av.quote = Some(c);
                    av.pending_quote = false;
                    self.out.push(c);
                    self.mode = Mode::AttrValue(av);
                }
                c if c.is_ascii_whitespace() => {
                    self.out.push(c);
                    self.mode = Mode::AttrValue(av);
                }
                '>' => {
                    let tag = self.finalize_attr(av)?;
                    self.finish_tag(tag);
                }
                c => {
                    av.pending_quote = false;
                    av.accum.push(c);
                    self.out.push(c);
                    self.mode = Mode::AttrValue(av);
                }
            }
            return Ok(());
        }

        match av.quote {
            Some(q) => {
                if c == q {
                    let bound = av.bound;
                    let tag = self.finalize_attr(av)?;
                    if !bound {
                        self.out.push(c);
                    }
                    self.mode = Mode::Tag(tag);
                } else {
                    av.accum.push(c);
                    self.out.push(c);
                    self.mode = Mode::AttrValue(av);
                }
            }
            None => match c {
                c if c.is_ascii_whitespace() => {
                    let tag = self.finalize_attr(av)?;
                    self.out.push(c);
                    self.mode = Mode::Tag(tag);
                }
                '>' => {
                    let tag = self.finalize_attr(av)?;
                    self.finish_tag(tag);
                }
                '/' => {
                    let mut tag = self.finalize_attr(av)?;
                    tag.saw_slash = true;
                    self.out.push(c);
                    self.mode = Mode::Tag(tag);
                }
                c => {
                    av.accum.push(c);
                    self.out.push(c);
                    self.mode = Mode::AttrValue(av);
                }
            },
        }
        Ok(())
    }

    /// Close out an attribute value. Bound attributes are excised from the
    /// markup and recorded as scanned bindings; static ones stay verbatim.
    fn finalize_attr(&mut self, av: AttrValueScan) -> Result<TagScan, TemplateError> {
        let AttrValueScan {
            mut tag,
            name,
            mut statics,
            mut accum,
            bound,
            ..
        } = av;

        if !bound {
            return Ok(tag);
        }

        statics.push(std::mem::take(&mut accum));
        self.out.truncate(name.start_in_out);

        let (kind, stripped) = AttributeKind::from_sigil(&name.name);
        if stripped.is_empty() {
            return Err(TemplateError::AttributeNameBinding);
        }
        if matches!(kind, AttributeKind::Boolean | AttributeKind::Event)
            && (statics.len() != 2 || !statics[0].is_empty() || !statics[1].is_empty())
        {
            return Err(TemplateError::UnsupportedBindingPosition);
        }

        self.bindings.push(ScannedBinding::Attribute {
            name: stripped.to_string(),
            kind,
            statics,
        });
        tag.bindings += 1;
        Ok(tag)
    }

    /// Emit `>` (plus the binding-count sentinel when needed) and pick the
    /// follow-on mode.
    fn finish_tag(&mut self, tag: TagScan) {
        if tag.bindings > 0 {
            let sentinel = format!(" {}=\"{}\"", BINDINGS_ATTR, tag.bindings);
            if tag.saw_slash {
                let pos = self.out.rfind('/').expect("slash was copied to output");
                self.out.insert_str(pos, &sentinel);
            } else {
                self.out.push_str(&sentinel);
            }
        }
        self.out.push('>');

        let lowered = tag.name.to_ascii_lowercase();
        self.mode = if !tag.closing && !tag.saw_slash && RAW_TEXT_TAGS.contains(&lowered.as_str())
        {
            Mode::RawText {
                tag: lowered,
                close_progress: 0,
            }
        } else {
            Mode::Text
        };
    }

    fn step_raw_text(
        &mut self,
        tag: String,
        close_progress: usize,
        c: char,
    ) -> Result<(), TemplateError> {
        self.out.push(c);
        let pattern: Vec<char> = "</".chars().chain(tag.chars()).collect();
        let expected = pattern[close_progress];
        let progress = if c.eq_ignore_ascii_case(&expected) {
            close_progress + 1
        } else if c == '<' {
            1
        } else {
            0
        };

        if progress == pattern.len() {
            // The `</tag` is consumed; the remainder (`>` or whitespace)
            // closes like any end tag.
            self.mode = Mode::Tag(TagScan {
                closing: true,
                name: tag,
                name_done: true,
                saw_slash: false,
                bindings: 0,
                attr: None,
                pending_attr: None,
            });
        } else {
            self.mode = Mode::RawText {
                tag,
                close_progress: progress,
            };
        }
        Ok(())
    }

    /// A binding boundary: the current segment ended and a value goes
    /// here. Classify by mode.
    fn boundary(&mut self) -> Result<(), TemplateError> {
        match std::mem::replace(&mut self.mode, Mode::Text) {
            Mode::Text => {
                if !self.seen_tag {
                    return Err(TemplateError::BindingBeforeFirstTag);
                }
                self.out.push_str("<!--");
                self.out.push_str(MARKER);
                self.out.push_str("-->");
                self.bindings.push(ScannedBinding::Child);
                self.mode = Mode::Text;
                Ok(())
            }
            Mode::Comment { .. } => Err(TemplateError::CommentBinding),
            Mode::Bogus => Err(TemplateError::UnsupportedBindingPosition),
            Mode::RawText { tag, .. } => Err(TemplateError::RawTextBinding { tag }),
            Mode::TagOpen { buf } => {
                if buf.is_empty() {
                    Err(TemplateError::TagNameBinding)
                } else {
                    Err(TemplateError::UnsupportedBindingPosition)
                }
            }
            Mode::Tag(mut tag) => {
                if !tag.name_done {
                    return Err(TemplateError::TagNameBinding);
                }
                if tag.closing {
                    return Err(TemplateError::UnsupportedBindingPosition);
                }
                if tag.attr.is_some() {
                    return Err(TemplateError::AttributeNameBinding);
                }
                tag.pending_attr = None;
                tag.bindings += 1;
                self.bindings.push(ScannedBinding::Element);
                self.mode = Mode::Tag(tag);
                Ok(())
            }
            Mode::AttrValue(mut av) => {
                if av.pending_quote {
                    av.pending_quote = false;
                }
                av.statics.push(std::mem::take(&mut av.accum));
                av.bound = true;
                self.mode = Mode::AttrValue(av);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_ok(strings: &[&str]) -> ScannedTemplate {
        scan(strings).expect("scan")
    }

    /// Excising bound attributes can leave extra interior whitespace;
    /// collapse it for comparisons.
    fn normalized(markup: &str) -> String {
        markup.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn child_binding_inserts_marker_comment() {
        let t = scan_ok(&["<p>", "</p>"]);
        assert_eq!(t.markup, format!("<p><!--{}--></p>", MARKER));
        assert_eq!(t.bindings, vec![ScannedBinding::Child]);
    }

    #[test]
    fn bound_attribute_is_excised_and_flagged() {
        let t = scan_ok(&["<div class=\"a ", " b\"></div>"]);
        assert_eq!(
            normalized(&t.markup),
            format!("<div {}=\"1\"></div>", BINDINGS_ATTR)
        );
        assert_eq!(
            t.bindings,
            vec![ScannedBinding::Attribute {
                name: "class".into(),
                kind: AttributeKind::Attribute,
                statics: vec!["a ".into(), " b".into()],
            }]
        );
    }

    #[test]
    fn coalesces_multiple_bindings_in_one_attribute() {
        let t = scan_ok(&["<div class=\"a ", " b ", "\"></div>"]);
        assert_eq!(t.bindings.len(), 1);
        assert_eq!(t.bindings[0].value_count(), 2);
    }

    #[test]
    fn sigils_select_binding_kinds() {
        let t = scan_ok(&["<input .value=", " ?disabled=", " @input=", ">"]);
        let kinds: Vec<_> = t
            .bindings
            .iter()
            .map(|b| match b {
                ScannedBinding::Attribute { kind, .. } => *kind,
                _ => panic!("expected attribute bindings"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                AttributeKind::Property,
                AttributeKind::Boolean,
                AttributeKind::Event
            ]
        );
        assert_eq!(
            normalized(&t.markup),
            format!("<input {}=\"3\">", BINDINGS_ATTR)
        );
    }

    #[test]
    fn element_binding_in_attribute_list() {
        let t = scan_ok(&["<div ", "></div>"]);
        assert_eq!(t.bindings, vec![ScannedBinding::Element]);
        assert_eq!(
            normalized(&t.markup),
            format!("<div {}=\"1\"></div>", BINDINGS_ATTR)
        );
    }

    #[test]
    fn static_attributes_pass_through() {
        let t = scan_ok(&["<div id=\"x\" class=\"", "\"></div>"]);
        assert_eq!(
            normalized(&t.markup),
            format!("<div id=\"x\" {}=\"1\"></div>", BINDINGS_ATTR)
        );
    }

    #[test]
    fn rejects_tag_name_bindings() {
        assert!(matches!(
            scan(&["<", "></div>"]),
            Err(TemplateError::TagNameBinding)
        ));
        assert!(matches!(
            scan(&["<my-", ">"]),
            Err(TemplateError::TagNameBinding)
        ));
    }

    #[test]
    fn rejects_bindings_in_comments_and_raw_text() {
        assert!(matches!(
            scan(&["<div><!-- ", " --></div>"]),
            Err(TemplateError::CommentBinding)
        ));
        assert!(matches!(
            scan(&["<script>", "</script>"]),
            Err(TemplateError::RawTextBinding { .. })
        ));
        assert!(matches!(
            scan(&["<style>a { color: ", " }</style>"]),
            Err(TemplateError::RawTextBinding { .. })
        ));
    }

    #[test]
    fn rejects_binding_before_first_tag() {
        assert!(matches!(
            scan(&["", "<p></p>"]),
            Err(TemplateError::BindingBeforeFirstTag)
        ));
    }

    #[test]
    fn rejects_attribute_name_bindings() {
        assert!(matches!(
            scan(&["<div data-", "=\"x\"></div>"]),
            Err(TemplateError::AttributeNameBinding)
        ));
    }

    #[test]
    fn rejects_marker_in_static_text() {
        let s = format!("<p>{}</p>", MARKER);
        let strings: Vec<&str> = vec![Box::leak(s.into_boxed_str())];
        assert!(matches!(
            scan(&strings),
            Err(TemplateError::MarkerInStatics)
        ));
    }

    #[test]
    fn raw_text_close_tag_returns_to_markup() {
        let t = scan_ok(&["<style>p{}</style><p>", "</p>"]);
        assert!(t.markup.contains("<style>p{}</style>"));
        assert_eq!(t.bindings, vec![ScannedBinding::Child]);
    }

    #[test]
    fn self_closing_bound_tag_keeps_sentinel_inside() {
        let t = scan_ok(&["<input value=", "/>"]);
        assert_eq!(
            normalized(&t.markup),
            format!("<input {}=\"1\"/>", BINDINGS_ATTR)
        );
    }

    #[test]
    fn unquoted_bound_value_followed_by_space() {
        let t = scan_ok(&["<div a=", " b=\"2\"></div>"]);
        assert_eq!(
            t.markup,
            format!("<div  b=\"2\" {}=\"1\"></div>", BINDINGS_ATTR)
        );
        assert_eq!(t.bindings.len(), 1);
    }
}
