//! Template results and the `html!`/`svg!` tag macros.

use std::fmt;

use crate::value::Value;

/// Namespace a template's markup is parsed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    Html,
    Svg,
}

/// Cache key derived from a template's static strings.
///
/// Identity is the address and length of the `'static` string slice, not
/// its textual content. The `html!`/`svg!` macros hoist each call site's
/// segments into a `static`, so a given call site always presents the
/// same identity. Constructing results from ad-hoc slices defeats the
/// template cache; that is a documented precondition, not a checked one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateIdentity {
    addr: usize,
    len: usize,
    kind: TemplateKind,
}

/// The immutable product of a template tag invocation: static strings,
/// interpolated values, and a namespace tag. Created fresh per render.
#[derive(Clone)]
pub struct TemplateResult {
    kind: TemplateKind,
    strings: &'static [&'static str],
    values: Vec<Value>,
}

impl TemplateResult {
    /// Build a result from pre-split segments. `strings` must have exactly
    /// one more element than `values`; the macros guarantee this shape.
    pub fn new(kind: TemplateKind, strings: &'static [&'static str], values: Vec<Value>) -> Self {
        debug_assert_eq!(strings.len(), values.len() + 1);
        TemplateResult {
            kind,
            strings,
            values,
        }
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    pub fn strings(&self) -> &'static [&'static str] {
        self.strings
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub(crate) fn take_values(self) -> Vec<Value> {
        self.values
    }

    /// The cache identity of this result's static strings.
    pub fn identity(&self) -> TemplateIdentity {
        TemplateIdentity {
            addr: self.strings.as_ptr() as usize,
            len: self.strings.len(),
            kind: self.kind,
        }
    }
}

impl fmt::Debug for TemplateResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateResult")
            .field("kind", &self.kind)
            .field("strings", &self.strings)
            .field("values", &self.values.len())
            .finish()
    }
}

/// Produce an HTML [`TemplateResult`].
///
/// Segments are string literals; bindings are brace-wrapped expressions
/// between them, one static segment on either side of every binding:
///
/// ```
/// use lit_html::html;
/// let name = "world";
/// let result = html!("<p>Hello, " {name} "!</p>");
/// ```
///
/// Adjacent bindings need an explicit empty segment between them:
/// `html!("<p>" {a} "" {b} "</p>")`.
#[macro_export]
macro_rules! html {
    ($first:literal $( { $value:expr } $next:literal )*) => {{
        static STRINGS: &[&str] = &[$first $(, $next)*];
        $crate::TemplateResult::new(
            $crate::TemplateKind::Html,
            STRINGS,
            ::std::vec![$($crate::Value::from($value)),*],
        )
    }};
}

/// Produce an SVG-namespace [`TemplateResult`]; otherwise identical to
/// [`html!`].
#[macro_export]
macro_rules! svg {
    ($first:literal $( { $value:expr } $next:literal )*) => {{
        static STRINGS: &[&str] = &[$first $(, $next)*];
        $crate::TemplateResult::new(
            $crate::TemplateKind::Svg,
            STRINGS,
            ::std::vec![$($crate::Value::from($value)),*],
        )
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn same_call_site_yields_same_identity() {
        let mk = |v: i64| html!("<p>" {v} "</p>");
        let a = mk(1);
        let b = mk(2);
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn html_and_svg_kinds_differ() {
        // Even with identical text, the namespace tag splits the identity.
        let h = html!("<a></a>");
        let s = svg!("<a></a>");
        assert_ne!(h.identity().kind, s.identity().kind);
    }

    #[test]
    fn values_keep_binding_order() {
        let r = html!("<p a=\"" {1} "\">" {"x"} "</p>");
        assert_eq!(r.strings().len(), 3);
        assert_eq!(r.values().len(), 2);
    }
}
