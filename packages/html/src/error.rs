//! Template engine error types.
//!
//! Scanner errors are fatal and surface at first render of the offending
//! template; there is no partial or degraded parse. Invariant violations
//! are kept distinct from user errors: hitting one means the scanner and
//! the instance walker disagreed, not that the caller misused the API.

use lit_dom::DomError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum TemplateError {
    /// A binding appeared where it would change a tag name.
    #[error("bindings cannot be used in tag-name position")]
    TagNameBinding,

    /// A binding appeared before any tag was opened.
    #[error("bindings cannot appear before the first tag of a template")]
    BindingBeforeFirstTag,

    /// A binding appeared inside a comment.
    #[error("bindings are not supported inside comments")]
    CommentBinding,

    /// A binding appeared inside a raw-text element, where markers would
    /// be swallowed as plain text.
    #[error("bindings are not supported inside <{tag}> elements")]
    RawTextBinding { tag: String },

    /// A binding was attached to an attribute name rather than its value.
    #[error("bindings cannot form part of an attribute name")]
    AttributeNameBinding,

    /// A binding appeared inside an end tag or other unusable markup.
    #[error("binding in an unsupported markup position")]
    UnsupportedBindingPosition,

    /// Static template text contained the reserved marker token.
    #[error("static template text may not contain the binding marker")]
    MarkerInStatics,

    /// The marked-up template failed to parse as a fragment.
    #[error("malformed template markup: {0}")]
    Markup(#[from] DomError),

    /// A value kind that the target part cannot commit.
    #[error("a {value} value cannot be committed to a {part} binding")]
    IncompatibleValue {
        part: &'static str,
        value: &'static str,
    },

    /// A part operation that only child bindings support.
    #[error("operation requires a child binding")]
    ChildBindingRequired,

    /// An item operation against a position that is not in list mode, or
    /// with an out-of-range index.
    #[error("item operation out of range or not in list mode")]
    InvalidItemOperation,

    /// A directive invoked with arguments it cannot interpret.
    #[error("directive `{name}` received malformed arguments")]
    DirectiveArguments { name: &'static str },

    /// A directive bound to a part kind it does not declare support for.
    #[error("directive `{name}` cannot bind to {part} positions")]
    IncompatibleDirective {
        name: &'static str,
        part: &'static str,
    },

    /// Internal consistency check: descriptor count vs. supplied values.
    #[error(
        "internal invariant violated: template consumes {expected} values, received {got}"
    )]
    BindingCountMismatch { expected: usize, got: usize },

    /// Internal consistency check: the prepared DOM and the scanned
    /// binding list fell out of step.
    #[error("internal invariant violated: {0}")]
    PreparedTemplateMismatch(&'static str),
}
